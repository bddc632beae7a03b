//! Query Builder SQL generation

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl<M> QueryBuilder<M> {
    /// Generate SQL with `$n` placeholders and the values to bind, in order
    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let mut params = Vec::new();
        let sql = self.build_select_sql(&mut |value: &Value| {
            params.push(DatabaseValue::from_json(value.clone()));
            format!("${}", params.len())
        });
        (sql, params)
    }

    /// Generate SQL with values inlined, for logging and tests
    pub fn to_sql(&self) -> String {
        self.build_select_sql(&mut format_value)
    }

    fn build_select_sql(&self, placeholder: &mut dyn FnMut(&Value) -> String) -> String {
        // SELECT clause
        let mut sql = String::from("SELECT ");

        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }

        // FROM clause
        if let Some(table) = &self.from_table {
            sql.push_str(" FROM ");
            sql.push_str(table);
        }

        // JOIN clauses
        for join in &self.joins {
            sql.push_str(&format!(" INNER JOIN {}", join.table));
            if !join.on_conditions.is_empty() {
                sql.push_str(" ON ");
                let conditions: Vec<String> = join
                    .on_conditions
                    .iter()
                    .map(|(left, right)| format!("{} = {}", left, right))
                    .collect();
                sql.push_str(&conditions.join(" AND "));
            }
        }

        // WHERE clause
        if !self.where_conditions.is_empty() {
            sql.push_str(" WHERE ");
            let conditions: Vec<String> = self
                .where_conditions
                .iter()
                .map(|condition| build_condition(condition, placeholder))
                .collect();
            sql.push_str(&conditions.join(" AND "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }
}

fn build_condition(condition: &WhereCondition, placeholder: &mut dyn FnMut(&Value) -> String) -> String {
    match condition.operator {
        // An empty set can never match
        QueryOperator::In if condition.values.is_empty() => "0 = 1".to_string(),
        QueryOperator::In => {
            let values: Vec<String> = condition.values.iter().map(|v| placeholder(v)).collect();
            format!("{} {} ({})", condition.column, condition.operator, values.join(", "))
        }
        _ => match &condition.value {
            Some(Value::Null) | None => match condition.operator {
                QueryOperator::NotEqual => format!("{} IS NOT NULL", condition.column),
                _ => format!("{} IS NULL", condition.column),
            },
            Some(value) => format!("{} {} {}", condition.column, condition.operator, placeholder(value)),
        },
    }
}

/// Format a value for SQL
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")), // Escape single quotes
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permissions_query() -> QueryBuilder {
        QueryBuilder::new()
            .from("permissions")
            .join("permission_role", "permission_role.permission_id", "permissions.id")
            .join("roles", "roles.id", "permission_role.role_id")
            .join("role_user", "role_user.role_id", "roles.id")
    }

    #[test]
    fn test_select_with_joins_and_params() {
        let query = permissions_query().select("permissions.*").where_eq("role_user.user_id", 7);
        let (sql, params) = query.to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT permissions.* FROM permissions \
             INNER JOIN permission_role ON permission_role.permission_id = permissions.id \
             INNER JOIN roles ON roles.id = permission_role.role_id \
             INNER JOIN role_user ON role_user.role_id = roles.id \
             WHERE role_user.user_id = $1"
        );
        assert_eq!(params, vec![DatabaseValue::Int32(7)]);
    }

    #[test]
    fn test_where_in_numbers_placeholders_in_order() {
        let query = QueryBuilder::<()>::new()
            .from("users")
            .where_eq("users.active", true)
            .where_in("users.id", vec![1, 2, 3]);
        let (sql, params) = query.to_sql_with_params();

        assert_eq!(sql, "SELECT * FROM users WHERE users.active = $1 AND users.id IN ($2, $3, $4)");
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let query = QueryBuilder::<()>::new()
            .from("permissions")
            .where_in("role_user.user_id", Vec::<i64>::new());
        let (sql, params) = query.to_sql_with_params();

        assert_eq!(sql, "SELECT * FROM permissions WHERE 0 = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_null_equality_becomes_is_null() {
        let query = QueryBuilder::<()>::new().from("users").where_eq("users.deleted_at", Value::Null);
        assert_eq!(query.to_sql(), "SELECT * FROM users WHERE users.deleted_at IS NULL");
    }

    #[test]
    fn test_to_sql_inlines_values() {
        let query = QueryBuilder::<()>::new()
            .from("permissions")
            .select("id, name")
            .where_eq("name", "it's")
            .limit(10);
        assert_eq!(query.to_sql(), "SELECT id, name FROM permissions WHERE name = 'it''s' LIMIT 10");
    }

    #[test]
    fn test_string_params_stay_text() {
        let query = QueryBuilder::<()>::new()
            .from("permissions")
            .where_in(
                "role_user.user_id",
                vec!["6f1c2a4e-8b3d-4c5e-9f7a-1b2c3d4e5f60", "2024-01-01T00:00:00Z"],
            )
            .where_eq("permissions.name", "reports.view");
        let (sql, params) = query.to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM permissions WHERE role_user.user_id IN ($1, $2) AND permissions.name = $3"
        );
        assert_eq!(
            params,
            vec![
                DatabaseValue::String("6f1c2a4e-8b3d-4c5e-9f7a-1b2c3d4e5f60".to_string()),
                DatabaseValue::String("2024-01-01T00:00:00Z".to_string()),
                DatabaseValue::String("reports.view".to_string()),
            ]
        );
    }

    #[test]
    fn test_eager_paths_do_not_render() {
        let query = QueryBuilder::<()>::new().from("permissions").with("roles.users");
        assert_eq!(query.to_sql(), "SELECT * FROM permissions");
    }
}
