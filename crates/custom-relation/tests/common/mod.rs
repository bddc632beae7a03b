//! Shared fixtures: an in-memory executor and the users/roles/permissions schema
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use serde_json::Value;

use elif_custom_relation::{
    BelongsToMany, Bridge, BridgedRelation, Collection, CustomRelationLoader, DatabaseRow,
    DatabaseRowExt, DatabaseValue, EagerLoaders, HasCustomRelation, LinkTable, Model,
    ModelError, ModelResult, QueryBuilder, QueryExecutor, QueryOperator, RelationMap,
    WhereCondition, ValueRow,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// In-memory executor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<DatabaseValue>>,
}

/// Evaluates structured queries over in-memory tables: inner joins on column
/// equality, `=`, `!=` and `IN` predicates, projections (`*`, `t.*`, `t.c`,
/// `t.c AS alias`) and limit.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: HashMap<String, Table>,
    executed: Mutex<Vec<String>>,
}

type Binding<'a> = (&'a str, &'a Table, usize);

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Vec<DatabaseValue>>) -> Self {
        self.tables.insert(
            name.to_string(),
            Table {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
        );
        self
    }

    /// SQL of every executed query, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn clear_log(&self) {
        self.executed.lock().unwrap().clear();
    }

    fn table(&self, name: &str) -> ModelResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| ModelError::Query(format!("relation \"{}\" does not exist", name)))
    }

    fn evaluate<'a>(&'a self, query: &'a QueryBuilder) -> ModelResult<Vec<ValueRow>> {
        let from = query
            .from_table()
            .ok_or_else(|| ModelError::Query("query has no FROM table".to_string()))?;
        let base = self.table(from)?;

        let mut combos: Vec<Vec<Binding<'a>>> = (0..base.rows.len())
            .map(|index| vec![(from, base, index)])
            .collect();

        for join in query.joins() {
            let table = self.table(&join.table)?;
            let mut next = Vec::new();
            for combo in &combos {
                for index in 0..table.rows.len() {
                    let mut candidate = combo.clone();
                    candidate.push((join.table.as_str(), table, index));
                    if join_matches(&candidate, &join.on_conditions)? {
                        next.push(candidate);
                    }
                }
            }
            combos = next;
        }

        let mut filtered = Vec::new();
        for combo in combos {
            let mut keep = true;
            for condition in query.where_conditions() {
                if !condition_matches(&combo, condition)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                filtered.push(combo);
            }
        }

        let limit = query.limit_count().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        filtered
            .iter()
            .take(limit)
            .map(|combo| project(combo, query.select_fields()))
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        self.executed.lock().unwrap().push(query.to_sql());
        let rows = self.evaluate(query)?;
        Ok(rows.into_iter().map(ValueRow::into_boxed).collect())
    }
}

fn lookup(bindings: &[Binding<'_>], column: &str) -> ModelResult<DatabaseValue> {
    let (table, name) = match column.split_once('.') {
        Some((table, name)) => (Some(table), name),
        None => (None, column),
    };

    for (table_name, data, row) in bindings {
        if table.map_or(true, |t| t == *table_name) {
            if let Some(index) = data.columns.iter().position(|c| c == name) {
                return Ok(data.rows[*row][index].clone());
            }
        }
    }
    Err(ModelError::ColumnNotFound(column.to_string()))
}

fn same_value(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn join_matches(bindings: &[Binding<'_>], on: &[(String, String)]) -> ModelResult<bool> {
    for (left, right) in on {
        let left = lookup(bindings, left)?.to_json();
        let right = lookup(bindings, right)?.to_json();
        if left.is_null() || right.is_null() || !same_value(&left, &right) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn condition_matches(bindings: &[Binding<'_>], condition: &WhereCondition) -> ModelResult<bool> {
    let actual = lookup(bindings, &condition.column)?.to_json();
    let expected = condition.value.clone().unwrap_or(Value::Null);

    Ok(match condition.operator {
        QueryOperator::Equal if expected.is_null() => actual.is_null(),
        QueryOperator::NotEqual if expected.is_null() => !actual.is_null(),
        QueryOperator::Equal => !actual.is_null() && same_value(&actual, &expected),
        QueryOperator::NotEqual => !actual.is_null() && !same_value(&actual, &expected),
        QueryOperator::In => condition.values.iter().any(|v| same_value(&actual, v)),
        other => {
            return Err(ModelError::Query(format!(
                "operator {} is not supported by MemoryExecutor",
                other
            )))
        }
    })
}

fn project(bindings: &[Binding<'_>], fields: &[String]) -> ModelResult<ValueRow> {
    let mut row = ValueRow::new();
    let all = vec!["*".to_string()];
    let fields = if fields.is_empty() { &all[..] } else { fields };

    for field in fields {
        if field == "*" {
            for (_, data, index) in bindings {
                push_all(&mut row, data, *index);
            }
        } else if let Some(table) = field.strip_suffix(".*") {
            for (table_name, data, index) in bindings {
                if *table_name == table {
                    push_all(&mut row, data, *index);
                }
            }
        } else {
            let (expr, alias) = match field.split_once(" AS ").or_else(|| field.split_once(" as ")) {
                Some((expr, alias)) => (expr.trim(), Some(alias.trim())),
                None => (field.as_str(), None),
            };
            let value = lookup(bindings, expr)?;
            let name = alias.unwrap_or_else(|| expr.rsplit('.').next().unwrap_or(expr));
            row.push(name, value);
        }
    }
    Ok(row)
}

fn push_all(row: &mut ValueRow, data: &Table, index: usize) {
    for (column, name) in data.columns.iter().enumerate() {
        row.push(name.clone(), data.rows[index][column].clone());
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

pub const USER_ROLES: LinkTable = LinkTable::new("role_user", "user_id", "role_id");
pub const ROLE_USERS: LinkTable = LinkTable::new("role_user", "role_id", "user_id");
pub const ROLE_PERMISSIONS: LinkTable = LinkTable::new("permission_role", "role_id", "permission_id");
pub const PERMISSION_ROLES: LinkTable = LinkTable::new("permission_role", "permission_id", "role_id");

#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub relations: RelationMap,
}

impl User {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            relations: RelationMap::new(),
        }
    }

    pub fn unsaved(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            relations: RelationMap::new(),
        }
    }

    pub fn permissions(&self) -> BridgedRelation<'_, UserPermissions> {
        self.relates_to()
    }
}

impl Model for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(serde_json::json!(self.id)),
            "name" => Some(Value::String(self.name.clone())),
            _ => None,
        }
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.get("name")?,
            relations: RelationMap::new(),
        })
    }

    fn relations(&self) -> &RelationMap {
        &self.relations
    }

    fn relations_mut(&mut self) -> &mut RelationMap {
        &mut self.relations
    }

    fn eager_loaders() -> EagerLoaders<Self> {
        EagerLoaders::new()
            .register(
                "permissions",
                CustomRelationLoader::<BridgedRelation<'static, UserPermissions>>::new(),
            )
            .register("roles", BelongsToMany::<User, Role>::new(USER_ROLES))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub relations: RelationMap,
}

impl Model for Role {
    fn table_name() -> &'static str {
        "roles"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "name" => Some(Value::String(self.name.clone())),
            _ => None,
        }
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            relations: RelationMap::new(),
        })
    }

    fn relations(&self) -> &RelationMap {
        &self.relations
    }

    fn relations_mut(&mut self) -> &mut RelationMap {
        &mut self.relations
    }

    fn eager_loaders() -> EagerLoaders<Self> {
        EagerLoaders::new()
            .register("users", BelongsToMany::<Role, User>::new(ROLE_USERS))
            .register("permissions", BelongsToMany::<Role, Permission>::new(ROLE_PERMISSIONS))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub relations: RelationMap,
}

impl Permission {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            relations: RelationMap::new(),
        }
    }
}

impl Model for Permission {
    fn table_name() -> &'static str {
        "permissions"
    }

    fn get_attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id)),
            "name" => Some(Value::String(self.name.clone())),
            _ => None,
        }
    }

    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            relations: RelationMap::new(),
        })
    }

    fn relations(&self) -> &RelationMap {
        &self.relations
    }

    fn relations_mut(&mut self) -> &mut RelationMap {
        &mut self.relations
    }

    fn eager_loaders() -> EagerLoaders<Self> {
        EagerLoaders::new().register("roles", BelongsToMany::<Permission, Role>::new(PERMISSION_ROLES))
    }
}

/// users -> role_user -> roles -> permission_role -> permissions
pub struct UserPermissions;

impl Bridge for UserPermissions {
    type Parent = User;
    type Intermediate = Role;
    type Related = Permission;

    const RELATED_LINK: LinkTable = PERMISSION_ROLES;
    const PARENT_LINK: LinkTable = ROLE_USERS;
    const INTERMEDIATE_RELATION: &'static str = "roles";
    const PARENT_RELATION: &'static str = "users";
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------
//
// alice (1): admin, editor
// bob   (2): no roles
// carol (3): admin, auditor
//
// admin (1):   users.manage, posts.publish
// editor (2):  posts.edit
// auditor (3): posts.publish, reports.view

pub fn seeded() -> MemoryExecutor {
    MemoryExecutor::new()
        .with_table(
            "users",
            &["id", "name"],
            vec![
                vec![1i64.into(), "alice".into()],
                vec![2i64.into(), "bob".into()],
                vec![3i64.into(), "carol".into()],
            ],
        )
        .with_table(
            "roles",
            &["id", "name"],
            vec![
                vec![1i64.into(), "admin".into()],
                vec![2i64.into(), "editor".into()],
                vec![3i64.into(), "auditor".into()],
            ],
        )
        .with_table(
            "permissions",
            &["id", "name"],
            vec![
                vec![1i64.into(), "users.manage".into()],
                vec![2i64.into(), "posts.publish".into()],
                vec![3i64.into(), "posts.edit".into()],
                vec![4i64.into(), "reports.view".into()],
            ],
        )
        .with_table(
            "role_user",
            &["role_id", "user_id"],
            vec![
                vec![1i64.into(), 1i64.into()],
                vec![2i64.into(), 1i64.into()],
                vec![1i64.into(), 3i64.into()],
                vec![3i64.into(), 3i64.into()],
            ],
        )
        .with_table(
            "permission_role",
            &["permission_id", "role_id"],
            vec![
                vec![1i64.into(), 1i64.into()],
                vec![2i64.into(), 1i64.into()],
                vec![3i64.into(), 2i64.into()],
                vec![2i64.into(), 3i64.into()],
                vec![4i64.into(), 3i64.into()],
            ],
        )
}

pub fn alice() -> User {
    User::new(1, "alice")
}

pub fn bob() -> User {
    User::new(2, "bob")
}

pub fn carol() -> User {
    User::new(3, "carol")
}

/// Primary keys of a collection as integers
pub fn ids<M: Model>(models: &Collection<M>) -> Vec<i64> {
    models.keys().iter().filter_map(Value::as_i64).collect()
}

/// Keys of the relation loaded under `name`; `None` when it was never set
pub fn loaded_ids<M: Model, R: Model>(model: &M, name: &str) -> Option<Vec<i64>> {
    model.relation::<R>(name).map(ids::<R>)
}
