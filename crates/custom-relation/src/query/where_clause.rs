//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use serde_json::Value;

impl<M> QueryBuilder<M> {
    /// Add WHERE condition with equality
    pub fn where_eq<T>(self, column: &str, value: T) -> Self
    where
        T: Into<Value>,
    {
        self.where_condition(column, QueryOperator::Equal, value)
    }

    /// Add WHERE condition with an explicit comparison operator
    pub fn where_condition<T: Into<Value>>(
        mut self,
        column: &str,
        operator: QueryOperator,
        value: T,
    ) -> Self {
        let condition = match operator {
            QueryOperator::In => {
                let values = match value.into() {
                    Value::Array(values) => values,
                    single => vec![single],
                };
                WhereCondition {
                    column: column.to_string(),
                    operator,
                    value: None,
                    values,
                }
            }
            _ => WhereCondition {
                column: column.to_string(),
                operator,
                value: Some(value.into()),
                values: Vec::new(),
            },
        };
        self.where_conditions.push(condition);
        self
    }

    /// Add WHERE condition with IN. An empty set matches no rows.
    pub fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator: QueryOperator::In,
            value: None,
            values: values.into_iter().map(|v| v.into()).collect(),
        });
        self
    }
}
