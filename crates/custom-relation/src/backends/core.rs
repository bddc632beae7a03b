//! Core Backend Types
//!
//! Database values, result rows and the executor seam every query and
//! relation goes through. A `QueryExecutor` receives the structured query
//! rather than a SQL string so backends can render it for their dialect.

use std::collections::HashMap;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;

/// Executes SELECT queries for models and relations
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run the query and return every result row in order
    async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Box<dyn DatabaseRow>>>;
}

/// Abstract database row trait
pub trait DatabaseRow: Send + Sync {
    /// Get a column value by index
    fn get_by_index(&self, index: usize) -> ModelResult<DatabaseValue>;

    /// Get a column value by name
    fn get_by_name(&self, name: &str) -> ModelResult<DatabaseValue>;

    /// Get column names in result order
    fn column_names(&self) -> Vec<String>;

    /// Get column count
    fn column_count(&self) -> usize {
        self.column_names().len()
    }

    /// Convert row to a JSON object
    fn to_json(&self) -> ModelResult<JsonValue> {
        let mut map = serde_json::Map::new();
        for (i, name) in self.column_names().into_iter().enumerate() {
            map.insert(name, self.get_by_index(i)?.to_json());
        }
        Ok(JsonValue::Object(map))
    }
}

/// Typed column access for model hydration
pub trait DatabaseRowExt {
    /// Get a typed value from a column
    fn get<T>(&self, column: &str) -> ModelResult<T>
    where
        T: for<'de> serde::Deserialize<'de>;

    /// Get an optional typed value; NULL and missing columns become `None`
    fn try_get<T>(&self, column: &str) -> ModelResult<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>;
}

impl<R: DatabaseRow + ?Sized> DatabaseRowExt for R {
    fn get<T>(&self, column: &str) -> ModelResult<T>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let value = self.get_by_name(column)?;
        serde_json::from_value(value.to_json()).map_err(|e| {
            ModelError::Serialization(format!("Failed to deserialize column '{}': {}", column, e))
        })
    }

    fn try_get<T>(&self, column: &str) -> ModelResult<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.get_by_name(column) {
            Ok(value) if value.is_null() => Ok(None),
            Ok(value) => serde_json::from_value(value.to_json())
                .map(Some)
                .map_err(|e| {
                    ModelError::Serialization(format!(
                        "Failed to deserialize column '{}': {}",
                        column, e
                    ))
                }),
            Err(ModelError::ColumnNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Owned row of named values, used by in-process executors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    columns: Vec<(String, DatabaseValue)>,
}

impl ValueRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A repeated name shadows the earlier one on lookup,
    /// matching how drivers resolve duplicate names in joined selects.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<DatabaseValue>) {
        self.columns.push((name.into(), value.into()));
    }

    pub fn into_boxed(self) -> Box<dyn DatabaseRow> {
        Box::new(self)
    }
}

impl DatabaseRow for ValueRow {
    fn get_by_index(&self, index: usize) -> ModelResult<DatabaseValue> {
        self.columns
            .get(index)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(format!("#{}", index)))
    }

    fn get_by_name(&self, name: &str) -> ModelResult<DatabaseValue> {
        self.columns
            .iter()
            .rev()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

impl From<HashMap<String, DatabaseValue>> for ValueRow {
    fn from(map: HashMap<String, DatabaseValue>) -> Self {
        let mut columns: Vec<_> = map.into_iter().collect();
        columns.sort_by(|a, b| a.0.cmp(&b.0));
        Self { columns }
    }
}

/// Database value enumeration for type-safe parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Date(chrono::NaiveDate),
    Json(JsonValue),
}

impl DatabaseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int32(i) => JsonValue::from(*i),
            DatabaseValue::Int64(i) => JsonValue::from(*i),
            DatabaseValue::Float64(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect()),
            DatabaseValue::Uuid(u) => JsonValue::String(u.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::Json(j) => j.clone(),
        }
    }

    /// Convert a predicate value coming from the query builder
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        DatabaseValue::Int32(i as i32)
                    } else {
                        DatabaseValue::Int64(i)
                    }
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float64(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            other => DatabaseValue::Json(other),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Int32(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float64(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<uuid::Uuid> for DatabaseValue {
    fn from(value: uuid::Uuid) -> Self {
        DatabaseValue::Uuid(value)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for DatabaseValue {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::Json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}
