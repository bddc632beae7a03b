//! PostgreSQL Executor
//!
//! Runs relation queries on a sqlx PostgreSQL pool. Pooling, timeouts and
//! cancellation are sqlx's; failures are mapped into `ModelError` and
//! returned to the caller as-is.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{Column, Pool, Postgres, Row, TypeInfo, ValueRef};

use super::core::{DatabaseRow, DatabaseValue, QueryExecutor};
use crate::config::DatabaseConfig;
use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;

/// `QueryExecutor` backed by a sqlx PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: Arc<Pool<Postgres>>,
}

impl PostgresExecutor {
    /// Wrap an existing pool
    pub fn new(pool: Arc<Pool<Postgres>>) -> Self {
        Self { pool }
    }

    /// Create a pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> ModelResult<Self> {
        let pool_config = &config.pool;
        tracing::debug!(
            "Creating database pool with config: max={}, min={}, timeout={}s, idle_timeout={:?}s, max_lifetime={:?}s",
            pool_config.max_connections,
            pool_config.min_connections,
            pool_config.acquire_timeout,
            pool_config.idle_timeout,
            pool_config.max_lifetime
        );

        let mut options = PgPoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .acquire_timeout(Duration::from_secs(pool_config.acquire_timeout))
            .test_before_acquire(pool_config.test_before_acquire);

        if let Some(idle_timeout) = pool_config.idle_timeout {
            options = options.idle_timeout(Duration::from_secs(idle_timeout));
        }

        if let Some(max_lifetime) = pool_config.max_lifetime {
            options = options.max_lifetime(Duration::from_secs(max_lifetime));
        }

        let pool = options.connect(&config.url).await.map_err(|e| {
            tracing::error!("Failed to create database pool: {}", e);
            ModelError::Connection(format!("Failed to create database pool: {}", e))
        })?;

        tracing::info!(
            "Database pool created with {} max connections",
            pool_config.max_connections
        );
        Ok(Self::new(Arc::new(pool)))
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for PostgresExecutor {
    async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let (sql, params) = query.to_sql_with_params();
        tracing::debug!(sql = %sql, params = params.len(), "executing select");

        let mut statement = sqlx::query(&sql);
        for param in &params {
            statement = bind_database_value(statement, param);
        }

        let rows = statement
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| ModelError::Query(format!("Query fetch failed: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| Box::new(PostgresRow::new(row)) as Box<dyn DatabaseRow>)
            .collect())
    }
}

/// PostgreSQL row
pub struct PostgresRow {
    row: PgRow,
}

impl PostgresRow {
    pub fn new(row: PgRow) -> Self {
        Self { row }
    }
}

impl DatabaseRow for PostgresRow {
    fn get_by_index(&self, index: usize) -> ModelResult<DatabaseValue> {
        if index >= self.row.len() {
            return Err(ModelError::ColumnNotFound(format!("#{}", index)));
        }
        postgres_value_to_database_value(&self.row, index)
    }

    fn get_by_name(&self, name: &str) -> ModelResult<DatabaseValue> {
        // Last match wins, same as `ValueRow`
        let index = self
            .row
            .columns()
            .iter()
            .rposition(|col| col.name() == name)
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))?;

        postgres_value_to_database_value(&self.row, index)
    }

    fn column_names(&self) -> Vec<String> {
        self.row.columns().iter().map(|col| col.name().to_string()).collect()
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

fn bind_database_value<'q>(query: PgQuery<'q>, value: &DatabaseValue) -> PgQuery<'q> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(b) => query.bind(*b),
        DatabaseValue::Int32(i) => query.bind(*i),
        DatabaseValue::Int64(i) => query.bind(*i),
        DatabaseValue::Float64(f) => query.bind(*f),
        DatabaseValue::String(s) => query.bind(s.clone()),
        DatabaseValue::Bytes(b) => query.bind(b.clone()),
        DatabaseValue::Uuid(u) => query.bind(*u),
        DatabaseValue::DateTime(dt) => query.bind(*dt),
        DatabaseValue::Date(d) => query.bind(*d),
        DatabaseValue::Json(j) => query.bind(j.clone()),
    }
}

fn postgres_value_to_database_value(row: &PgRow, index: usize) -> ModelResult<DatabaseValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| ModelError::Query(format!("Failed to read column #{}: {}", index, e)))?;
    if raw.is_null() {
        return Ok(DatabaseValue::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();
    let decode_err =
        |e: sqlx::Error| ModelError::Serialization(format!("Failed to decode {} value: {}", type_name, e));

    match type_name.as_str() {
        "BOOL" => Ok(DatabaseValue::Bool(row.try_get(index).map_err(decode_err)?)),
        "INT2" => Ok(DatabaseValue::Int32(row.try_get::<i16, _>(index).map_err(decode_err)? as i32)),
        "INT4" => Ok(DatabaseValue::Int32(row.try_get(index).map_err(decode_err)?)),
        "INT8" => Ok(DatabaseValue::Int64(row.try_get(index).map_err(decode_err)?)),
        "FLOAT4" => Ok(DatabaseValue::Float64(row.try_get::<f32, _>(index).map_err(decode_err)? as f64)),
        "FLOAT8" => Ok(DatabaseValue::Float64(row.try_get(index).map_err(decode_err)?)),
        "BYTEA" => Ok(DatabaseValue::Bytes(row.try_get(index).map_err(decode_err)?)),
        "UUID" => Ok(DatabaseValue::Uuid(row.try_get(index).map_err(decode_err)?)),
        "TIMESTAMPTZ" => Ok(DatabaseValue::DateTime(row.try_get(index).map_err(decode_err)?)),
        "TIMESTAMP" => {
            let naive: chrono::NaiveDateTime = row.try_get(index).map_err(decode_err)?;
            Ok(DatabaseValue::DateTime(naive.and_utc()))
        }
        "DATE" => Ok(DatabaseValue::Date(row.try_get(index).map_err(decode_err)?)),
        "JSON" | "JSONB" => Ok(DatabaseValue::Json(row.try_get::<JsonValue, _>(index).map_err(decode_err)?)),
        _ => Ok(DatabaseValue::String(row.try_get(index).map_err(decode_err)?)),
    }
}
