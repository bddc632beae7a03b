//! Connection configuration for the PostgreSQL executor

use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout: u64,
    pub idle_timeout: Option<u64>,
    pub max_lifetime: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600), // 10 minutes
            max_lifetime: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

/// Database URL plus pool settings
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: PoolConfig,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: PoolConfig::default(),
        }
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Read `DATABASE_URL` and the optional `DATABASE_MAX_CONNECTIONS`,
    /// `DATABASE_MIN_CONNECTIONS` and `DATABASE_ACQUIRE_TIMEOUT` overrides
    pub fn from_env() -> ModelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> ModelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .ok_or_else(|| ModelError::Configuration("DATABASE_URL is not set".to_string()))?;

        if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
            return Err(ModelError::Configuration(
                "DATABASE_URL must use the postgres:// or postgresql:// scheme".to_string(),
            ));
        }

        let mut pool = PoolConfig::default();
        if let Some(max) = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")? {
            pool.max_connections = max;
        }
        if let Some(min) = parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")? {
            pool.min_connections = min;
        }
        if let Some(timeout) = parse_var(&lookup, "DATABASE_ACQUIRE_TIMEOUT")? {
            pool.acquire_timeout = timeout;
        }

        if pool.min_connections > pool.max_connections {
            return Err(ModelError::Configuration(format!(
                "min_connections ({}) exceeds max_connections ({})",
                pool.min_connections, pool.max_connections
            )));
        }

        Ok(Self { url, pool })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ModelResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ModelError::Configuration(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(None),
    }
}
