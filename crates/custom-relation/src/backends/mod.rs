//! Database Backend Abstractions
//!
//! The executor seam relations run through, plus the PostgreSQL
//! implementation on sqlx.

pub mod core;
pub mod postgres;

pub use self::core::*;
pub use postgres::{PostgresExecutor, PostgresRow};
