//! # elif-custom-relation: Custom Relations for elif.rs Models
//!
//! Lets applications define relations the built-in one-to-one, one-to-many
//! and many-to-many kinds cannot express. A relation implements four hooks
//! ([`CustomRelation`]); executing it, attaching it to a model and loading it
//! for a whole batch without N+1 queries come for free.
//!
//! The crate ships one concrete relation, [`BridgedRelation`], which reaches
//! related models through an intermediate model and two link tables
//! (users -> roles -> permissions).

pub mod backends;
pub mod collection;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod relationships;

// Re-export core traits and types
pub use backends::{
    DatabaseRow, DatabaseRowExt, DatabaseValue, PostgresExecutor, PostgresRow, QueryExecutor, ValueRow,
};
pub use collection::Collection;
pub use config::*;
pub use error::*;
pub use model::*;
pub use query::*;
pub use relationships::*;
