//! Query Builder Module - Composable SELECT builder used as a relation's query context

pub mod builder;
pub mod execution;
pub mod joins;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{JoinClause, QueryOperator, WhereCondition};
