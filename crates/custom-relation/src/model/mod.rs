//! Model Module - Entity contract and per-instance relation storage

pub mod core_trait;
pub mod relation_map;

pub use core_trait::{identity_key, Model};
pub use relation_map::RelationMap;
