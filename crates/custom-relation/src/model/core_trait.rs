//! Core Model Trait - Base definition for database entities
//!
//! Defines what the relation layer needs from an entity: table metadata,
//! primary key and attribute access, row hydration and a slot map for
//! loaded relations.

use std::fmt::Debug;
use serde_json::Value;

use crate::backends::DatabaseRow;
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::query::QueryBuilder;
use crate::relationships::eager_loading::EagerLoaders;
use super::relation_map::RelationMap;

/// Core trait for database models used by relations
pub trait Model: Send + Sync + Debug + Clone + 'static {
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Table-qualified primary key column, e.g. `permissions.id`
    fn qualified_key_name() -> String {
        format!("{}.{}", Self::table_name(), Self::primary_key_name())
    }

    /// Read a named attribute
    fn get_attribute(&self, name: &str) -> Option<Value>;

    /// Primary key value; unsaved instances and NULL keys yield `None`
    fn primary_key(&self) -> Option<Value> {
        self.get_attribute(Self::primary_key_name())
            .filter(|value| !value.is_null())
    }

    /// Create a model instance from a database row
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self>;

    /// Loaded relations for this instance
    fn relations(&self) -> &RelationMap;

    fn relations_mut(&mut self) -> &mut RelationMap;

    /// Named loaders available to `with` and `eager_load`
    fn eager_loaders() -> EagerLoaders<Self> {
        EagerLoaders::new()
    }

    /// Fresh query scoped to this model's table
    fn new_query() -> QueryBuilder<Self> {
        QueryBuilder::new().from(Self::table_name())
    }

    fn new_collection(models: Vec<Self>) -> Collection<Self> {
        Collection::from(models)
    }

    /// Store `related` under `name`, replacing whatever was there
    fn set_relation<R: Model>(&mut self, name: &str, related: Collection<R>) {
        self.relations_mut().set(name, related);
    }

    /// Loaded relation under `name`, if present and of type `R`
    fn relation<R: Model>(&self, name: &str) -> Option<&Collection<R>> {
        self.relations().get(name)
    }

    fn relation_loaded(&self, name: &str) -> bool {
        self.relations().contains(name)
    }
}

/// Comparable identity for a key value.
///
/// Drivers may return the same key as `7` or `"7"` depending on the column
/// path it was read through; both map to the same identity.
pub fn identity_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
