//! Query Builder - Core builder implementation

use std::marker::PhantomData;

use super::types::*;

/// SELECT query under construction, optionally tagged with the model it hydrates
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    pub(crate) select_fields: Vec<String>,
    pub(crate) from_table: Option<String>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) eager_loads: Vec<String>,
    pub(crate) limit_count: Option<i64>,
    _phantom: PhantomData<fn() -> M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            select_fields: self.select_fields.clone(),
            from_table: self.from_table.clone(),
            joins: self.joins.clone(),
            where_conditions: self.where_conditions.clone(),
            eager_loads: self.eager_loads.clone(),
            limit_count: self.limit_count,
            _phantom: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            select_fields: Vec::new(),
            from_table: None,
            joins: Vec::new(),
            where_conditions: Vec::new(),
            eager_loads: Vec::new(),
            limit_count: None,
            _phantom: PhantomData,
        }
    }

    /// Run a by-value builder chain against a borrowed builder.
    ///
    /// Relations hold their query behind `&mut self`; this lets them keep
    /// using the fluent methods.
    pub fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(Self) -> Self,
    {
        let query = std::mem::take(self);
        *self = f(query);
    }

    /// Re-tag the query with another model type
    pub fn cast<T>(&self) -> QueryBuilder<T> {
        QueryBuilder {
            select_fields: self.select_fields.clone(),
            from_table: self.from_table.clone(),
            joins: self.joins.clone(),
            where_conditions: self.where_conditions.clone(),
            eager_loads: self.eager_loads.clone(),
            limit_count: self.limit_count,
            _phantom: PhantomData,
        }
    }

    /// Add an eager-load path (`"roles"`, `"roles.users"`) resolved after hydration
    pub fn with(mut self, relation: &str) -> Self {
        if !self.eager_loads.iter().any(|existing| existing == relation) {
            self.eager_loads.push(relation.to_string());
        }
        self
    }

    pub fn from_table(&self) -> Option<&str> {
        self.from_table.as_deref()
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }

    pub fn eager_loads(&self) -> &[String] {
        &self.eager_loads
    }

    pub fn limit_count(&self) -> Option<i64> {
        self.limit_count
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count);
        self
    }
}
