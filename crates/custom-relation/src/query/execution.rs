//! Query Builder execution for Model types

use crate::backends::{DatabaseRow, QueryExecutor};
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::model::Model;
use crate::relationships::eager_loading::eager_load_paths;
use super::builder::QueryBuilder;

impl<M> QueryBuilder<M> {
    /// Execute the query and return the raw rows
    pub async fn fetch_rows(&self, executor: &dyn QueryExecutor) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let untyped: QueryBuilder = self.cast();
        tracing::debug!("Executing query: {}", untyped.to_sql());
        executor.fetch_all(&untyped).await
    }
}

// Implement specialized methods for Model-typed query builders
impl<M: Model> QueryBuilder<M> {
    /// Execute query, hydrate models and resolve `with` paths
    pub async fn get(self, executor: &dyn QueryExecutor) -> ModelResult<Collection<M>> {
        let rows = self.fetch_rows(executor).await?;

        let mut models = Vec::with_capacity(rows.len());
        for row in &rows {
            models.push(M::from_row(&**row)?);
        }
        drop(rows);

        if !self.eager_loads.is_empty() {
            eager_load_paths(&mut models, &self.eager_loads, executor).await?;
        }

        Ok(M::new_collection(models))
    }

    /// Execute query and return first model
    pub async fn first(self, executor: &dyn QueryExecutor) -> ModelResult<Option<M>> {
        let results = self.limit(1).get(executor).await?;
        Ok(results.into_iter().next())
    }
}
