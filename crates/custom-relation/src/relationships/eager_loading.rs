//! Eager Loading System - Prevents N+1 query problems with efficient relationship loading
//!
//! Each model lists its loadable relations in [`Model::eager_loaders`].
//! Paths may be nested (`"roles.users"`): paths are grouped by their first
//! segment, that relation is loaded once onto the batch and the remainders
//! are handed to its loader, which resolves them against the related models
//! it fetched. One query per distinct segment, whatever the batch size.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use async_trait::async_trait;

use crate::backends::QueryExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use super::custom::{CustomRelation, CustomRelationExt};

/// Loads one named relation onto a batch of models
#[async_trait]
pub trait EagerLoad<M: Model>: Send + Sync {
    /// Load `relation` onto `models`, then resolve the `nested` paths on what
    /// was loaded
    async fn load(
        &self,
        models: &mut [M],
        relation: &str,
        nested: &[String],
        executor: &dyn QueryExecutor,
    ) -> ModelResult<()>;

    /// Check that every `nested` path names relations of the loaded model
    fn validate(&self, nested: &[String]) -> ModelResult<()>;
}

/// Named eager loaders for a model
pub struct EagerLoaders<M: Model> {
    loaders: HashMap<&'static str, Box<dyn EagerLoad<M>>>,
}

impl<M: Model> EagerLoaders<M> {
    pub fn new() -> Self {
        Self { loaders: HashMap::new() }
    }

    /// Register a loader; a later registration under the same name wins
    pub fn register<L>(mut self, name: &'static str, loader: L) -> Self
    where
        L: EagerLoad<M> + 'static,
    {
        self.loaders.insert(name, Box::new(loader));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn EagerLoad<M>> {
        self.loaders.get(name).map(|loader| loader.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.loaders.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl<M: Model> Default for EagerLoaders<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> fmt::Debug for EagerLoaders<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerLoaders")
            .field("model", &M::table_name())
            .field("relations", &self.names())
            .finish()
    }
}

/// Runs any [`CustomRelation`] through its eager-load cycle
pub struct CustomRelationLoader<R> {
    _relation: PhantomData<fn() -> R>,
}

impl<R> CustomRelationLoader<R> {
    pub fn new() -> Self {
        Self { _relation: PhantomData }
    }
}

impl<R> Default for CustomRelationLoader<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> EagerLoad<R::Parent> for CustomRelationLoader<R>
where
    R: CustomRelation<'static> + 'static,
{
    async fn load(
        &self,
        models: &mut [R::Parent],
        relation: &str,
        nested: &[String],
        executor: &dyn QueryExecutor,
    ) -> ModelResult<()> {
        let mut instance = R::new(<R::Related as Model>::new_query(), None);
        for path in nested {
            instance.query_mut().apply(|q| q.with(path));
        }
        instance.eager_load_into(models, relation, executor).await
    }

    fn validate(&self, nested: &[String]) -> ModelResult<()> {
        validate_paths::<R::Related>(nested)
    }
}

/// Load a dotted relation path onto every model in the batch
pub async fn eager_load<M: Model>(
    models: &mut [M],
    path: &str,
    executor: &dyn QueryExecutor,
) -> ModelResult<()> {
    eager_load_paths(models, &[path.to_string()], executor).await
}

/// Check every segment of every path against the loaders of the model it is
/// looked up on. The error names that model.
pub fn validate_paths<M: Model>(paths: &[String]) -> ModelResult<()> {
    let loaders = M::eager_loaders();
    for (relation, nested) in group_paths(paths) {
        let loader = loaders.get(relation).ok_or_else(|| ModelError::RelationNotFound {
            model: M::table_name().to_string(),
            relation: relation.to_string(),
        })?;
        loader.validate(&nested)?;
    }
    Ok(())
}

/// Load several relation paths onto every model in the batch.
///
/// Unknown relation names, nested ones included, fail before any query runs.
pub async fn eager_load_paths<M: Model>(
    models: &mut [M],
    paths: &[String],
    executor: &dyn QueryExecutor,
) -> ModelResult<()> {
    validate_paths::<M>(paths)?;

    let loaders = M::eager_loaders();
    let groups = group_paths(paths);

    if models.is_empty() {
        return Ok(());
    }

    for (relation, nested) in &groups {
        let loader = loaders.get(relation).ok_or_else(|| ModelError::RelationNotFound {
            model: M::table_name().to_string(),
            relation: relation.to_string(),
        })?;

        tracing::debug!(
            "Eager loading '{}' for {} {} (nested: {:?})",
            relation,
            models.len(),
            M::table_name(),
            nested
        );
        loader.load(models, relation, nested, executor).await?;
    }
    Ok(())
}

/// Eager-load a relation path onto a single, already fetched model
pub async fn load<M: Model>(model: &mut M, path: &str, executor: &dyn QueryExecutor) -> ModelResult<()> {
    eager_load(std::slice::from_mut(model), path, executor).await
}

/// Group paths by first segment, in order of first appearance.
/// `["roles.users", "roles", "roles.permissions"]` becomes
/// `[("roles", ["users", "permissions"])]`.
fn group_paths(paths: &[String]) -> Vec<(&str, Vec<String>)> {
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    for path in paths {
        let (relation, rest) = match path.split_once('.') {
            Some((relation, rest)) => (relation, Some(rest)),
            None => (path.as_str(), None),
        };

        let index = match groups.iter().position(|(name, _)| *name == relation) {
            Some(index) => index,
            None => {
                groups.push((relation, Vec::new()));
                groups.len() - 1
            }
        };

        if let Some(rest) = rest {
            if !groups[index].1.iter().any(|existing| existing == rest) {
                groups[index].1.push(rest.to_string());
            }
        }
    }
    groups
}
