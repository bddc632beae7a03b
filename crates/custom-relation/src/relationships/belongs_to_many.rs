//! Many-to-many through a link table

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use async_trait::async_trait;
use serde_json::Value;

use crate::backends::{DatabaseRow, QueryExecutor};
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::model::{identity_key, Model};
use super::eager_loading::{eager_load_paths, validate_paths, EagerLoad};
use super::link::LinkTable;

/// Eager loader for `P <-> R` through `link`, where `link.local_column`
/// references `P` and `link.remote_column` references `R`
pub struct BelongsToMany<P, R> {
    link: LinkTable,
    _models: PhantomData<fn() -> (P, R)>,
}

impl<P: Model, R: Model> BelongsToMany<P, R> {
    pub fn new(link: LinkTable) -> Self {
        Self {
            link,
            _models: PhantomData,
        }
    }

    fn pivot_alias(&self) -> String {
        format!("pivot_{}", self.link.local_column)
    }
}

#[async_trait]
impl<P: Model, R: Model> EagerLoad<P> for BelongsToMany<P, R> {
    async fn load(
        &self,
        models: &mut [P],
        relation: &str,
        nested: &[String],
        executor: &dyn QueryExecutor,
    ) -> ModelResult<()> {
        let mut seen = HashSet::new();
        let keys: Vec<Value> = models
            .iter()
            .filter_map(|model| model.primary_key())
            .filter(|key| seen.insert(identity_key(key)))
            .collect();

        if keys.is_empty() {
            for model in models.iter_mut() {
                model.set_relation(relation, Collection::<R>::new());
            }
            return Ok(());
        }

        let pivot_alias = self.pivot_alias();
        let query = R::new_query()
            .select(&format!("{}.*", R::table_name()))
            .select(&format!("{} AS {}", self.link.local(), pivot_alias))
            .join(self.link.table_name, &self.link.remote(), &R::qualified_key_name())
            .where_in(&self.link.local(), keys);

        let rows = query.fetch_rows(executor).await?;
        let mut related = Vec::with_capacity(rows.len());
        let mut owners = Vec::with_capacity(rows.len());
        for row in &rows {
            related.push(R::from_row(&**row)?);
            owners.push(identity_key(&row.get_by_name(&pivot_alias)?.to_json()));
        }
        drop(rows);

        if !nested.is_empty() {
            eager_load_paths(&mut related, nested, executor).await?;
        }

        let mut grouped: HashMap<String, Collection<R>> = HashMap::new();
        for (owner, model) in owners.into_iter().zip(related) {
            grouped.entry(owner).or_default().push(model);
        }

        for model in models.iter_mut() {
            let matched = model
                .primary_key()
                .and_then(|key| grouped.get(&identity_key(&key)).cloned())
                .unwrap_or_default();
            model.set_relation(relation, matched);
        }
        Ok(())
    }

    fn validate(&self, nested: &[String]) -> ModelResult<()> {
        validate_paths::<R>(nested)
    }
}
