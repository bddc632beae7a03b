//! Custom relations
//!
//! A custom relation owns a query over the related table and, when it was
//! built for a single model, a reference to that model. Implementations
//! supply the four hooks on [`CustomRelation`]; the execution and eager-load
//! cycle in [`CustomRelationExt`] is shared by all of them and cannot be
//! replaced.

use async_trait::async_trait;

use crate::backends::QueryExecutor;
use crate::collection::Collection;
use crate::error::ModelResult;
use crate::model::Model;
use crate::query::QueryBuilder;

/// User-defined relation between `Parent` and `Related`
pub trait CustomRelation<'a>: Sized + Send + Sync {
    type Parent: Model;
    type Related: Model;

    /// Bind a fresh query and, for single-model access, the owning model.
    /// Eager-load instances are built with `None`.
    fn new(query: QueryBuilder<Self::Related>, parent: Option<&'a Self::Parent>) -> Self;

    fn query(&self) -> &QueryBuilder<Self::Related>;

    fn query_mut(&mut self) -> &mut QueryBuilder<Self::Related>;

    fn parent(&self) -> Option<&'a Self::Parent>;

    /// Scope the query to the bound parent
    fn add_constraints(&mut self);

    /// Scope the query to a batch of parents
    fn add_eager_constraints(&mut self, parents: &[Self::Parent]);

    /// Distribute `results` onto `parents` under `relation`.
    ///
    /// Must leave the parents untouched when `results` is empty.
    fn match_results(
        &self,
        parents: &mut [Self::Parent],
        results: Collection<Self::Related>,
        relation: &str,
    );
}

/// Execution and eager-load cycle shared by every custom relation
#[async_trait]
pub trait CustomRelationExt<'a>: CustomRelation<'a> {
    /// Give every parent an empty collection under `relation`
    fn init_relation(&self, parents: &mut [Self::Parent], relation: &str) {
        for parent in parents.iter_mut() {
            parent.set_relation(relation, Collection::<Self::Related>::new());
        }
    }

    /// Execute the relation query selecting the related table's columns.
    ///
    /// A related model reached through several join paths is returned once,
    /// at its first position.
    async fn get_results(&self, executor: &dyn QueryExecutor) -> ModelResult<Collection<Self::Related>> {
        let projection = format!("{}.*", <Self::Related as Model>::table_name());
        let results = self
            .query()
            .clone()
            .columns(&[projection.as_str()])
            .get(executor)
            .await?;
        Ok(results.unique())
    }

    /// Execute with explicit columns, returning each related model once.
    ///
    /// An empty list or `["*"]` selects the related table's columns.
    async fn get(
        &self,
        executor: &dyn QueryExecutor,
        columns: &[&str],
    ) -> ModelResult<Collection<Self::Related>> {
        if columns.is_empty() || columns == ["*"] {
            return self.get_results(executor).await;
        }
        let results = self.query().clone().columns(columns).get(executor).await?;
        Ok(results.unique())
    }

    /// Load this relation onto a batch of parents
    async fn eager_load_into(
        &mut self,
        parents: &mut [Self::Parent],
        relation: &str,
        executor: &dyn QueryExecutor,
    ) -> ModelResult<()> {
        self.add_eager_constraints(parents);
        self.init_relation(parents, relation);

        let results = self.get_results(executor).await?;
        tracing::debug!(
            "Eager loaded {} {} for {} {} as '{}'",
            results.len(),
            <Self::Related as Model>::table_name(),
            parents.len(),
            <Self::Parent as Model>::table_name(),
            relation
        );

        self.match_results(parents, results, relation);
        Ok(())
    }
}

impl<'a, R: CustomRelation<'a>> CustomRelationExt<'a> for R {}
