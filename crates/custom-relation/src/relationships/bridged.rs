//! Bridged many-to-many relation
//!
//! Reaches `Related` from `Parent` through an intermediate model and two link
//! tables, e.g. users -> role_user -> roles -> permission_role -> permissions.
//! Matching relies on the intermediate models being loaded onto each related
//! model with their own parents, which the eager query requests via `with`.

use std::collections::HashSet;
use std::marker::PhantomData;
use serde_json::Value;

use crate::collection::Collection;
use crate::model::{identity_key, Model};
use crate::query::QueryBuilder;
use super::custom::CustomRelation;
use super::link::LinkTable;

/// Shape of a bridged relation
pub trait Bridge: Send + Sync + 'static {
    type Parent: Model;
    type Intermediate: Model;
    type Related: Model;

    /// Link between `Related` (local) and `Intermediate` (remote)
    const RELATED_LINK: LinkTable;

    /// Link between `Intermediate` (local) and `Parent` (remote)
    const PARENT_LINK: LinkTable;

    /// Name of the `Related -> Intermediate` relation
    const INTERMEDIATE_RELATION: &'static str;

    /// Name of the `Intermediate -> Parent` relation
    const PARENT_RELATION: &'static str;
}

pub struct BridgedRelation<'a, B: Bridge> {
    query: QueryBuilder<B::Related>,
    parent: Option<&'a B::Parent>,
    _bridge: PhantomData<fn() -> B>,
}

impl<'a, B: Bridge> BridgedRelation<'a, B> {
    fn join_bridge(&mut self) {
        let related_link = B::RELATED_LINK;
        let parent_link = B::PARENT_LINK;
        self.query.apply(|q| {
            q.join(
                related_link.table_name,
                &related_link.local(),
                &<B::Related as Model>::qualified_key_name(),
            )
            .join(
                <B::Intermediate as Model>::table_name(),
                &<B::Intermediate as Model>::qualified_key_name(),
                &related_link.remote(),
            )
            .join(
                parent_link.table_name,
                &parent_link.local(),
                &<B::Intermediate as Model>::qualified_key_name(),
            )
        });
    }

    /// Key identities of every parent reachable from `related` through its
    /// loaded intermediates
    fn reachable_parents(related: &B::Related) -> HashSet<String> {
        related
            .relation::<B::Intermediate>(B::INTERMEDIATE_RELATION)
            .into_iter()
            .flatten()
            .filter_map(|intermediate| intermediate.relation::<B::Parent>(B::PARENT_RELATION))
            .flatten()
            .filter_map(|parent| parent.primary_key())
            .map(|key| identity_key(&key))
            .collect()
    }
}

impl<'a, B: Bridge> CustomRelation<'a> for BridgedRelation<'a, B> {
    type Parent = B::Parent;
    type Related = B::Related;

    fn new(query: QueryBuilder<B::Related>, parent: Option<&'a B::Parent>) -> Self {
        Self {
            query,
            parent,
            _bridge: PhantomData,
        }
    }

    fn query(&self) -> &QueryBuilder<B::Related> {
        &self.query
    }

    fn query_mut(&mut self) -> &mut QueryBuilder<B::Related> {
        &mut self.query
    }

    fn parent(&self) -> Option<&'a B::Parent> {
        self.parent
    }

    fn add_constraints(&mut self) {
        self.join_bridge();

        let column = B::PARENT_LINK.remote();
        match self.parent.and_then(|parent| parent.primary_key()) {
            Some(key) => self.query.apply(|q| q.where_eq(&column, key)),
            // Unsaved parent: nothing can link to it
            None => self.query.apply(|q| q.where_in(&column, Vec::<Value>::new())),
        }
    }

    fn add_eager_constraints(&mut self, parents: &[B::Parent]) {
        self.join_bridge();

        let mut seen = HashSet::new();
        let keys: Vec<Value> = parents
            .iter()
            .filter_map(|parent| parent.primary_key())
            .filter(|key| seen.insert(identity_key(key)))
            .collect();
        let column = B::PARENT_LINK.remote();
        let nested = format!("{}.{}", B::INTERMEDIATE_RELATION, B::PARENT_RELATION);
        self.query.apply(|q| q.where_in(&column, keys).with(&nested));
    }

    fn match_results(&self, parents: &mut [B::Parent], results: Collection<B::Related>, relation: &str) {
        if results.is_empty() {
            return;
        }

        let results = results.unique();
        let reachable: Vec<HashSet<String>> = results.iter().map(Self::reachable_parents).collect();

        for parent in parents.iter_mut() {
            let matched: Collection<B::Related> = match parent.primary_key() {
                Some(key) => {
                    let key = identity_key(&key);
                    results
                        .iter()
                        .zip(&reachable)
                        .filter(|(_, owners)| owners.contains(&key))
                        .map(|(related, _)| related.clone())
                        .collect()
                }
                None => Collection::new(),
            };
            tracing::trace!(
                "Matched {} {} to {} as '{}'",
                matched.len(),
                <B::Related as Model>::table_name(),
                <B::Parent as Model>::table_name(),
                relation
            );
            parent.set_relation(relation, matched);
        }
    }
}
