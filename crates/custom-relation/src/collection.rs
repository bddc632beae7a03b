//! Ordered, homogeneous result container
//!
//! Relations hand results around as `Collection<M>`. Every operation keeps
//! the input order.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use serde_json::Value;

use crate::backends::QueryExecutor;
use crate::error::ModelResult;
use crate::model::{identity_key, Model};
use crate::relationships::eager_loading::eager_load;

#[derive(Debug, Clone, PartialEq)]
pub struct Collection<M> {
    items: Vec<M>,
}

impl<M> Default for Collection<M> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<M> Collection<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, M> {
        self.items.iter_mut()
    }

    pub fn push(&mut self, item: M) {
        self.items.push(item);
    }

    pub fn first(&self) -> Option<&M> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[M] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [M] {
        &mut self.items
    }

    pub fn into_vec(self) -> Vec<M> {
        self.items
    }

    pub fn map<T, F>(self, f: F) -> Collection<T>
    where
        F: FnMut(M) -> T,
    {
        self.items.into_iter().map(f).collect()
    }

    /// Keep the first item per key. Items without a key are always kept.
    pub fn unique_by<K, F>(self, key: F) -> Self
    where
        K: Eq + Hash,
        F: Fn(&M) -> Option<K>,
    {
        let mut seen = HashSet::new();
        self.items
            .into_iter()
            .filter(|item| match key(item) {
                Some(k) => seen.insert(k),
                None => true,
            })
            .collect()
    }

    /// Partition by key; each group keeps the input relative order
    pub fn group_by<K, F>(self, key: F) -> HashMap<K, Collection<M>>
    where
        K: Eq + Hash,
        F: Fn(&M) -> K,
    {
        let mut groups: HashMap<K, Collection<M>> = HashMap::new();
        for item in self.items {
            groups.entry(key(&item)).or_default().push(item);
        }
        groups
    }
}

impl<M: Clone> Collection<M> {
    /// Items matching the predicate, as a new collection
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&M) -> bool,
    {
        self.items.iter().filter(|item| predicate(*item)).cloned().collect()
    }
}

impl<M: Model> Collection<M> {
    /// Drop later duplicates by primary key
    pub fn unique(self) -> Self {
        self.unique_by(|model| model.primary_key().map(|key| identity_key(&key)))
    }

    /// Primary keys of the models that have one, in order
    pub fn keys(&self) -> Vec<Value> {
        self.items.iter().filter_map(|model| model.primary_key()).collect()
    }

    /// Values of one attribute across the collection; missing values are skipped
    pub fn pluck(&self, attribute: &str) -> Vec<Value> {
        self.items
            .iter()
            .filter_map(|model| model.get_attribute(attribute))
            .collect()
    }

    /// Eager-load `path` onto every model already in the collection
    pub async fn load(&mut self, path: &str, executor: &dyn QueryExecutor) -> ModelResult<()> {
        eager_load(self.as_mut_slice(), path, executor).await
    }
}

impl<M> From<Vec<M>> for Collection<M> {
    fn from(items: Vec<M>) -> Self {
        Self { items }
    }
}

impl<M> FromIterator<M> for Collection<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

impl<M> IntoIterator for Collection<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, M> IntoIterator for &'a Collection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
