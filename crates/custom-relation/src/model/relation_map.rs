//! Relation storage - loaded relations keyed by name
//!
//! Slots are type-erased so one model can hold collections of several
//! related types; reads are typed and a mismatch reads as absent.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

use crate::collection::Collection;
use crate::model::Model;

trait RelationSlot: Any + Send + Sync + Debug {
    fn clone_slot(&self) -> Box<dyn RelationSlot>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn slot_len(&self) -> usize;
}

impl<M: Model> RelationSlot for Collection<M> {
    fn clone_slot(&self) -> Box<dyn RelationSlot> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn slot_len(&self) -> usize {
        self.len()
    }
}

/// Loaded relations of a single model instance
#[derive(Debug, Default)]
pub struct RelationMap {
    slots: HashMap<String, Box<dyn RelationSlot>>,
}

impl Clone for RelationMap {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|(name, slot)| (name.clone(), slot.clone_slot()))
                .collect(),
        }
    }
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a collection, overwriting any previous value under `name`
    pub fn set<M: Model>(&mut self, name: &str, related: Collection<M>) {
        self.slots.insert(name.to_string(), Box::new(related));
    }

    pub fn get<M: Model>(&self, name: &str) -> Option<&Collection<M>> {
        let slot = self.slots.get(name)?;
        let typed = slot.as_any().downcast_ref::<Collection<M>>();
        if typed.is_none() {
            tracing::warn!(
                "Relation '{}' holds a different model type than '{}'",
                name,
                M::table_name()
            );
        }
        typed
    }

    pub fn get_mut<M: Model>(&mut self, name: &str) -> Option<&mut Collection<M>> {
        self.slots
            .get_mut(name)?
            .as_any_mut()
            .downcast_mut::<Collection<M>>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Number of entities loaded under `name`
    pub fn count(&self, name: &str) -> Option<usize> {
        self.slots.get(name).map(|slot| slot.slot_len())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.slots.remove(name).is_some()
    }

    /// Names of the loaded relations, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
