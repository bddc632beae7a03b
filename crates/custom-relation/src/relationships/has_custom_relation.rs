//! Relation attachment for models

use crate::model::Model;
use super::custom::CustomRelation;

/// Lets any model build a custom relation scoped to itself.
///
/// Typed accessors are thin wrappers:
///
/// ```ignore
/// impl User {
///     pub fn permissions(&self) -> BridgedRelation<'_, UserPermissions> {
///         self.relates_to()
///     }
/// }
/// ```
pub trait HasCustomRelation: Model {
    /// New relation over a fresh query of the related table, bound to `self`
    /// and already constrained to it.
    ///
    /// This calls `add_constraints` once itself, so unlike a relation fresh
    /// from [`CustomRelation::new`] the returned query is scoped to `self`;
    /// callers must not apply the constraints again.
    fn relates_to<'a, R>(&'a self) -> R
    where
        R: CustomRelation<'a, Parent = Self>,
    {
        let query = <R::Related as Model>::new_query();
        let mut relation = R::new(query, Some(self));
        relation.add_constraints();
        relation
    }
}

impl<M: Model> HasCustomRelation for M {}
