//! Relationships Module - Custom relation abstraction with eager loading

pub mod custom;
pub mod has_custom_relation;
pub mod link;
pub mod bridged;
pub mod belongs_to_many;
pub mod eager_loading;

// Re-export main types
pub use custom::*;
pub use has_custom_relation::*;
pub use link::*;
pub use bridged::*;
pub use belongs_to_many::*;
pub use eager_loading::*;
