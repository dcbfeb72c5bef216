//! Entity and component building blocks
//!
//! Entities and components are plain records owned by a [`crate::scene::Scene`].
//! Everything that changes their relationships (attach, detach, layer moves,
//! destruction) goes through the scene so the layer registries never drift.

pub mod behavior;
pub mod component;
pub mod entity;

pub use behavior::{AsAny, Behavior, Context};
pub use component::{Component, ComponentId};
pub use entity::{Entity, EntityId, ObjectFlags};
