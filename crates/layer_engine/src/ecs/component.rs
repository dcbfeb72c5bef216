//! Component records

use std::any::TypeId;

use super::{Behavior, EntityId, ObjectFlags};

slotmap::new_key_type! {
    /// Component identifier
    pub struct ComponentId;
}

/// A behavior fragment that can be attached to one entity at a time
///
/// Components are created detached. The owner is only ever written by the
/// scene's attach/detach primitives.
pub struct Component {
    tag: String,
    owner: Option<EntityId>,
    pub(crate) flags: ObjectFlags,
    type_id: TypeId,
    type_name: &'static str,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    /// Serial of the last pass that dispatched to this component
    pub(crate) visited: u64,
}

impl Component {
    pub(crate) fn new<B: Behavior>(tag: String, behavior: B) -> Self {
        Self {
            tag,
            owner: None,
            flags: ObjectFlags::default(),
            type_id: TypeId::of::<B>(),
            type_name: std::any::type_name::<B>(),
            behavior: Some(Box::new(behavior)),
            visited: 0,
        }
    }

    /// Component tag, unique within its owner
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Entity this component is attached to
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Whether the component is attached to an entity
    pub fn is_attached(&self) -> bool {
        self.owner.is_some()
    }

    /// Current state flags
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Whether fixed/variable updates reach this component
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(ObjectFlags::ENABLED)
    }

    /// Whether draw callbacks reach this component
    pub fn is_visible(&self) -> bool {
        self.flags.contains(ObjectFlags::VISIBLE)
    }

    /// Whether destruction has started
    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(ObjectFlags::DESTROYED)
    }

    /// Whether the behavior is currently running a callback
    pub fn is_busy(&self) -> bool {
        self.behavior.is_none()
    }

    /// Name of the concrete behavior type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check the concrete behavior type without borrowing the behavior
    pub fn is<T: Behavior>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn set_owner(&mut self, owner: Option<EntityId>) {
        self.owner = owner;
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.tag)
            .field("owner", &self.owner)
            .field("flags", &self.flags)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
