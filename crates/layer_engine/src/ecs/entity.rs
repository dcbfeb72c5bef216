//! Entity implementation

use std::collections::HashMap;

use bitflags::bitflags;

use super::{Behavior, ComponentId};
use crate::scene::LayerId;

slotmap::new_key_type! {
    /// Entity identifier
    ///
    /// Generational: once an entity is destroyed its id never resolves again.
    pub struct EntityId;
}

bitflags! {
    /// State flags shared by entities and components
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u8 {
        /// Receives fixed and variable updates
        const ENABLED = 1 << 0;
        /// Receives draw callbacks
        const VISIBLE = 1 << 1;
        /// Terminal; set once destruction has started
        const DESTROYED = 1 << 2;
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self::ENABLED | Self::VISIBLE
    }
}

/// A named composite object living in exactly one layer
///
/// Read access is public; all mutation goes through [`crate::scene::Scene`].
pub struct Entity {
    tag: String,
    layer: LayerId,
    depth: i32,
    pub(crate) flags: ObjectFlags,
    /// Attached components in attach order
    components: Vec<ComponentId>,
    by_tag: HashMap<String, ComponentId>,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    /// Serial of the last pass that dispatched to this entity
    pub(crate) visited: u64,
}

impl Entity {
    pub(crate) fn new(tag: String, layer: LayerId, behavior: Box<dyn Behavior>) -> Self {
        Self {
            tag,
            layer,
            depth: 0,
            flags: ObjectFlags::default(),
            components: Vec::new(),
            by_tag: HashMap::new(),
            behavior: Some(behavior),
            visited: 0,
        }
    }

    /// Entity tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Layer the entity currently lives in
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Draw sort key; higher depths draw first, lower depths end up on top
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Current state flags
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Whether fixed/variable updates reach this entity
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(ObjectFlags::ENABLED)
    }

    /// Whether draw callbacks reach this entity
    pub fn is_visible(&self) -> bool {
        self.flags.contains(ObjectFlags::VISIBLE)
    }

    /// Whether destruction has started
    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(ObjectFlags::DESTROYED)
    }

    /// Attached components in attach order
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    /// Look up an attached component by tag
    pub fn component_id(&self, tag: &str) -> Option<ComponentId> {
        self.by_tag.get(tag).copied()
    }

    /// Check whether a component with this tag is attached
    pub fn has_component(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Whether the entity's own behavior is currently running a callback
    pub fn is_busy(&self) -> bool {
        self.behavior.is_none()
    }

    pub(crate) fn set_layer(&mut self, layer: LayerId) {
        self.layer = layer;
    }

    /// Returns `true` if the depth actually changed
    pub(crate) fn set_depth(&mut self, depth: i32) -> bool {
        if self.depth == depth {
            return false;
        }
        self.depth = depth;
        true
    }

    pub(crate) fn link(&mut self, tag: &str, component: ComponentId) {
        self.by_tag.insert(tag.to_string(), component);
        self.components.push(component);
    }

    pub(crate) fn unlink(&mut self, tag: &str, component: ComponentId) {
        self.by_tag.remove(tag);
        self.components.retain(|&c| c != component);
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("tag", &self.tag)
            .field("layer", &self.layer)
            .field("depth", &self.depth)
            .field("flags", &self.flags)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}
