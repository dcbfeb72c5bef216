//! Scene error types

use thiserror::Error;

use crate::ecs::{ComponentId, EntityId};
use crate::scene::{LayerId, Pass};

/// Contract violations reported by scene operations
///
/// These are programmer errors rather than transient faults; nothing in the
/// engine retries them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Tag already used by another component on the same entity
    #[error("entity {entity:?} already has a component tagged `{tag}`")]
    DuplicateTag {
        /// Target entity
        entity: EntityId,
        /// Offending tag
        tag: String,
    },

    /// Required component type is not attached
    #[error("entity {entity:?} has no component of type `{type_name}`")]
    MissingComponent {
        /// Queried entity
        entity: EntityId,
        /// Requested behavior type
        type_name: &'static str,
    },

    /// Required tag is not attached
    #[error("entity {entity:?} has no component tagged `{tag}`")]
    MissingTag {
        /// Queried entity
        entity: EntityId,
        /// Requested tag
        tag: String,
    },

    /// Structural operation on a destroyed (or foreign) entity
    #[error("entity {0:?} has been destroyed")]
    EntityDestroyed(EntityId),

    /// Component id does not resolve to a live component
    #[error("component {0:?} does not exist")]
    UnknownComponent(ComponentId),

    /// Component is already attached somewhere
    #[error("component {component:?} is already attached to entity {owner:?}")]
    ComponentAttached {
        /// Component being attached
        component: ComponentId,
        /// Its current owner
        owner: EntityId,
    },

    /// Component behavior is checked out by a running hook
    #[error("component {0:?} is running a callback and cannot be borrowed")]
    ComponentBusy(ComponentId),

    /// Layer id does not resolve
    #[error("layer {0:?} does not exist")]
    UnknownLayer(LayerId),

    /// Layer name already taken in this scene
    #[error("a layer named `{0}` already exists")]
    DuplicateLayer(String),

    /// A pass was started from inside a pass on the same layer
    #[error("layer `{layer}` is already running {active:?}; cannot start {requested:?}")]
    ReentrantPass {
        /// Layer name
        layer: String,
        /// Pass in progress
        active: Pass,
        /// Pass that was requested
        requested: Pass,
    },
}
