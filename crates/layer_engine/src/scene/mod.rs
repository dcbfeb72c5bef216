//! Scene management system
//!
//! A [`Scene`] owns every layer, entity and component in it. Layers hold the
//! authoritative registries used for dispatch; entities keep a private
//! tag-to-component map. The two are only ever changed together by the
//! attach/detach primitives in [`lifecycle`].
//!
//! ## Frame flow
//!
//! ```text
//! driver ── fixed_update ×N ──▶ layer 0 … layer n   (components, then entities)
//!        ── update ─────────▶ layer 0 … layer n
//!        ── draw ───────────▶ layer 0 … layer n   (cached depth order)
//! ```

mod dispatch;
mod layer;
mod lifecycle;
mod renderer;


use std::collections::HashMap;

use slotmap::SlotMap;

pub use dispatch::Pass;
pub use layer::{Layer, LayerId, LayerStats};
pub use renderer::{NullRenderer, Renderer};

use crate::ecs::{Component, ComponentId, Entity, EntityId};
use crate::error::SceneError;

/// Named collection of layers and the arena for everything placed in them
pub struct Scene {
    name: String,
    layers: SlotMap<LayerId, Layer>,
    /// Dispatch order; append-only
    layer_order: Vec<LayerId>,
    layer_names: HashMap<String, LayerId>,
    entities: SlotMap<EntityId, Entity>,
    components: SlotMap<ComponentId, Component>,
    /// Bumped once per scene-wide or single-layer pass
    pass_serial: u64,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: SlotMap::with_key(),
            layer_order: Vec::new(),
            layer_names: HashMap::new(),
            entities: SlotMap::with_key(),
            components: SlotMap::with_key(),
            pass_serial: 0,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a layer; layers run in the order they were added
    pub fn add_layer(&mut self, name: impl Into<String>) -> Result<LayerId, SceneError> {
        let name = name.into();
        if self.layer_names.contains_key(&name) {
            return Err(SceneError::DuplicateLayer(name));
        }

        let id = self.layers.insert(Layer::new(name.clone()));
        self.layer_order.push(id);
        log::debug!("Scene '{}' added layer '{}'", self.name, name);
        self.layer_names.insert(name, id);
        Ok(id)
    }

    /// Look up a layer by name
    pub fn layer_by_name(&self, name: &str) -> Option<LayerId> {
        self.layer_names.get(name).copied()
    }

    /// Borrow a layer
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    /// Layers in dispatch order
    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layer_order
    }

    /// Borrow an entity record
    ///
    /// Entities whose destruction is pending (destroyed from inside their
    /// own hook) still resolve here with [`Entity::is_destroyed`] set.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Borrow a component record
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Layer an entity lives in; the entity's route back to its scene
    pub fn layer_of(&self, entity: EntityId) -> Option<&Layer> {
        let entity = self.live_entity(entity).ok()?;
        self.layers.get(entity.layer())
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.values().filter(|e| !e.is_destroyed()).count()
    }

    /// Number of live components, attached or not
    pub fn component_count(&self) -> usize {
        self.components.values().filter(|c| !c.is_destroyed()).count()
    }

    /// Iterate over live entities
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().filter(|(_, e)| !e.is_destroyed())
    }

    /// Find the first live entity with a tag
    pub fn find_entity(&self, tag: &str) -> Option<EntityId> {
        self.entities().find(|(_, e)| e.tag() == tag).map(|(id, _)| id)
    }

    pub(crate) fn live_entity(&self, id: EntityId) -> Result<&Entity, SceneError> {
        match self.entities.get(id) {
            Some(entity) if !entity.is_destroyed() => Ok(entity),
            _ => Err(SceneError::EntityDestroyed(id)),
        }
    }

    pub(crate) fn live_entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, SceneError> {
        match self.entities.get_mut(id) {
            Some(entity) if !entity.is_destroyed() => Ok(entity),
            _ => Err(SceneError::EntityDestroyed(id)),
        }
    }

    pub(crate) fn live_component(&self, id: ComponentId) -> Result<&Component, SceneError> {
        match self.components.get(id) {
            Some(component) if !component.is_destroyed() => Ok(component),
            _ => Err(SceneError::UnknownComponent(id)),
        }
    }

    pub(crate) fn live_component_mut(&mut self, id: ComponentId) -> Result<&mut Component, SceneError> {
        match self.components.get_mut(id) {
            Some(component) if !component.is_destroyed() => Ok(component),
            _ => Err(SceneError::UnknownComponent(id)),
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("layers", &self.layer_order.len())
            .field("entities", &self.entities.len())
            .field("components", &self.components.len())
            .finish()
    }
}
