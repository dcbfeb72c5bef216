//! Layer registries and draw ordering
//!
//! A layer is the authoritative list of what lives in it. Entities and
//! components are added and removed here only by the scene's attach/detach
//! primitives, never directly.
//!
//! ## Draw order
//!
//! Draw order is descending by owning entity depth: higher depths draw
//! first, so lower depths end up on top. Ties keep insertion order into the
//! layer. The order is cached and rebuilt lazily at the start of a draw pass
//! when the dirty flag is set, at most once per pass.

use std::cmp::Reverse;

use super::Pass;
use crate::ecs::{ComponentId, EntityId};
use crate::foundation::collections::Registry;

slotmap::new_key_type! {
    /// Layer identifier
    pub struct LayerId;
}

/// Per-layer dispatch counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerStats {
    /// Number of draw-order rebuilds since the layer was created
    pub draw_rebuilds: u64,
    /// Number of passes run since the layer was created
    pub passes: u64,
    /// Component hooks invoked by the most recent pass
    pub last_component_calls: usize,
    /// Entity hooks invoked by the most recent pass
    pub last_entity_calls: usize,
    /// Draw hooks invoked by the most recent draw pass
    pub last_draw_calls: usize,
}

/// Registry and draw-ordering unit
#[derive(Debug)]
pub struct Layer {
    name: String,
    entities: Registry<EntityId>,
    components: Registry<ComponentId>,

    draw_components: Vec<ComponentId>,
    draw_entities: Vec<EntityId>,
    dirty: bool,

    active_pass: Option<Pass>,
    // Members stamped at or past these joined after the running pass began
    entity_cutoff: u64,
    component_cutoff: u64,
    // Reused between passes so snapshots do not allocate every frame
    scratch_components: Vec<ComponentId>,
    scratch_entities: Vec<EntityId>,

    stats: LayerStats,
}

impl Layer {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            entities: Registry::new(),
            components: Registry::new(),
            draw_components: Vec::new(),
            draw_entities: Vec::new(),
            dirty: false,
            active_pass: None,
            entity_cutoff: 0,
            component_cutoff: 0,
            scratch_components: Vec::new(),
            scratch_entities: Vec::new(),
            stats: LayerStats::default(),
        }
    }

    /// Layer name, unique within its scene
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entities placed in this layer, in registry order
    pub fn entities(&self) -> &[EntityId] {
        self.entities.as_slice()
    }

    /// Components placed in this layer, in registry order
    pub fn components(&self) -> &[ComponentId] {
        self.components.as_slice()
    }

    /// Number of entities in the layer
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of components in the layer
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Check entity membership
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Check component membership
    pub fn contains_component(&self, component: ComponentId) -> bool {
        self.components.contains(component)
    }

    /// Whether the cached draw order is stale
    pub fn is_draw_dirty(&self) -> bool {
        self.dirty
    }

    /// Component draw order from the last rebuild
    ///
    /// May be stale while [`Layer::is_draw_dirty`] is set.
    pub fn draw_order(&self) -> &[ComponentId] {
        &self.draw_components
    }

    /// Entity draw order from the last rebuild
    pub fn entity_draw_order(&self) -> &[EntityId] {
        &self.draw_entities
    }

    /// Pass currently running on this layer
    pub fn active_pass(&self) -> Option<Pass> {
        self.active_pass
    }

    /// Dispatch counters
    pub fn stats(&self) -> &LayerStats {
        &self.stats
    }

    pub(crate) fn add_entity(&mut self, entity: EntityId) {
        if self.entities.insert(entity) {
            self.dirty = true;
        }
    }

    pub(crate) fn remove_entity(&mut self, entity: EntityId) {
        if self.entities.remove(entity) {
            self.dirty = true;
        }
    }

    pub(crate) fn add_component(&mut self, component: ComponentId) {
        if self.components.insert(component) {
            self.dirty = true;
        }
    }

    pub(crate) fn remove_component(&mut self, component: ComponentId) {
        if self.components.remove(component) {
            self.dirty = true;
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Re-sort the draw caches if they are stale
    ///
    /// Returns `true` when a rebuild happened.
    pub(crate) fn rebuild_draw_order(
        &mut self,
        component_depth: impl Fn(ComponentId) -> i32,
        entity_depth: impl Fn(EntityId) -> i32,
    ) -> bool {
        if !self.dirty {
            return false;
        }

        self.components.snapshot_into(&mut self.draw_components);
        self.entities.snapshot_into(&mut self.draw_entities);

        // Registry order is shuffled by removals; ties fall back to insertion
        let (components, entities) = (&self.components, &self.entities);
        self.draw_components
            .sort_by_key(|&c| (Reverse(component_depth(c)), components.sequence(c)));
        self.draw_entities
            .sort_by_key(|&e| (Reverse(entity_depth(e)), entities.sequence(e)));

        self.dirty = false;
        self.stats.draw_rebuilds += 1;
        log::trace!(
            "Layer '{}' rebuilt draw order ({} components, {} entities)",
            self.name,
            self.draw_components.len(),
            self.draw_entities.len()
        );
        true
    }

    /// Mark a pass as running and hand out the member snapshots for it
    ///
    /// Draw passes walk the cached draw order; the other passes walk a copy
    /// of the registries.
    pub(crate) fn begin_pass(&mut self, pass: Pass) -> (Vec<ComponentId>, Vec<EntityId>) {
        self.active_pass = Some(pass);
        self.entity_cutoff = self.entities.next_sequence();
        self.component_cutoff = self.components.next_sequence();
        self.stats.passes += 1;

        let mut components = std::mem::take(&mut self.scratch_components);
        let mut entities = std::mem::take(&mut self.scratch_entities);
        if pass == Pass::Draw {
            components.clear();
            components.extend_from_slice(&self.draw_components);
            entities.clear();
            entities.extend_from_slice(&self.draw_entities);
        } else {
            self.components.snapshot_into(&mut components);
            self.entities.snapshot_into(&mut entities);
        }
        (components, entities)
    }

    /// Whether an entity is registered and was already here when the running
    /// pass began
    pub(crate) fn entity_in_pass(&self, entity: EntityId) -> bool {
        self.entities.sequence(entity).is_some_and(|seq| seq < self.entity_cutoff)
    }

    /// Component counterpart of [`Layer::entity_in_pass`]
    pub(crate) fn component_in_pass(&self, component: ComponentId) -> bool {
        self.components
            .sequence(component)
            .is_some_and(|seq| seq < self.component_cutoff)
    }

    /// Return the snapshot buffers and record what the pass did
    pub(crate) fn end_pass(
        &mut self,
        pass: Pass,
        snapshot: (Vec<ComponentId>, Vec<EntityId>),
        component_calls: usize,
        entity_calls: usize,
    ) {
        self.scratch_components = snapshot.0;
        self.scratch_entities = snapshot.1;
        self.active_pass = None;

        self.stats.last_component_calls = component_calls;
        self.stats.last_entity_calls = entity_calls;
        if pass == Pass::Draw {
            self.stats.last_draw_calls = component_calls + entity_calls;
        }
    }
}
