//! Per-frame dispatch
//!
//! Each pass walks a snapshot of the layer taken when the pass starts:
//! components first, then entities. Draw passes walk the cached depth order
//! instead of the raw registries. Before every callback the member is
//! checked against the live registry, so anything removed or destroyed
//! earlier in the same pass is skipped, and anything added (or re-added)
//! during the pass waits for the next one.
//!
//! Every pass also carries a serial stamped on each member it reaches. A
//! scene-wide pass shares one serial across its layers, so a member that
//! moves to a later layer after its turn is not visited a second time.

use crate::ecs::{Behavior, Component, ComponentId, Context, Entity, EntityId, ObjectFlags};
use crate::error::SceneError;

use super::{LayerId, NullRenderer, Renderer, Scene};

/// The three per-frame passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Fixed timestep update, zero or more times per frame
    FixedUpdate,
    /// Variable timestep update, once per frame
    Update,
    /// Depth-ordered draw, once per frame
    Draw,
}

impl Pass {
    /// Flag a member needs to receive this pass
    fn gate(self) -> ObjectFlags {
        match self {
            Self::FixedUpdate | Self::Update => ObjectFlags::ENABLED,
            Self::Draw => ObjectFlags::VISIBLE,
        }
    }

    fn invoke(self, behavior: &mut dyn Behavior, ctx: &mut Context<'_>, renderer: &mut dyn Renderer) {
        match self {
            Self::FixedUpdate => behavior.fixed_update(ctx),
            Self::Update => behavior.update(ctx),
            Self::Draw => behavior.draw(ctx, renderer),
        }
    }
}

impl Scene {
    /// Run a fixed update on every layer, in layer order
    pub fn fixed_update(&mut self, delta: f32) -> Result<(), SceneError> {
        self.run_all(Pass::FixedUpdate, delta, &mut NullRenderer)
    }

    /// Run a variable update on every layer, in layer order
    pub fn update(&mut self, delta: f32) -> Result<(), SceneError> {
        self.run_all(Pass::Update, delta, &mut NullRenderer)
    }

    /// Draw every layer, in layer order
    pub fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        self.run_all(Pass::Draw, 0.0, renderer)
    }

    /// Run a fixed update on a single layer
    pub fn run_fixed_update(&mut self, layer: LayerId, delta: f32) -> Result<(), SceneError> {
        self.run_pass(layer, Pass::FixedUpdate, delta, &mut NullRenderer)
    }

    /// Run a variable update on a single layer
    pub fn run_update(&mut self, layer: LayerId, delta: f32) -> Result<(), SceneError> {
        self.run_pass(layer, Pass::Update, delta, &mut NullRenderer)
    }

    /// Draw a single layer
    pub fn run_draw(&mut self, layer: LayerId, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        self.run_pass(layer, Pass::Draw, 0.0, renderer)
    }

    /// Re-sort a layer's draw order if it is stale
    ///
    /// Draw passes do this on their own; calling it directly is only useful
    /// to inspect [`super::Layer::draw_order`] between frames.
    pub fn rebuild_draw_order(&mut self, layer: LayerId) -> bool {
        let Self {
            layers,
            entities,
            components,
            ..
        } = self;
        let Some(layer) = layers.get_mut(layer) else {
            return false;
        };

        let entity_depth = |e: EntityId| entities.get(e).map_or(0, Entity::depth);
        layer.rebuild_draw_order(
            |c| components.get(c).and_then(Component::owner).map_or(0, entity_depth),
            entity_depth,
        )
    }

    fn next_serial(&mut self) -> u64 {
        self.pass_serial += 1;
        self.pass_serial
    }

    fn run_all(&mut self, pass: Pass, delta: f32, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        let serial = self.next_serial();
        // Layers are append-only; ones added mid-pass wait for the next frame
        let count = self.layer_order.len();
        for index in 0..count {
            let layer = self.layer_order[index];
            self.run_layer(layer, pass, serial, delta, renderer)?;
        }
        Ok(())
    }

    fn run_pass(
        &mut self,
        layer: LayerId,
        pass: Pass,
        delta: f32,
        renderer: &mut dyn Renderer,
    ) -> Result<(), SceneError> {
        let serial = self.next_serial();
        self.run_layer(layer, pass, serial, delta, renderer)
    }

    fn run_layer(
        &mut self,
        layer_id: LayerId,
        pass: Pass,
        serial: u64,
        delta: f32,
        renderer: &mut dyn Renderer,
    ) -> Result<(), SceneError> {
        let layer = self.layers.get(layer_id).ok_or(SceneError::UnknownLayer(layer_id))?;
        if let Some(active) = layer.active_pass() {
            log::error!("Layer '{}' re-entered {:?} while running {:?}", layer.name(), pass, active);
            return Err(SceneError::ReentrantPass {
                layer: layer.name().to_string(),
                active,
                requested: pass,
            });
        }

        if pass == Pass::Draw {
            self.rebuild_draw_order(layer_id);
        }

        let layer = &mut self.layers[layer_id];
        log::trace!("Layer '{}' {:?} pass", layer.name(), pass);
        let snapshot = layer.begin_pass(pass);
        if pass == Pass::Draw {
            renderer.begin_layer(layer.name());
        }

        let mut component_calls = 0;
        for &component in &snapshot.0 {
            if self.dispatch_component(layer_id, component, pass, serial, delta, renderer) {
                component_calls += 1;
            }
        }

        let mut entity_calls = 0;
        for &entity in &snapshot.1 {
            if self.dispatch_entity(layer_id, entity, pass, serial, delta, renderer) {
                entity_calls += 1;
            }
        }

        let layer = &mut self.layers[layer_id];
        if pass == Pass::Draw {
            renderer.end_layer(layer.name());
        }
        layer.end_pass(pass, snapshot, component_calls, entity_calls);
        Ok(())
    }

    /// Returns `true` if a hook was invoked
    fn dispatch_component(
        &mut self,
        layer: LayerId,
        component: ComponentId,
        pass: Pass,
        serial: u64,
        delta: f32,
        renderer: &mut dyn Renderer,
    ) -> bool {
        // Skips members removed, moved away or re-added earlier in this pass
        if !self.layers[layer].component_in_pass(component) {
            return false;
        }
        let Some(record) = self.components.get_mut(component) else {
            return false;
        };
        if record.is_destroyed() || record.visited == serial || !record.flags.contains(pass.gate()) {
            return false;
        }
        // Already checked out further up the stack
        let Some(mut behavior) = record.behavior.take() else {
            return false;
        };
        record.visited = serial;
        let owner = record.owner();

        pass.invoke(
            &mut *behavior,
            &mut Context::new(self, owner, Some(component), delta),
            renderer,
        );
        self.restore_component(component, behavior, owner);
        true
    }

    /// Returns `true` if a hook was invoked
    fn dispatch_entity(
        &mut self,
        layer: LayerId,
        entity: EntityId,
        pass: Pass,
        serial: u64,
        delta: f32,
        renderer: &mut dyn Renderer,
    ) -> bool {
        if !self.layers[layer].entity_in_pass(entity) {
            return false;
        }
        let Some(record) = self.entities.get_mut(entity) else {
            return false;
        };
        if record.is_destroyed() || record.visited == serial || !record.flags.contains(pass.gate()) {
            return false;
        }
        let Some(mut behavior) = record.behavior.take() else {
            return false;
        };
        record.visited = serial;

        pass.invoke(&mut *behavior, &mut Context::new(self, Some(entity), None, delta), renderer);
        self.restore_entity(entity, behavior);
        true
    }

    /// Put a behavior back, finishing a destruction requested mid-hook
    fn restore_component(&mut self, component: ComponentId, mut behavior: Box<dyn Behavior>, owner: Option<EntityId>) {
        let Some(record) = self.components.get_mut(component) else {
            return;
        };
        if record.is_destroyed() {
            behavior.on_destroy(&mut Context::new(self, owner, Some(component), 0.0));
            self.components.remove(component);
        } else {
            record.behavior = Some(behavior);
        }
    }

    fn restore_entity(&mut self, entity: EntityId, mut behavior: Box<dyn Behavior>) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        if record.is_destroyed() {
            behavior.on_destroy(&mut Context::new(self, Some(entity), None, 0.0));
            self.entities.remove(entity);
        } else {
            record.behavior = Some(behavior);
        }
    }
}
