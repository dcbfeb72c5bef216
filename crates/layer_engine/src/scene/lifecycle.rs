//! Entity and component lifecycle
//!
//! Every relationship change funnels through two primitives, `link` and
//! `unlink`, which update the owning entity's map, the
//! component's owner and the layer registry together. Nothing else writes
//! those three, so they cannot drift apart.

use crate::ecs::{Behavior, Component, ComponentId, Context, Entity, EntityId, ObjectFlags};
use crate::error::SceneError;

use super::{LayerId, Scene};

impl Scene {
    /// Spawn an entity with no behavior of its own
    pub fn spawn(&mut self, layer: LayerId, tag: impl Into<String>) -> Result<EntityId, SceneError> {
        self.spawn_with(layer, tag, ())
    }

    /// Spawn an entity driven by `behavior`, registered in `layer` immediately
    pub fn spawn_with<B: Behavior>(
        &mut self,
        layer: LayerId,
        tag: impl Into<String>,
        behavior: B,
    ) -> Result<EntityId, SceneError> {
        if !self.layers.contains_key(layer) {
            return Err(SceneError::UnknownLayer(layer));
        }

        let tag = tag.into();
        log::debug!("Spawning entity '{}' in layer '{}'", tag, self.layers[layer].name());
        let id = self.entities.insert(Entity::new(tag, layer, Box::new(behavior)));
        self.layers[layer].add_entity(id);
        Ok(id)
    }

    /// Create a detached component
    pub fn create_component<B: Behavior>(&mut self, tag: impl Into<String>, behavior: B) -> ComponentId {
        self.components.insert(Component::new(tag.into(), behavior))
    }

    /// Create a component and attach it in one step
    ///
    /// On failure the new component is discarded without running its
    /// `on_destroy` hook, since it never went live.
    pub fn attach<B: Behavior>(
        &mut self,
        entity: EntityId,
        tag: impl Into<String>,
        behavior: B,
    ) -> Result<ComponentId, SceneError> {
        let component = self.create_component(tag, behavior);
        if let Err(err) = self.add_component(entity, component) {
            self.components.remove(component);
            return Err(err);
        }
        Ok(component)
    }

    /// Attach a detached component to an entity
    pub fn add_component(&mut self, entity: EntityId, component: ComponentId) -> Result<(), SceneError> {
        let target = self.live_entity(entity)?;
        let record = self.live_component(component)?;

        if let Some(owner) = record.owner() {
            return Err(SceneError::ComponentAttached { component, owner });
        }
        if target.has_component(record.tag()) {
            log::warn!("Entity '{}' already has a component tagged '{}'", target.tag(), record.tag());
            return Err(SceneError::DuplicateTag {
                entity,
                tag: record.tag().to_string(),
            });
        }

        self.link(entity, component);
        Ok(())
    }

    /// First attached component of type `T`
    ///
    /// Use this when the component is mandatory; a miss is reported as
    /// [`SceneError::MissingComponent`]. For optional lookups see
    /// [`Scene::find_component`].
    pub fn get_component<T: Behavior>(&self, entity: EntityId) -> Result<&T, SceneError> {
        let id = self.component_of_type::<T>(entity)?;
        self.components[id]
            .behavior
            .as_deref()
            .and_then(|b| b.downcast_ref::<T>())
            .ok_or(SceneError::ComponentBusy(id))
    }

    /// Mutable variant of [`Scene::get_component`]
    pub fn get_component_mut<T: Behavior>(&mut self, entity: EntityId) -> Result<&mut T, SceneError> {
        let id = self.component_of_type::<T>(entity)?;
        self.components[id]
            .behavior
            .as_deref_mut()
            .and_then(|b| b.downcast_mut::<T>())
            .ok_or(SceneError::ComponentBusy(id))
    }

    /// Id of the first attached component of type `T`
    ///
    /// Resolves even while that component's hook is running.
    pub fn component_of_type<T: Behavior>(&self, entity: EntityId) -> Result<ComponentId, SceneError> {
        match self.find_component::<T>(entity) {
            Some(id) => Ok(id),
            None => {
                self.live_entity(entity)?;
                let type_name = std::any::type_name::<T>();
                log::error!("Entity {:?} is missing required component `{}`", entity, type_name);
                Err(SceneError::MissingComponent { entity, type_name })
            }
        }
    }

    /// Optional variant of [`Scene::component_of_type`]
    pub fn find_component<T: Behavior>(&self, entity: EntityId) -> Option<ComponentId> {
        let entity = self.live_entity(entity).ok()?;
        entity
            .components()
            .iter()
            .copied()
            .find(|&id| self.components[id].is::<T>())
    }

    /// Component attached under `tag`; a miss is an error
    pub fn component_by_tag(&self, entity: EntityId, tag: &str) -> Result<ComponentId, SceneError> {
        self.live_entity(entity)?
            .component_id(tag)
            .ok_or_else(|| SceneError::MissingTag {
                entity,
                tag: tag.to_string(),
            })
    }

    /// Check for a tag; never fails
    pub fn has_component(&self, entity: EntityId, tag: &str) -> bool {
        self.live_entity(entity).is_ok_and(|e| e.has_component(tag))
    }

    /// Borrow a component's behavior as its concrete type
    pub fn behavior<T: Behavior>(&self, component: ComponentId) -> Option<&T> {
        self.components.get(component)?.behavior.as_deref()?.downcast_ref::<T>()
    }

    /// Mutably borrow a component's behavior as its concrete type
    pub fn behavior_mut<T: Behavior>(&mut self, component: ComponentId) -> Option<&mut T> {
        self.components.get_mut(component)?.behavior.as_deref_mut()?.downcast_mut::<T>()
    }

    /// Borrow an entity's own behavior as its concrete type
    pub fn entity_behavior<T: Behavior>(&self, entity: EntityId) -> Option<&T> {
        self.entities.get(entity)?.behavior.as_deref()?.downcast_ref::<T>()
    }

    /// Mutably borrow an entity's own behavior as its concrete type
    pub fn entity_behavior_mut<T: Behavior>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entities.get_mut(entity)?.behavior.as_deref_mut()?.downcast_mut::<T>()
    }

    /// Detach the component tagged `tag`
    ///
    /// Returns `Ok(None)` when no such tag is attached. The detached
    /// component stays alive and can be attached again.
    pub fn remove_component(&mut self, entity: EntityId, tag: &str) -> Result<Option<ComponentId>, SceneError> {
        let Some(component) = self.live_entity(entity)?.component_id(tag) else {
            return Ok(None);
        };
        self.unlink(component);
        Ok(Some(component))
    }

    /// Detach every component, clearing each owner
    pub fn remove_all_components(&mut self, entity: EntityId) -> Result<Vec<ComponentId>, SceneError> {
        let detached = self.live_entity(entity)?.components().to_vec();
        for &component in &detached {
            self.unlink(component);
        }
        Ok(detached)
    }

    /// Destroy a component, detaching it first if needed
    ///
    /// If the component's own hook is running, `on_destroy` is deferred
    /// until that hook returns.
    pub fn destroy_component(&mut self, component: ComponentId) -> Result<(), SceneError> {
        let owner = self.live_component(component)?.owner();
        self.unlink(component);
        self.finish_component(component, owner);
        Ok(())
    }

    /// Move an entity and all its components to another layer
    pub fn set_entity_layer(&mut self, entity: EntityId, layer: LayerId) -> Result<(), SceneError> {
        if !self.layers.contains_key(layer) {
            return Err(SceneError::UnknownLayer(layer));
        }
        let record = self.live_entity_mut(entity)?;
        let old = record.layer();
        if old == layer {
            return Ok(());
        }
        record.set_layer(layer);

        let Self { layers, entities, .. } = self;
        let components = entities[entity].components();

        if let Some(from) = layers.get_mut(old) {
            from.remove_entity(entity);
            for &component in components {
                from.remove_component(component);
            }
        }
        let to = &mut layers[layer];
        to.add_entity(entity);
        for &component in components {
            to.add_component(component);
        }

        log::debug!(
            "Moved entity '{}' from layer '{}' to '{}'",
            entities[entity].tag(),
            layers.get(old).map_or("?", |l| l.name()),
            layers[layer].name()
        );
        Ok(())
    }

    /// Set an entity's draw depth
    ///
    /// Writing the current value again leaves the draw cache untouched.
    pub fn set_depth(&mut self, entity: EntityId, depth: i32) -> Result<(), SceneError> {
        let record = self.live_entity_mut(entity)?;
        if record.set_depth(depth) {
            let layer = record.layer();
            if let Some(layer) = self.layers.get_mut(layer) {
                layer.mark_dirty();
            }
        }
        Ok(())
    }

    /// Enable or disable an entity's update hooks
    pub fn set_entity_enabled(&mut self, entity: EntityId, enabled: bool) -> Result<(), SceneError> {
        self.live_entity_mut(entity)?.flags.set(ObjectFlags::ENABLED, enabled);
        Ok(())
    }

    /// Show or hide an entity's draw hook
    pub fn set_entity_visible(&mut self, entity: EntityId, visible: bool) -> Result<(), SceneError> {
        self.live_entity_mut(entity)?.flags.set(ObjectFlags::VISIBLE, visible);
        Ok(())
    }

    /// Enable or disable a component's update hooks
    pub fn set_component_enabled(&mut self, component: ComponentId, enabled: bool) -> Result<(), SceneError> {
        self.live_component_mut(component)?.flags.set(ObjectFlags::ENABLED, enabled);
        Ok(())
    }

    /// Show or hide a component's draw hook
    pub fn set_component_visible(&mut self, component: ComponentId, visible: bool) -> Result<(), SceneError> {
        self.live_component_mut(component)?.flags.set(ObjectFlags::VISIBLE, visible);
        Ok(())
    }

    /// Destroy an entity together with all of its components
    ///
    /// The entity and its components leave every registry before any
    /// `on_destroy` hook runs. Components are notified first, then the
    /// entity. Hooks that are mid-callback are notified when they return.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<(), SceneError> {
        let record = match self.live_entity_mut(entity) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Ignoring destroy of dead entity {:?}", entity);
                return Err(err);
            }
        };
        record.flags.insert(ObjectFlags::DESTROYED);
        let layer = record.layer();
        let components = record.components().to_vec();
        log::debug!("Destroying entity '{}' ({} components)", record.tag(), components.len());

        for &component in &components {
            self.unlink(component);
        }
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.remove_entity(entity);
        }

        for component in components {
            self.finish_component(component, Some(entity));
        }
        self.finish_entity(entity);
        Ok(())
    }

    /// Attach primitive: entity map, owner and layer registry together
    fn link(&mut self, entity: EntityId, component: ComponentId) {
        let record = &mut self.components[component];
        record.set_owner(Some(entity));

        let owner = &mut self.entities[entity];
        owner.link(record.tag(), component);
        if let Some(layer) = self.layers.get_mut(owner.layer()) {
            layer.add_component(component);
        }
    }

    /// Detach primitive; a no-op for components that are not attached
    fn unlink(&mut self, component: ComponentId) {
        let Some(record) = self.components.get_mut(component) else {
            return;
        };
        let Some(entity) = record.owner() else {
            return;
        };
        record.set_owner(None);

        if let Some(owner) = self.entities.get_mut(entity) {
            owner.unlink(record.tag(), component);
            if let Some(layer) = self.layers.get_mut(owner.layer()) {
                layer.remove_component(component);
            }
        }
    }

    /// Run `on_destroy` for a detached component and free it
    pub(crate) fn finish_component(&mut self, component: ComponentId, owner: Option<EntityId>) {
        let Some(record) = self.components.get_mut(component) else {
            return;
        };
        record.flags.insert(ObjectFlags::DESTROYED);

        let Some(mut behavior) = record.behavior.take() else {
            log::warn!("Component '{}' destroyed during its own hook; deferring on_destroy", record.tag());
            return;
        };
        behavior.on_destroy(&mut Context::new(self, owner, Some(component), 0.0));
        self.components.remove(component);
    }

    /// Run `on_destroy` for an unregistered entity and free it
    pub(crate) fn finish_entity(&mut self, entity: EntityId) {
        let Some(record) = self.entities.get_mut(entity) else {
            return;
        };
        let Some(mut behavior) = record.behavior.take() else {
            log::warn!("Entity '{}' destroyed during its own hook; deferring on_destroy", record.tag());
            return;
        };
        behavior.on_destroy(&mut Context::new(self, Some(entity), None, 0.0));
        self.entities.remove(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bot;
    impl Behavior for Bot {}

    #[derive(Default)]
    struct Sprite {
        frames: u32,
    }
    impl Behavior for Sprite {}

    fn scene() -> (Scene, LayerId) {
        let mut scene = Scene::new("test");
        let layer = scene.add_layer("world").unwrap();
        (scene, layer)
    }

    #[test]
    fn test_spawn_registers_in_layer() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();

        assert!(scene.layer(layer).unwrap().contains_entity(entity));
        assert_eq!(scene.entity(entity).unwrap().layer(), layer);
        assert_eq!(scene.find_entity("player"), Some(entity));
    }

    #[test]
    fn test_add_component_links_both_registries() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        let sprite = scene.create_component("sprite", Sprite::default());
        assert_eq!(scene.component(sprite).unwrap().owner(), None);

        scene.add_component(entity, sprite).unwrap();

        assert_eq!(scene.component(sprite).unwrap().owner(), Some(entity));
        assert!(scene.layer(layer).unwrap().contains_component(sprite));
        assert_eq!(scene.component_by_tag(entity, "sprite"), Ok(sprite));
    }

    #[test]
    fn test_duplicate_tag_is_rejected() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        let first = scene.attach(entity, "sprite", Sprite::default()).unwrap();

        let result = scene.attach(entity, "sprite", Bot);
        assert!(matches!(result, Err(SceneError::DuplicateTag { .. })));

        // The first one stays in place and the rejected one is gone
        assert_eq!(scene.component_by_tag(entity, "sprite"), Ok(first));
        assert!(scene.find_component::<Bot>(entity).is_none());
        assert_eq!(scene.component_count(), 1);
    }

    #[test]
    fn test_add_attached_component_fails() {
        let (mut scene, layer) = scene();
        let a = scene.spawn(layer, "a").unwrap();
        let b = scene.spawn(layer, "b").unwrap();
        let sprite = scene.attach(a, "sprite", Sprite::default()).unwrap();

        assert_eq!(
            scene.add_component(b, sprite),
            Err(SceneError::ComponentAttached { component: sprite, owner: a })
        );
    }

    #[test]
    fn test_get_component_by_type() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        scene.attach(entity, "sprite", Sprite::default()).unwrap();

        scene.get_component_mut::<Sprite>(entity).unwrap().frames = 3;
        assert_eq!(scene.get_component::<Sprite>(entity).unwrap().frames, 3);
    }

    #[test]
    fn test_missing_component_is_an_error() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        scene.attach(entity, "sprite", Sprite::default()).unwrap();

        match scene.get_component::<Bot>(entity) {
            Err(SceneError::MissingComponent { entity: e, type_name }) => {
                assert_eq!(e, entity);
                assert!(type_name.ends_with("Bot"));
            }
            _ => panic!("expected MissingComponent"),
        }
        assert!(matches!(
            scene.component_by_tag(entity, "bot"),
            Err(SceneError::MissingTag { .. })
        ));
    }

    #[test]
    fn test_remove_unknown_tag_is_soft() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();

        assert_eq!(scene.remove_component(entity, "x"), Ok(None));
        assert!(!scene.has_component(entity, "x"));
    }

    #[test]
    fn test_remove_component_detaches() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        let sprite = scene.attach(entity, "sprite", Sprite::default()).unwrap();

        assert_eq!(scene.remove_component(entity, "sprite"), Ok(Some(sprite)));
        assert_eq!(scene.component(sprite).unwrap().owner(), None);
        assert!(!scene.layer(layer).unwrap().contains_component(sprite));
        assert!(scene.layer(layer).unwrap().is_draw_dirty());

        // Detached components can be reused
        let other = scene.spawn(layer, "other").unwrap();
        scene.add_component(other, sprite).unwrap();
        assert_eq!(scene.component(sprite).unwrap().owner(), Some(other));
    }

    #[test]
    fn test_remove_all_components_clears_owners() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        let a = scene.attach(entity, "sprite", Sprite::default()).unwrap();
        let b = scene.attach(entity, "bot", Bot).unwrap();

        let detached = scene.remove_all_components(entity).unwrap();
        assert_eq!(detached, vec![a, b]);
        for id in detached {
            assert_eq!(scene.component(id).unwrap().owner(), None);
            assert!(!scene.layer(layer).unwrap().contains_component(id));
        }
        assert!(scene.entity(entity).unwrap().components().is_empty());
    }

    #[test]
    fn test_depth_write_only_dirties_on_change() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        scene.set_depth(entity, 7).unwrap();
        scene.rebuild_draw_order(layer);
        assert!(!scene.layer(layer).unwrap().is_draw_dirty());

        scene.set_depth(entity, 7).unwrap();
        assert!(!scene.layer(layer).unwrap().is_draw_dirty());

        scene.set_depth(entity, 8).unwrap();
        assert!(scene.layer(layer).unwrap().is_draw_dirty());
    }

    #[test]
    fn test_layer_move_migrates_components() {
        let mut scene = Scene::new("test");
        let a = scene.add_layer("a").unwrap();
        let b = scene.add_layer("b").unwrap();
        let entity = scene.spawn(a, "player").unwrap();
        let sprite = scene.attach(entity, "sprite", Sprite::default()).unwrap();
        let bot = scene.attach(entity, "bot", Bot).unwrap();

        scene.set_entity_layer(entity, b).unwrap();

        let (la, lb) = (scene.layer(a).unwrap(), scene.layer(b).unwrap());
        assert!(!la.contains_entity(entity));
        assert!(lb.contains_entity(entity));
        for id in [sprite, bot] {
            assert!(!la.contains_component(id));
            assert!(lb.contains_component(id));
        }
        assert_eq!(la.component_count() + lb.component_count(), 2);
        assert_eq!(scene.entity(entity).unwrap().layer(), b);

        // Components attached after the move land in the new layer
        let late = scene.attach(entity, "late", Sprite::default()).unwrap();
        assert!(scene.layer(b).unwrap().contains_component(late));
        assert!(!scene.layer(a).unwrap().contains_component(late));
    }

    #[test]
    fn test_unknown_layer() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();

        let mut ids: slotmap::SlotMap<LayerId, ()> = slotmap::SlotMap::with_key();
        ids.insert(());
        let missing = ids.insert(());
        assert_eq!(scene.set_entity_layer(entity, missing), Err(SceneError::UnknownLayer(missing)));
        assert_eq!(scene.spawn(missing, "ghost").unwrap_err(), SceneError::UnknownLayer(missing));
    }

    #[test]
    fn test_destroy_entity_unregisters_everything() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        let sprite = scene.attach(entity, "sprite", Sprite::default()).unwrap();

        scene.destroy_entity(entity).unwrap();

        let l = scene.layer(layer).unwrap();
        assert!(!l.contains_entity(entity));
        assert!(!l.contains_component(sprite));
        assert!(scene.entity(entity).is_none());
        assert!(scene.component(sprite).is_none());
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn test_destroyed_entity_rejects_structural_ops() {
        let (mut scene, layer) = scene();
        let entity = scene.spawn(layer, "player").unwrap();
        scene.destroy_entity(entity).unwrap();

        let sprite = scene.create_component("sprite", Sprite::default());
        let destroyed = SceneError::EntityDestroyed(entity);
        assert_eq!(scene.add_component(entity, sprite), Err(destroyed.clone()));
        assert_eq!(scene.set_depth(entity, 1), Err(destroyed.clone()));
        assert_eq!(scene.set_entity_layer(entity, layer), Err(destroyed.clone()));
        assert_eq!(scene.remove_component(entity, "sprite"), Err(destroyed.clone()));
        assert_eq!(scene.destroy_entity(entity), Err(destroyed));
        assert!(!scene.has_component(entity, "sprite"));
        assert_eq!(scene.component(sprite).unwrap().owner(), None);
    }

    #[test]
    fn test_destroy_detached_component() {
        let (mut scene, _) = scene();
        let sprite = scene.create_component("sprite", Sprite::default());
        scene.destroy_component(sprite).unwrap();

        assert!(scene.component(sprite).is_none());
        assert_eq!(scene.destroy_component(sprite), Err(SceneError::UnknownComponent(sprite)));
    }
}
