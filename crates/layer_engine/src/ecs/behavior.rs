//! Behavior trait and callback context

use std::any::Any;

use super::{ComponentId, EntityId};
use crate::error::SceneError;
use crate::scene::{Renderer, Scene};

/// Upcast helper so trait objects can be downcast to their concrete type
pub trait AsAny {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle hooks for entities and components
///
/// Every hook is a no-op by default. While a hook runs, its behavior is
/// checked out of the scene, so the hook may freely add, remove or destroy
/// anything through [`Context::scene_mut`], including the object it is
/// running on.
pub trait Behavior: AsAny + 'static {
    /// Called zero or more times per frame with the fixed timestep
    fn fixed_update(&mut self, _ctx: &mut Context<'_>) {}

    /// Called once per frame with the variable frame time
    fn update(&mut self, _ctx: &mut Context<'_>) {}

    /// Called once per frame, in depth order, for visible objects
    fn draw(&mut self, _ctx: &mut Context<'_>, _renderer: &mut dyn Renderer) {}

    /// Called once when the object is destroyed
    fn on_destroy(&mut self, _ctx: &mut Context<'_>) {}
}

/// Behavior of entities that carry no logic of their own
impl Behavior for () {}

impl dyn Behavior {
    /// Downcast to a concrete behavior type
    pub fn downcast_ref<T: Behavior>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete behavior type
    pub fn downcast_mut<T: Behavior>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// State handed to every hook
pub struct Context<'a> {
    scene: &'a mut Scene,
    entity: Option<EntityId>,
    component: Option<ComponentId>,
    delta: f32,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        scene: &'a mut Scene,
        entity: Option<EntityId>,
        component: Option<ComponentId>,
        delta: f32,
    ) -> Self {
        Self {
            scene,
            entity,
            component,
            delta,
        }
    }

    /// Scene the callback runs in
    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    /// Mutable access for structural changes
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }

    /// Elapsed time for this step in seconds; zero for draw and destroy hooks
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Entity the callback runs for
    ///
    /// For component hooks this is the owner at the time the hook started,
    /// even if the component was detached since. See [`Context::owner`].
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// Component the callback runs for, `None` inside entity hooks
    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }

    /// Current owner of the running component, or the running entity
    pub fn owner(&self) -> Option<EntityId> {
        match self.component {
            Some(component) => self.scene.component(component).and_then(|c| c.owner()),
            None => self.entity,
        }
    }

    /// Destroy the object whose hook is running
    ///
    /// Registries are updated immediately; `on_destroy` runs once the
    /// current hook returns.
    pub fn destroy_self(&mut self) -> Result<(), SceneError> {
        match (self.component, self.entity) {
            (Some(component), _) => self.scene.destroy_component(component),
            (None, Some(entity)) => self.scene.destroy_entity(entity),
            (None, None) => Ok(()),
        }
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("scene", &self.scene.name())
            .field("entity", &self.entity)
            .field("component", &self.component)
            .field("delta", &self.delta)
            .finish()
    }
}
