//! # Layer Engine
//!
//! A layered entity/component scene graph with a depth-sorted frame loop.
//!
//! ## Features
//!
//! - **Layers**: Named dispatch and draw-ordering units, run in creation order
//! - **Entities & Components**: Tagged components attached to entities, with
//!   type- and tag-based lookup
//! - **Frame Passes**: FixedUpdate, Update and Draw, components before entities
//! - **Depth Sorting**: Cached draw order, rebuilt lazily when something moves
//! - **Safe Mutation**: Callbacks may add, move or destroy anything mid-pass
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use layer_engine::prelude::*;
//!
//! struct Spin {
//!     angle: f32,
//! }
//!
//! impl Behavior for Spin {
//!     fn update(&mut self, ctx: &mut Context<'_>) {
//!         self.angle += ctx.delta();
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     let world = engine.scene().layer_by_name("world").unwrap();
//!
//!     let ship = engine.scene_mut().spawn(world, "ship")?;
//!     engine.scene_mut().attach(ship, "spin", Spin { angle: 0.0 })?;
//!
//!     engine.frame(1.0 / 60.0, &mut NullRenderer)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod foundation;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineError, FrameStats};
pub use error::SceneError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, EngineConfig},
        ecs::{Behavior, Component, ComponentId, Context, Entity, EntityId, ObjectFlags},
        foundation::time::{FixedStep, Timer},
        scene::{Layer, LayerId, NullRenderer, Pass, Renderer, Scene},
        Engine, EngineError, FrameStats, SceneError,
    };
}
