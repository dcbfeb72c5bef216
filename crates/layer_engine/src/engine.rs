//! Core engine implementation
//!
//! The engine is a reference frame driver: it owns the scene and turns
//! variable frame times into fixed updates, one update and one draw.

use thiserror::Error;

use crate::config::{Config, ConfigError, EngineConfig};
use crate::error::SceneError;
use crate::foundation::time::FixedStep;
use crate::scene::{Renderer, Scene};

/// Main engine struct
#[derive(Debug)]
pub struct Engine {
    scene: Scene,
    clock: FixedStep,
    config: EngineConfig,
    frame: u64,
}

/// What a single call to [`Engine::frame`] did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Zero-based frame index
    pub frame: u64,
    /// Fixed updates run this frame
    pub fixed_steps: u32,
    /// Time discarded by the fixed step cap, in seconds
    pub dropped_time: f32,
    /// Interpolation factor between the last two fixed steps
    pub alpha: f32,
    /// Draw hooks invoked across all layers
    pub draw_calls: usize,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        let mut scene = Scene::new(config.scene_name.clone());
        for name in &config.layers {
            scene.add_layer(name.clone())?;
        }
        let clock = FixedStep::new(config.fixed_timestep, config.max_fixed_steps);

        log::info!(
            "Scene '{}' ready: {} layers, fixed step {:.4}s",
            scene.name(),
            config.layers.len(),
            config.fixed_timestep
        );
        Ok(Self {
            scene,
            clock,
            config,
            frame: 0,
        })
    }

    /// Create an engine from a `.toml` or `.ron` config file
    pub fn from_file(path: &str) -> Result<Self, EngineError> {
        Self::new(EngineConfig::load_from_file(path)?)
    }

    /// Scene being driven
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene, for setup between frames
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Run one frame
    ///
    /// `elapsed` is the wall time since the previous frame in seconds.
    /// Fixed updates receive the configured step, the update pass receives
    /// `elapsed` itself.
    pub fn frame(&mut self, elapsed: f32, renderer: &mut dyn Renderer) -> Result<FrameStats, EngineError> {
        let plan = self.clock.advance(elapsed);
        if plan.dropped > 0.0 {
            log::warn!(
                "Frame {} fell behind; dropped {:.3}s of fixed updates",
                self.frame,
                plan.dropped
            );
        }

        let step = self.clock.step();
        for _ in 0..plan.steps {
            self.scene.fixed_update(step)?;
        }
        self.scene.update(elapsed.max(0.0))?;
        self.scene.draw(renderer)?;

        let draw_calls = self
            .scene
            .layer_ids()
            .iter()
            .filter_map(|&id| self.scene.layer(id))
            .map(|layer| layer.stats().last_draw_calls)
            .sum();

        let stats = FrameStats {
            frame: self.frame,
            fixed_steps: plan.steps,
            dropped_time: plan.dropped,
            alpha: plan.alpha,
            draw_calls,
        };
        self.frame += 1;
        Ok(stats)
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A scene operation failed while driving a frame
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Behavior, Context};
    use crate::foundation::logging;
    use crate::scene::NullRenderer;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Counter {
        fixed: u32,
        updates: u32,
        draws: u32,
        last_fixed_delta: f32,
    }

    impl Behavior for Counter {
        fn fixed_update(&mut self, ctx: &mut Context<'_>) {
            self.fixed += 1;
            self.last_fixed_delta = ctx.delta();
        }

        fn update(&mut self, _ctx: &mut Context<'_>) {
            self.updates += 1;
        }

        fn draw(&mut self, _ctx: &mut Context<'_>, _renderer: &mut dyn Renderer) {
            self.draws += 1;
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            fixed_timestep: 0.125,
            max_fixed_steps: 5,
            layers: vec!["world".into(), "hud".into()],
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_engine_creates_configured_layers() {
        logging::init_for_tests();
        let engine = Engine::new(config()).unwrap();
        let names: Vec<_> = engine
            .scene()
            .layer_ids()
            .iter()
            .map(|&id| engine.scene().layer(id).unwrap().name())
            .collect();
        assert_eq!(names, vec!["world", "hud"]);
        assert_eq!(engine.scene().name(), "main");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            max_fixed_steps: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(EngineError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_frame_runs_fixed_steps_then_update_and_draw() {
        logging::init_for_tests();
        let mut engine = Engine::new(config()).unwrap();
        let world = engine.scene().layer_by_name("world").unwrap();
        let entity = engine.scene_mut().spawn_with(world, "counter", Counter::default()).unwrap();

        let stats = engine.frame(0.3125, &mut NullRenderer).unwrap();
        assert_eq!(stats.frame, 0);
        assert_eq!(stats.fixed_steps, 2);
        assert_eq!(stats.draw_calls, 1);
        assert_relative_eq!(stats.alpha, 0.5, epsilon = 1e-4);

        let counter = engine.scene().entity_behavior::<Counter>(entity).unwrap();
        assert_eq!((counter.fixed, counter.updates, counter.draws), (2, 1, 1));
        assert_relative_eq!(counter.last_fixed_delta, 0.125);

        // The leftover half step carries into the next frame
        let stats = engine.frame(0.0625, &mut NullRenderer).unwrap();
        assert_eq!(stats.frame, 1);
        assert_eq!(stats.fixed_steps, 1);
        assert_eq!(engine.frame_count(), 2);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        logging::init_for_tests();
        let mut engine = Engine::new(config()).unwrap();
        let stats = engine.frame(1.0, &mut NullRenderer).unwrap();
        assert_eq!(stats.fixed_steps, 5);
        assert_relative_eq!(stats.dropped_time, 0.375, epsilon = 1e-4);
        assert_eq!(stats.draw_calls, 0);
    }

    #[test]
    fn test_engine_from_file() {
        let path = std::env::temp_dir().join(format!("layer_engine_{}.toml", std::process::id()));
        std::fs::write(&path, "scene_name = \"arena\"\nlayers = [\"back\", \"front\"]\n").unwrap();

        let engine = Engine::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(engine.scene().name(), "arena");
        assert!(engine.scene().layer_by_name("front").is_some());
        assert_relative_eq!(engine.config().fixed_timestep, 1.0 / 60.0);
    }
}
