//! Orbit demo application
//!
//! Drives a small two-layer scene through the engine's frame loop and
//! renders it as text: planets orbit a sun in the world layer, comets are
//! spawned and burn out mid-frame, and a spinner ticks away on the HUD.

use std::time::Duration;

use layer_engine::foundation::{logging, time::Timer};
use layer_engine::prelude::*;
use thiserror::Error;

const FRAMES: u64 = 240;
const REPORT_EVERY: u64 = 60;

#[derive(Error, Debug)]
enum AppError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("layer `{0}` is missing from the configuration")]
    MissingLayer(&'static str),
}

/// Collects one text line per draw call
#[derive(Default)]
struct TextRenderer {
    lines: Vec<String>,
    depth: usize,
}

impl TextRenderer {
    fn emit(&mut self, line: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), line));
    }

    fn flush(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl Renderer for TextRenderer {
    fn begin_layer(&mut self, layer: &str) {
        self.emit(format!("[{}]", layer));
        self.depth += 1;
    }

    fn end_layer(&mut self, _layer: &str) {
        self.depth = self.depth.saturating_sub(1);
    }
}

fn owner_tag<'a>(ctx: &'a Context<'_>) -> &'a str {
    ctx.entity()
        .and_then(|id| ctx.scene().entity(id))
        .map_or("?", Entity::tag)
}

/// Circular motion integrated on the fixed step
struct Orbit {
    radius: f32,
    speed: f32,
    angle: f32,
}

impl Behavior for Orbit {
    fn fixed_update(&mut self, ctx: &mut Context<'_>) {
        self.angle = (self.angle + self.speed * ctx.delta()) % std::f32::consts::TAU;
    }

    fn draw(&mut self, ctx: &mut Context<'_>, renderer: &mut dyn Renderer) {
        let (x, y) = (self.radius * self.angle.cos(), self.radius * self.angle.sin());
        let line = format!("{:<8} ({:>6.2}, {:>6.2})", owner_tag(ctx), x, y);
        if let Some(text) = renderer.downcast_mut::<TextRenderer>() {
            text.emit(line);
        }
    }
}

/// Burns out after `life` seconds and removes its own entity
struct Comet {
    life: f32,
}

impl Behavior for Comet {
    fn update(&mut self, ctx: &mut Context<'_>) {
        self.life -= ctx.delta();
        if self.life <= 0.0 {
            if let Err(err) = ctx.destroy_self() {
                log::warn!("Comet could not burn out: {}", err);
            }
        }
    }

    fn draw(&mut self, ctx: &mut Context<'_>, renderer: &mut dyn Renderer) {
        let line = format!("{:<8} life {:.2}s", owner_tag(ctx), self.life);
        if let Some(text) = renderer.downcast_mut::<TextRenderer>() {
            text.emit(line);
        }
    }

    fn on_destroy(&mut self, ctx: &mut Context<'_>) {
        log::info!("{} burned out", owner_tag(ctx));
    }
}

/// Launches a comet every `interval` seconds
struct Launcher {
    interval: f32,
    timer: f32,
    launched: u32,
}

impl Launcher {
    fn launch(&mut self, ctx: &mut Context<'_>) -> Result<(), SceneError> {
        let Some(layer) = ctx.entity().and_then(|id| ctx.scene().entity(id)).map(Entity::layer) else {
            return Ok(());
        };
        self.launched += 1;

        let scene = ctx.scene_mut();
        let comet = scene.spawn_with(layer, format!("comet-{}", self.launched), Comet { life: 1.5 })?;
        scene.set_depth(comet, -1)?;
        log::debug!("Launched comet {}", self.launched);
        Ok(())
    }
}

impl Behavior for Launcher {
    fn update(&mut self, ctx: &mut Context<'_>) {
        self.timer += ctx.delta();
        if self.timer < self.interval {
            return;
        }
        self.timer -= self.interval;
        if let Err(err) = self.launch(ctx) {
            log::error!("Failed to launch comet: {}", err);
        }
    }
}

/// HUD indicator advanced once per frame
#[derive(Default)]
struct Spinner {
    ticks: usize,
}

impl Behavior for Spinner {
    fn update(&mut self, _ctx: &mut Context<'_>) {
        self.ticks += 1;
    }

    fn draw(&mut self, _ctx: &mut Context<'_>, renderer: &mut dyn Renderer) {
        const GLYPHS: [char; 4] = ['|', '/', '-', '\\'];
        if let Some(text) = renderer.downcast_mut::<TextRenderer>() {
            text.emit(format!("working {}", GLYPHS[self.ticks % GLYPHS.len()]));
        }
    }
}

fn build_scene(scene: &mut Scene) -> Result<(), AppError> {
    let world = scene.layer_by_name("world").ok_or(AppError::MissingLayer("world"))?;
    let hud = match scene.layer_by_name("hud") {
        Some(layer) => layer,
        None => scene.add_layer("hud")?,
    };

    let sun = scene.spawn(world, "sun")?;
    scene.set_depth(sun, 10)?;
    scene.attach(sun, "launcher", Launcher { interval: 1.0, timer: 0.0, launched: 0 })?;

    let planets = [("mercury", 5, 1.0, 2.0), ("venus", 4, 2.5, 1.2), ("earth", 3, 4.0, 0.6)];
    for (tag, depth, radius, speed) in planets {
        let planet = scene.spawn(world, tag)?;
        scene.set_depth(planet, depth)?;
        scene.attach(planet, "orbit", Orbit { radius, speed, angle: 0.0 })?;
    }

    scene.spawn_with(hud, "spinner", Spinner::default())?;
    Ok(())
}

fn run() -> Result<(), AppError> {
    let mut engine = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            Engine::from_file(&path)?
        }
        None => Engine::new(EngineConfig::default())?,
    };
    build_scene(engine.scene_mut())?;

    let mut renderer = TextRenderer::default();
    let mut timer = Timer::new();
    let frame_time = Duration::from_secs_f32(engine.config().fixed_timestep);

    for _ in 0..FRAMES {
        std::thread::sleep(frame_time);
        timer.update();

        let stats = engine.frame(timer.delta_time(), &mut renderer)?;
        let lines = renderer.flush();
        if stats.frame % REPORT_EVERY == 0 {
            log::info!(
                "Frame {}: {} fixed steps, {} draw calls, {} entities",
                stats.frame,
                stats.fixed_steps,
                stats.draw_calls,
                engine.scene().entity_count()
            );
            for line in lines {
                println!("{}", line);
            }
        }
    }

    log::info!(
        "Ran {} frames in {:.2}s",
        engine.frame_count(),
        timer.total_time()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    log::info!("Starting orbit demo");

    match run() {
        Ok(()) => {
            log::info!("Orbit demo finished successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Application error: {}", e);
            Err(e.into())
        }
    }
}
