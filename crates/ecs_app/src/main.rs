//! # ecs_app
//!
//! Drives the demo scene at a fixed rate.
//!
//! ## Configuration
//!
//! - `ECS_TICK_RATE`: ticks per second (default 10).
//! - `ECS_MAX_TICKS`: stop after this many ticks (default 0, run forever).
//! - `RUST_LOG`: log filter (default `ecs_app=info`).

mod demo;
mod tick;

use anyhow::Result;
use ecs_world::World;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tick::{TickConfig, TickLoop};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ecs_app=info".parse()?))
        .init();

    let config = TickConfig::from_env()?;
    let dt = config.period().as_secs_f32();
    let mut tick_loop = TickLoop::new(config, World::new());

    let scene = demo::build_scene(tick_loop.world_mut(), dt)?;
    info!(
        tick_rate = tick_loop.config().tick_rate,
        systems = tick_loop.world().systems().len(),
        sprite = %scene.sprite,
        runner = %scene.runner,
        "ecs driver starting"
    );

    tick_loop
        .run(|world, completed| scene.script(world, completed))
        .await?;

    if let Some(render) = tick_loop.world().system::<demo::RenderSystem>() {
        info!(frames = render.frames(), draws = render.draws(), "ecs driver shut down");
    }
    Ok(())
}
