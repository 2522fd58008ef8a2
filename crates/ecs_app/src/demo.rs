//! Demo scene: a render system, a movement system and a sprite that shows up
//! late.
//!
//! At start-up one entity carries a [`Sprite`] and another only a [`Speed`]
//! plus motion components. At tick [`LATE_SPRITE_TICK`] the second entity
//! gains a sprite and joins the render set.

use ecs_world::{
    Component, ComponentRegistry, EcsError, Entity, Query, System, SystemContext, World,
};
use glam::Vec2;
use tracing::{debug, info};

/// Completed-tick count at which the second entity gets its sprite.
pub const LATE_SPRITE_TICK: u64 = 10;

/// Scalar speed in world units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed(pub f32);

impl Component for Speed {
    fn type_name() -> &'static str {
        "Speed"
    }
}

/// Marks an entity as drawable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sprite;

impl Component for Sprite {
    fn type_name() -> &'static str {
        "Sprite"
    }
}

/// A 2D position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

impl Position {
    /// The origin.
    pub const ORIGIN: Self = Self(Vec2::ZERO);
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// A 2D velocity in world units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec2);

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Integrates `Velocity` into `Position` once per tick.
#[derive(Debug)]
pub struct MovementSystem {
    /// Seconds per tick.
    dt: f32,
}

impl MovementSystem {
    #[must_use]
    pub fn new(dt: f32) -> Self {
        Self { dt }
    }
}

impl System for MovementSystem {
    fn query(&self) -> Query {
        Query::of::<Position>().with::<Velocity>()
    }

    fn on_update(&mut self, ctx: &mut SystemContext<'_>) {
        for entity in ctx.entities().iter() {
            let Some(Velocity(velocity)) = ctx.get::<Velocity>(entity).copied() else {
                continue;
            };
            if let Some(Position(position)) = ctx.get_mut::<Position>(entity) {
                *position += velocity * self.dt;
            }
        }
    }
}

/// Draws every sprite. There is no renderer, so drawing means counting.
#[derive(Debug, Default)]
pub struct RenderSystem {
    frames: u64,
    draws: u64,
}

impl RenderSystem {
    /// Frames rendered so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total sprite draws so far.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl System for RenderSystem {
    fn query(&self) -> Query {
        Query::of::<Sprite>()
    }

    fn on_entity_added(&mut self, entity: Entity, components: &ComponentRegistry) {
        let position = components.get_component::<Position>(entity).map(|p| p.0);
        info!(%entity, ?position, "sprite entered render set");
    }

    fn on_entity_removed(&mut self, entity: Entity, _components: &ComponentRegistry) {
        info!(%entity, "sprite left render set");
    }

    fn on_update(&mut self, ctx: &mut SystemContext<'_>) {
        self.frames += 1;
        self.draws += ctx.entities().len() as u64;
        debug!(tick = ctx.tick(), sprites = ctx.entities().len(), "frame rendered");
    }
}

/// Entities created by [`build_scene`].
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    /// Drawn from the first tick.
    pub sprite: Entity,
    /// Moving; drawn from [`LATE_SPRITE_TICK`] on.
    pub runner: Entity,
}

impl Scene {
    /// The per-tick script for [`TickLoop::run`](crate::tick::TickLoop::run).
    ///
    /// # Errors
    ///
    /// Propagates the attach error, which only happens if the runner already
    /// has a sprite.
    pub fn script(&self, world: &mut World, completed: u64) -> Result<(), EcsError> {
        if completed == LATE_SPRITE_TICK {
            world.add_component_to_entity(self.runner, Sprite)?;
        }
        Ok(())
    }
}

/// Populate `world` with the demo systems and entities.
///
/// # Errors
///
/// Returns [`EcsError`] if the world already holds one of the demo systems.
pub fn build_scene(world: &mut World, dt: f32) -> Result<Scene, EcsError> {
    let sprite = world.create_entity();

    let speed = Speed(1.0);
    let runner = world
        .spawn()
        .add_component(speed)?
        .add_component(Position::ORIGIN)?
        .add_component(Velocity(Vec2::X * speed.0))?
        .id();

    world.add_system(RenderSystem::default())?;
    world.add_system(MovementSystem::new(dt))?;

    world.add_component_to_entity(sprite, Sprite)?;

    info!(%sprite, %runner, "demo scene built");
    Ok(Scene { sprite, runner })
}
