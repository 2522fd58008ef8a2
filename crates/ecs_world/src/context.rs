//! Per-tick execution context provided to [`System::on_update`].
//!
//! [`System::on_update`]: crate::System::on_update

use std::fmt;

use ecs_component::{Component, Entity};

use crate::error::EcsError;
use crate::storage::ComponentRegistry;
use crate::system::Membership;
use crate::world::World;

type Command = Box<dyn FnOnce(&mut World) -> Result<(), EcsError>>;

/// Structural changes queued by systems during a tick.
///
/// Applied by [`World::update`] once every system has run, in the order they
/// were queued, through the same notifying paths as direct calls.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Mint a fresh entity id.
    ///
    /// Nothing is queued: an entity only gets a record once a component is
    /// attached, so queue an [`add_component`](Self::add_component) for it.
    #[must_use]
    pub fn spawn(&mut self) -> Entity {
        Entity::new()
    }

    /// Queue attaching `component` to `entity`.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) {
        self.queue
            .push(Box::new(move |world| world.add_component_to_entity(entity, component)));
    }

    /// Queue detaching the `C` component from `entity`.
    pub fn remove_component<C: Component>(&mut self, entity: Entity) {
        self.queue.push(Box::new(move |world| {
            world.remove_component_from_entity::<C>(entity);
            Ok(())
        }));
    }

    /// Queue destroying `entity`.
    pub fn destroy(&mut self, entity: Entity) {
        self.queue.push(Box::new(move |world| {
            world.destroy_entity(entity);
            Ok(())
        }));
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply every queued command, stopping at the first error.
    pub(crate) fn apply(self, world: &mut World) -> Result<(), EcsError> {
        for command in self.queue {
            command(world)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("queued", &self.queue.len())
            .finish()
    }
}

/// Context handed to a system for one tick.
///
/// Gives the system its own membership, read/write access to component
/// values, and a [`Commands`] queue for structural changes.
pub struct SystemContext<'a> {
    tick: u64,
    entities: &'a Membership,
    components: &'a mut ComponentRegistry,
    commands: &'a mut Commands,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(
        tick: u64,
        entities: &'a Membership,
        components: &'a mut ComponentRegistry,
        commands: &'a mut Commands,
    ) -> Self {
        Self {
            tick,
            entities,
            components,
            commands,
        }
    }

    /// The current tick number (1 for the first tick).
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Entities currently matching this system's query.
    ///
    /// The borrow is independent of `self`, so it can be iterated while
    /// component values are mutated.
    #[must_use]
    pub fn entities(&self) -> &'a Membership {
        self.entities
    }

    /// Read-only view of the whole component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        self.components
    }

    /// The `C` component on `entity`.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.components.get_component::<C>(entity)
    }

    /// Mutable access to the `C` component on `entity`.
    #[must_use]
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.components.get_component_mut::<C>(entity)
    }

    /// Returns `true` if `entity` holds a `C` component.
    #[must_use]
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.components.has_component::<C>(entity)
    }

    /// The structural change queue for this tick.
    pub fn commands(&mut self) -> &mut Commands {
        self.commands
    }
}

impl fmt::Debug for SystemContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemContext")
            .field("tick", &self.tick)
            .field("entities", &self.entities.len())
            .field("commands", &self.commands.len())
            .finish()
    }
}
