//! The [`World`], one self-contained simulation.
//!
//! A world owns a [`ComponentRegistry`] and a [`SystemRegistry`] and is the
//! only path for structural changes, so every attach and detach is routed to
//! the systems. Independent worlds share nothing.
//!
//! Ordering guarantees:
//!
//! - attach: the component is stored, *then* systems are notified;
//! - detach: systems are notified, *then* the component is deleted.

use ecs_component::{Component, ComponentKind, Entity};
use tracing::debug;

use crate::entity_mut::EntityMut;
use crate::error::EcsError;
use crate::registry::{ChangeAction, SystemRegistry};
use crate::storage::ComponentRegistry;
use crate::system::{RegisteredSystem, System};

/// Entity, component and system state for one simulation.
///
/// # Examples
///
/// ```rust
/// use ecs_world::{Component, ComponentKind, World};
///
/// struct Position(f32, f32);
/// impl Component for Position {}
///
/// let mut world = World::new();
/// let e = world.spawn().add_component(Position(0.0, 0.0))?.id();
/// assert!(world.entity_has_component::<Position>(e));
///
/// world.destroy_entity(e);
/// assert!(world
///     .get_all_entities_with_components(&[ComponentKind::of::<Position>()])
///     .is_empty());
/// # Ok::<(), ecs_world::EcsError>(())
/// ```
#[derive(Debug, Default)]
pub struct World {
    components: ComponentRegistry,
    systems: SystemRegistry,
    /// Number of completed `update` calls.
    tick: u64,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The component registry, for mutating component values.
    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    /// The system registry.
    #[must_use]
    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    // -- Entities --

    /// Mint a fresh entity id.
    ///
    /// No record is created; the entity exists once its first component is
    /// attached.
    #[must_use]
    pub fn create_entity(&self) -> Entity {
        Entity::new()
    }

    /// Mint a fresh entity and return a handle to it.
    pub fn spawn(&mut self) -> EntityMut<'_> {
        let entity = self.create_entity();
        EntityMut::new(self, entity)
    }

    /// A handle to `entity`, recorded or not.
    pub fn entity_mut(&mut self, entity: Entity) -> EntityMut<'_> {
        EntityMut::new(self, entity)
    }

    /// Strip every component from `entity` (each detach notified in attach
    /// order), then drop its record.
    ///
    /// Does nothing for an unknown entity.
    pub fn destroy_entity(&mut self, entity: Entity) {
        let Some(record) = self.components.record(entity) else {
            return;
        };
        let kinds: Vec<ComponentKind> = record.kinds().collect();

        for kind in kinds {
            self.remove_kind_from_entity(entity, kind);
        }
        self.components.remove_record(entity);

        debug!(%entity, "entity destroyed");
    }

    // -- Components --

    /// Attach `component` to `entity`, creating its record if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if `entity` already holds a
    /// `C`; the existing instance is left untouched.
    pub fn add_component_to_entity<C: Component>(
        &mut self,
        entity: Entity,
        component: C,
    ) -> Result<(), EcsError> {
        self.try_add_component_with(entity, || Ok::<C, EcsError>(component))
    }

    /// Attach a component built by `factory`.
    ///
    /// The duplicate check runs first; `factory` is only called if the kind is
    /// absent. A factory error is returned unchanged and nothing is stored,
    /// not even an empty record.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] (converted into `E`) or
    /// whatever `factory` returns.
    pub fn try_add_component_with<C, E, F>(&mut self, entity: Entity, factory: F) -> Result<(), E>
    where
        C: Component,
        E: From<EcsError>,
        F: FnOnce() -> Result<C, E>,
    {
        let kind = ComponentKind::of::<C>();
        self.components.ensure_absent(entity, kind)?;

        let component = factory()?;
        self.components.insert(entity, kind, Box::new(component));
        debug!(%entity, component = kind.name(), "component added");

        self.systems.handle_entity_components_changed(
            &self.components,
            entity,
            kind,
            ChangeAction::Added,
        );
        Ok(())
    }

    /// Detach the `C` component from `entity`.
    ///
    /// Does nothing for an unknown entity.
    pub fn remove_component_from_entity<C: Component>(&mut self, entity: Entity) {
        self.remove_kind_from_entity(entity, ComponentKind::of::<C>());
    }

    /// Detach the component of `kind` from `entity`.
    ///
    /// Systems are notified while the component is still stored.
    pub fn remove_kind_from_entity(&mut self, entity: Entity, kind: ComponentKind) {
        if !self.components.contains(entity) {
            return;
        }

        self.systems.handle_entity_components_changed(
            &self.components,
            entity,
            kind,
            ChangeAction::Removed,
        );

        if self.components.take(entity, kind).is_some() {
            debug!(%entity, component = kind.name(), "component removed");
        }
    }

    /// Returns `true` if `entity` holds a `C` component.
    #[must_use]
    pub fn entity_has_component<C: Component>(&self, entity: Entity) -> bool {
        self.components.has_component::<C>(entity)
    }

    /// Returns `true` if `entity` holds every kind in `kinds`.
    #[must_use]
    pub fn entity_has_components(&self, entity: Entity, kinds: &[ComponentKind]) -> bool {
        self.components.has_kinds(entity, kinds)
    }

    /// The `C` component on `entity`.
    #[must_use]
    pub fn get_component_for_entity<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.components.get_component::<C>(entity)
    }

    /// Mutable access to the `C` component on `entity`.
    #[must_use]
    pub fn get_component_for_entity_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.components.get_component_mut::<C>(entity)
    }

    /// Every entity holding all of `kinds`, in record creation order.
    #[must_use]
    pub fn get_all_entities_with_components(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.components.entities_with(kinds)
    }

    // -- Systems --

    /// Register `system`, back-filling its membership from existing entities.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`] if an `S` is already registered.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<(), EcsError> {
        self.systems.add(system, &self.components)
    }

    /// The registration entry for system type `S`.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<&RegisteredSystem> {
        self.systems.get::<S>()
    }

    /// The registered `S` instance.
    #[must_use]
    pub fn system<S: System>(&self) -> Option<&S> {
        self.systems.system::<S>()
    }

    /// The registered `S` instance, mutably.
    #[must_use]
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.get_mut::<S>()?.downcast_mut::<S>()
    }

    /// Run one tick: every system's `on_update` once, in registration order,
    /// then the structural changes they queued.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while applying queued commands; the
    /// commands after it are dropped.
    pub fn update(&mut self) -> Result<(), EcsError> {
        self.tick += 1;
        let commands = self.systems.update(&mut self.components, self.tick);
        if !commands.is_empty() {
            debug!(tick = self.tick, commands = commands.len(), "applying queued commands");
        }
        commands.apply(self)
    }
}
