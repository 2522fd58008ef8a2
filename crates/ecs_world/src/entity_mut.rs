//! A mutable handle to one entity within a [`World`].

use ecs_component::{Component, ComponentKind, Entity};

use crate::error::EcsError;
use crate::world::World;

/// Borrow of a [`World`] focused on a single entity.
///
/// Every structural change goes through the world, so systems see it exactly
/// as they would a direct [`World::add_component_to_entity`] call.
#[derive(Debug)]
pub struct EntityMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(world: &'w mut World, entity: Entity) -> Self {
        Self { world, entity }
    }

    /// The entity this handle points at.
    #[must_use]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Attach `component`, chaining on success.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if the entity already holds a
    /// `C`.
    pub fn add_component<C: Component>(&mut self, component: C) -> Result<&mut Self, EcsError> {
        self.world.add_component_to_entity(self.entity, component)?;
        Ok(self)
    }

    /// Attach a component built by `factory`. See
    /// [`World::try_add_component_with`].
    ///
    /// # Errors
    ///
    /// Returns the duplicate error (converted into `E`) or the factory's error.
    pub fn try_add_component_with<C, E, F>(&mut self, factory: F) -> Result<&mut Self, E>
    where
        C: Component,
        E: From<EcsError>,
        F: FnOnce() -> Result<C, E>,
    {
        self.world.try_add_component_with(self.entity, factory)?;
        Ok(self)
    }

    /// Detach the `C` component, if present.
    pub fn remove_component<C: Component>(&mut self) -> &mut Self {
        self.world.remove_component_from_entity::<C>(self.entity);
        self
    }

    /// Returns `true` if the entity holds a `C` component.
    #[must_use]
    pub fn has_component<C: Component>(&self) -> bool {
        self.world.entity_has_component::<C>(self.entity)
    }

    /// Returns `true` if the entity holds every kind in `kinds`.
    #[must_use]
    pub fn has_components(&self, kinds: &[ComponentKind]) -> bool {
        self.world.entity_has_components(self.entity, kinds)
    }

    /// The entity's `C` component.
    #[must_use]
    pub fn get_component<C: Component>(&self) -> Option<&C> {
        self.world.get_component_for_entity::<C>(self.entity)
    }

    /// Mutable access to the entity's `C` component.
    #[must_use]
    pub fn get_component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.world.get_component_for_entity_mut::<C>(self.entity)
    }

    /// Destroy the entity, consuming the handle.
    pub fn destroy(self) {
        self.world.destroy_entity(self.entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Armor(u32);
    impl Component for Armor {}

    #[test]
    fn test_chained_adds() {
        let mut world = World::new();
        let e = world
            .spawn()
            .add_component(Health(10))
            .and_then(|e| e.add_component(Armor(2)))
            .map(|e| e.id())
            .unwrap();

        assert_eq!(world.get_component_for_entity::<Health>(e), Some(&Health(10)));
        assert!(world.entity_has_components(
            e,
            &[ComponentKind::of::<Health>(), ComponentKind::of::<Armor>()]
        ));
    }

    #[test]
    fn test_duplicate_add_fails() {
        let mut world = World::new();
        let mut handle = world.spawn();
        handle.add_component(Health(1)).unwrap();
        assert!(matches!(
            handle.add_component(Health(2)),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert_eq!(handle.get_component::<Health>(), Some(&Health(1)));
    }

    #[test]
    fn test_mutate_and_remove() {
        let mut world = World::new();
        let mut handle = world.spawn();
        handle.add_component(Health(5)).unwrap();

        if let Some(health) = handle.get_component_mut::<Health>() {
            health.0 -= 2;
        }
        assert_eq!(handle.get_component::<Health>(), Some(&Health(3)));

        handle.remove_component::<Health>();
        assert!(!handle.has_component::<Health>());
    }

    #[test]
    fn test_destroy_drops_record() {
        let mut world = World::new();
        let e = {
            let mut handle = world.spawn();
            handle.add_component(Armor(1)).unwrap();
            handle.id()
        };

        world.entity_mut(e).destroy();
        assert!(!world.components().contains(e));
    }
}
