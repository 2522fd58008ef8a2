//! Component registry: the single source of truth for entity state.
//!
//! Each recorded entity owns an [`EntityRecord`]: its components keyed by
//! [`ComponentKind`], at most one instance per kind. Records are created
//! lazily on the first attached component and dropped only when the entity
//! is destroyed.
//!
//! Structural mutation (attach, detach, drop record) is crate-private: it
//! must go through [`World`](crate::World) so systems are notified. Component
//! *values* may be read and mutated freely.

use std::any::Any;
use std::cell::Cell;
use std::collections::HashMap;

use ecs_component::{Component, ComponentKind, Entity, KindSet};

use crate::error::EcsError;

/// The components held by one entity, in attach order.
#[derive(Default)]
pub struct EntityRecord {
    components: Vec<(ComponentKind, Box<dyn Any>)>,
}

impl EntityRecord {
    /// Returns `true` if the record holds a component of `kind`.
    #[must_use]
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.iter().any(|(k, _)| *k == kind)
    }

    /// The kinds held by this record, in attach order.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.iter().map(|(kind, _)| *kind)
    }

    /// Number of components held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the record holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Typed access to the component of type `C`.
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<&C> {
        let kind = ComponentKind::of::<C>();
        self.components
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, value)| value.downcast_ref::<C>())
    }

    /// Typed mutable access to the component of type `C`.
    #[must_use]
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        let kind = ComponentKind::of::<C>();
        self.components
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, value)| value.downcast_mut::<C>())
    }

    fn insert(&mut self, kind: ComponentKind, value: Box<dyn Any>) {
        self.components.push((kind, value));
    }

    fn take(&mut self, kind: ComponentKind) -> Option<Box<dyn Any>> {
        let pos = self.components.iter().position(|(k, _)| *k == kind)?;
        Some(self.components.remove(pos).1)
    }
}

impl KindSet for EntityRecord {
    fn has_kind(&self, kind: ComponentKind) -> bool {
        self.has(kind)
    }
}

impl std::fmt::Debug for EntityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds().map(|k| k.name())).finish()
    }
}

/// Counters for accesses to record contents.
///
/// Looking an id up in the registry index is not counted; reading or writing
/// the record found there is. An id the registry has never recorded therefore
/// never moves these counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of shared accesses to a record.
    pub record_reads: u64,
    /// Number of mutable accesses to a record.
    pub record_writes: u64,
}

/// Owns every entity record, keyed by entity id, in insertion order.
///
/// Not `Sync`: the registry assumes a single logical caller, and its access
/// counters use interior mutability.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Entity ids in the order their records were created.
    order: Vec<Entity>,
    /// Records keyed by entity id.
    records: HashMap<Entity, EntityRecord>,
    reads: Cell<u64>,
    writes: Cell<u64>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `entity` has a record.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Number of recorded entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no entity is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded entity ids, in record creation order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    /// The record for `entity`, if any.
    #[must_use]
    pub fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        let record = self.records.get(&entity)?;
        self.reads.set(self.reads.get() + 1);
        Some(record)
    }

    fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        let record = self.records.get_mut(&entity)?;
        *self.writes.get_mut() += 1;
        Some(record)
    }

    /// Returns `true` if `entity` holds a component of type `C`.
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: Entity) -> bool {
        self.has_kind(entity, ComponentKind::of::<C>())
    }

    /// Returns `true` if `entity` holds a component of `kind`.
    #[must_use]
    pub fn has_kind(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.record(entity).is_some_and(|record| record.has(kind))
    }

    /// Returns `true` if `entity` holds every kind in `kinds`.
    #[must_use]
    pub fn has_kinds(&self, entity: Entity, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|&kind| self.has_kind(entity, kind))
    }

    /// The component of type `C` on `entity`.
    #[must_use]
    pub fn get_component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.record(entity)?.get::<C>()
    }

    /// Mutable access to the component of type `C` on `entity`.
    #[must_use]
    pub fn get_component_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.record_mut(entity)?.get_mut::<C>()
    }

    /// All entities whose record contains every kind in `kinds`, in record
    /// creation order.
    ///
    /// A linear scan over all records.
    #[must_use]
    pub fn entities_with(&self, kinds: &[ComponentKind]) -> Vec<Entity> {
        self.order
            .iter()
            .copied()
            .filter(|&entity| {
                self.record(entity)
                    .is_some_and(|record| kinds.iter().all(|&kind| record.has(kind)))
            })
            .collect()
    }

    /// A snapshot of the access counters.
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            record_reads: self.reads.get(),
            record_writes: self.writes.get(),
        }
    }

    /// Zero the access counters.
    pub fn reset_stats(&self) {
        self.reads.set(0);
        self.writes.set(0);
    }

    /// Fails with [`EcsError::DuplicateComponent`] if `entity` already holds
    /// `kind`.
    pub(crate) fn ensure_absent(&self, entity: Entity, kind: ComponentKind) -> Result<(), EcsError> {
        if self.has_kind(entity, kind) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: kind.name(),
            });
        }
        Ok(())
    }

    /// Store `value` under `kind`, creating the record if needed.
    ///
    /// The caller has already checked for a duplicate.
    pub(crate) fn insert(&mut self, entity: Entity, kind: ComponentKind, value: Box<dyn Any>) {
        if !self.records.contains_key(&entity) {
            self.records.insert(entity, EntityRecord::default());
            self.order.push(entity);
        }
        if let Some(record) = self.record_mut(entity) {
            record.insert(kind, value);
        }
    }

    /// Detach and return the component of `kind`, leaving the record in place.
    pub(crate) fn take(&mut self, entity: Entity, kind: ComponentKind) -> Option<Box<dyn Any>> {
        self.record_mut(entity)?.take(kind)
    }

    /// Drop the record for `entity` entirely.
    pub(crate) fn remove_record(&mut self, entity: Entity) -> Option<EntityRecord> {
        let record = self.records.remove(&entity)?;
        self.order.retain(|&e| e != entity);
        Some(record)
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

    fn put<C: Component>(registry: &mut ComponentRegistry, entity: Entity, value: C) {
        registry.insert(entity, ComponentKind::of::<C>(), Box::new(value));
    }

    #[test]
    fn test_record_created_lazily() {
        let mut registry = ComponentRegistry::new();
        let e = Entity::new();
        assert!(!registry.contains(e));
        assert!(registry.is_empty());

        put(&mut registry, e, Health(10));
        assert!(registry.contains(e));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_component::<Health>(e), Some(&Health(10)));
    }

    #[test]
    fn test_ensure_absent_detects_duplicate() {
        let mut registry = ComponentRegistry::new();
        let e = Entity::new();
        put(&mut registry, e, Health(10));

        let err = registry
            .ensure_absent(e, ComponentKind::of::<Health>())
            .unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { entity, .. } if entity == e));
        assert!(registry.ensure_absent(e, ComponentKind::of::<Armor>()).is_ok());
    }

    #[test]
    fn test_take_keeps_record() {
        let mut registry = ComponentRegistry::new();
        let e = Entity::new();
        put(&mut registry, e, Health(10));

        let taken = registry.take(e, ComponentKind::of::<Health>()).unwrap();
        assert_eq!(taken.downcast_ref::<Health>(), Some(&Health(10)));
        assert!(registry.contains(e));
        assert!(!registry.has_component::<Health>(e));
        assert!(registry.record(e).unwrap().is_empty());
    }

    #[test]
    fn test_record_kinds_in_attach_order() {
        let mut registry = ComponentRegistry::new();
        let e = Entity::new();
        put(&mut registry, e, Armor(1));
        put(&mut registry, e, Health(2));

        let kinds: Vec<_> = registry.record(e).unwrap().kinds().collect();
        assert_eq!(kinds, vec![ComponentKind::of::<Armor>(), ComponentKind::of::<Health>()]);
    }

    #[test]
    fn test_entities_with_follows_record_order() {
        let mut registry = ComponentRegistry::new();
        let a = Entity::new();
        let b = Entity::new();
        let c = Entity::new();
        put(&mut registry, c, Health(1));
        put(&mut registry, a, Health(1));
        put(&mut registry, a, Armor(1));
        put(&mut registry, b, Armor(1));

        let health = registry.entities_with(&[ComponentKind::of::<Health>()]);
        assert_eq!(health, vec![c, a]);

        let both = registry.entities_with(&[
            ComponentKind::of::<Health>(),
            ComponentKind::of::<Armor>(),
        ]);
        assert_eq!(both, vec![a]);
    }

    #[test]
    fn test_unknown_entity_touches_no_record() {
        let mut registry = ComponentRegistry::new();
        put(&mut registry, Entity::new(), Health(1));
        registry.reset_stats();

        let ghost = Entity::new();
        assert!(!registry.has_component::<Health>(ghost));
        assert!(registry.get_component::<Health>(ghost).is_none());
        assert!(registry.get_component_mut::<Health>(ghost).is_none());
        assert!(registry.take(ghost, ComponentKind::of::<Health>()).is_none());
        assert!(registry.remove_record(ghost).is_none());

        assert_eq!(registry.stats(), StorageStats::default());
    }

    #[test]
    fn test_remove_record_drops_from_order() {
        let mut registry = ComponentRegistry::new();
        let a = Entity::new();
        let b = Entity::new();
        put(&mut registry, a, Health(1));
        put(&mut registry, b, Health(2));

        assert!(registry.remove_record(a).is_some());
        assert_eq!(registry.entities().collect::<Vec<_>>(), vec![b]);
        assert!(!registry.contains(a));
    }
}
