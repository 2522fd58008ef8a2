//! System registry: owns system instances and keeps their membership in
//! step with the component registry.
//!
//! Membership is push-driven: the component registry's owner calls
//! [`SystemRegistry::handle_entity_components_changed`] after every attach and
//! before every detach. Systems never re-scan on their own.

use std::collections::HashMap;
use std::fmt;

use ecs_component::{ComponentKind, Entity};
use tracing::{debug, trace};

use crate::context::Commands;
use crate::error::EcsError;
use crate::storage::ComponentRegistry;
use crate::system::{RegisteredSystem, System, SystemKind};

/// What happened to an entity's component set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    /// A component was just stored.
    Added,
    /// A component is about to be deleted (it is still stored).
    Removed,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// Registry of all systems, in registration order.
///
/// A system type may be registered at most once.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    /// Systems in registration order.
    systems: Vec<RegisteredSystem>,
    /// Position of each system kind in `systems`.
    index: HashMap<SystemKind, usize>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `system`.
    ///
    /// Every entity already recorded in `components` whose record satisfies
    /// the system's query is added to its membership immediately, firing
    /// `on_entity_added` for each.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`] if a system of the same type is
    /// already registered. The registry is left unchanged.
    pub fn add<S: System>(&mut self, system: S, components: &ComponentRegistry) -> Result<(), EcsError> {
        let kind = SystemKind::of::<S>();
        if self.index.contains_key(&kind) {
            return Err(EcsError::DuplicateSystem { system: kind.name() });
        }

        let mut entry = RegisteredSystem::new(system);
        for entity in components.entities() {
            if let Some(record) = components.record(entity)
                && entry.query().is_satisfied_by(record)
            {
                entry.add(entity, components);
            }
        }

        debug!(
            system = kind.name(),
            query_len = entry.query().len(),
            members = entry.entities().len(),
            "system registered"
        );

        self.index.insert(kind, self.systems.len());
        self.systems.push(entry);
        Ok(())
    }

    /// The registered system of type `S`.
    #[must_use]
    pub fn get<S: System>(&self) -> Option<&RegisteredSystem> {
        self.get_kind(SystemKind::of::<S>())
    }

    /// The registered system of the given kind.
    #[must_use]
    pub fn get_kind(&self, kind: SystemKind) -> Option<&RegisteredSystem> {
        self.index.get(&kind).map(|&i| &self.systems[i])
    }

    /// The registered system of type `S`, mutably.
    #[must_use]
    pub fn get_mut<S: System>(&mut self) -> Option<&mut RegisteredSystem> {
        let i = *self.index.get(&SystemKind::of::<S>())?;
        self.systems.get_mut(i)
    }

    /// The registered `S` instance itself.
    #[must_use]
    pub fn system<S: System>(&self) -> Option<&S> {
        self.get::<S>()?.downcast_ref::<S>()
    }

    /// Returns `true` if a system of type `S` is registered.
    #[must_use]
    pub fn contains<S: System>(&self) -> bool {
        self.index.contains_key(&SystemKind::of::<S>())
    }

    /// All registered systems, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSystem> {
        self.systems.iter()
    }

    /// Number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no system is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Run `on_update` on every system once, in registration order.
    ///
    /// Returns the structural changes the systems queued.
    pub fn update(&mut self, components: &mut ComponentRegistry, tick: u64) -> Commands {
        let mut commands = Commands::default();
        for system in &mut self.systems {
            system.run(tick, components, &mut commands);
        }
        commands
    }

    /// Route a component change on `entity` to every system.
    ///
    /// - `Added`: each non-member system whose query the record now satisfies
    ///   gains the entity.
    /// - `Removed`: systems whose query does not mention `kind` are skipped
    ///   outright. Of the rest, each member system whose query would no longer
    ///   be satisfied once `kind` is gone loses the entity.
    ///
    /// Does nothing if `entity` has no record.
    pub fn handle_entity_components_changed(
        &mut self,
        components: &ComponentRegistry,
        entity: Entity,
        kind: ComponentKind,
        action: ChangeAction,
    ) {
        let Some(record) = components.record(entity) else {
            return;
        };

        trace!(%entity, component = kind.name(), %action, "routing component change");

        match action {
            ChangeAction::Added => {
                for system in &mut self.systems {
                    if system.has(entity) {
                        continue;
                    }
                    if system.query().is_satisfied_by(record) {
                        system.add(entity, components);
                    }
                }
            }
            ChangeAction::Removed => {
                for system in &mut self.systems {
                    // Fast path: a kind outside the query cannot change membership.
                    if !system.query().contains(kind) {
                        continue;
                    }
                    if system.has(entity) && !system.query().is_satisfied_without(record, kind) {
                        system.remove(entity, components);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use ecs_component::{Component, Query};

    use super::*;

    struct A;
    impl Component for A {}

    struct B;
    impl Component for B {}

    struct C;
    impl Component for C {}

    type Log = Rc<RefCell<Vec<(&'static str, Entity)>>>;

    struct OnlyA {
        log: Log,
    }

    impl System for OnlyA {
        fn query(&self) -> Query {
            Query::of::<A>()
        }

        fn on_entity_added(&mut self, entity: Entity, _components: &ComponentRegistry) {
            self.log.borrow_mut().push(("added", entity));
        }

        fn on_entity_removed(&mut self, entity: Entity, _components: &ComponentRegistry) {
            self.log.borrow_mut().push(("removed", entity));
        }
    }

    struct OnlyB;
    impl System for OnlyB {
        fn query(&self) -> Query {
            Query::of::<B>()
        }
    }

    fn put<T: Component>(registry: &mut ComponentRegistry, entity: Entity, value: T) {
        registry.insert(entity, ComponentKind::of::<T>(), Box::new(value));
    }

    #[test]
    fn test_add_backfills_existing_entities() {
        let mut components = ComponentRegistry::new();
        let e = Entity::new();
        put(&mut components, e, A);

        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(OnlyA { log: log.clone() }, &components).unwrap();
        registry.add(OnlyB, &components).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get::<OnlyA>().unwrap().entities().as_slice(), &[e]);
        assert!(registry.get::<OnlyB>().unwrap().entities().is_empty());
        assert_eq!(*log.borrow(), vec![("added", e)]);
    }

    #[test]
    fn test_duplicate_system_rejected() {
        let components = ComponentRegistry::new();
        let mut registry = SystemRegistry::new();
        registry.add(OnlyB, &components).unwrap();

        let err = registry.add(OnlyB, &components).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateSystem { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_iter_follows_registration_order() {
        let components = ComponentRegistry::new();
        let mut registry = SystemRegistry::new();
        registry.add(OnlyB, &components).unwrap();
        registry
            .add(OnlyA { log: Log::default() }, &components)
            .unwrap();

        let kinds: Vec<_> = registry.iter().map(RegisteredSystem::kind).collect();
        assert_eq!(kinds, vec![SystemKind::of::<OnlyB>(), SystemKind::of::<OnlyA>()]);
        assert!(registry.system::<OnlyB>().is_some());
        assert!(registry.contains::<OnlyA>());
    }

    #[test]
    fn test_unknown_entity_is_ignored() {
        let components = ComponentRegistry::new();
        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(OnlyA { log: log.clone() }, &components).unwrap();

        registry.handle_entity_components_changed(
            &components,
            Entity::new(),
            ComponentKind::of::<A>(),
            ChangeAction::Added,
        );

        assert!(log.borrow().is_empty());
        assert_eq!(components.stats().record_reads, 0);
    }

    #[test]
    fn test_removed_kind_outside_query_skips_system() {
        let mut components = ComponentRegistry::new();
        let e = Entity::new();
        put(&mut components, e, A);

        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(OnlyA { log: log.clone() }, &components).unwrap();
        log.borrow_mut().clear();

        registry.handle_entity_components_changed(
            &components,
            e,
            ComponentKind::of::<C>(),
            ChangeAction::Removed,
        );

        assert!(log.borrow().is_empty());
        assert!(registry.get::<OnlyA>().unwrap().has(e));
    }

    #[test]
    fn test_removed_kind_in_query_drops_member() {
        let mut components = ComponentRegistry::new();
        let e = Entity::new();
        put(&mut components, e, A);

        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(OnlyA { log: log.clone() }, &components).unwrap();
        log.borrow_mut().clear();

        // Still stored: removal is announced before deletion.
        registry.handle_entity_components_changed(
            &components,
            e,
            ComponentKind::of::<A>(),
            ChangeAction::Removed,
        );

        assert_eq!(*log.borrow(), vec![("removed", e)]);
        assert!(!registry.get::<OnlyA>().unwrap().has(e));
    }
}
