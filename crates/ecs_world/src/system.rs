//! The [`System`] trait and the registry's per-system bookkeeping.
//!
//! A system declares a [`Query`] and reacts to three events: an entity
//! starting to match, an entity ceasing to match, and a tick. All hooks
//! default to no-ops.
//!
//! Membership is not stored on the user's type. The registry wraps each
//! instance in a [`RegisteredSystem`], which owns the [`Membership`] set and
//! fires the hooks around every change to it.

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use ecs_component::{Entity, Query};
use tracing::trace;

use crate::context::{Commands, SystemContext};
use crate::storage::ComponentRegistry;

/// Behavior attached to every entity matching a query.
///
/// # Examples
///
/// ```rust
/// use ecs_world::{Component, ComponentRegistry, Entity, Query, System, SystemContext};
///
/// struct Position(f32);
/// impl Component for Position {}
///
/// #[derive(Default)]
/// struct Tracker {
///     seen: usize,
/// }
///
/// impl System for Tracker {
///     fn query(&self) -> Query {
///         Query::of::<Position>()
///     }
///
///     fn on_entity_added(&mut self, _entity: Entity, _components: &ComponentRegistry) {
///         self.seen += 1;
///     }
///
///     fn on_update(&mut self, ctx: &mut SystemContext<'_>) {
///         for entity in ctx.entities().iter() {
///             if let Some(pos) = ctx.get_mut::<Position>(entity) {
///                 pos.0 += 1.0;
///             }
///         }
///     }
/// }
/// ```
pub trait System: Any {
    /// The components an entity must hold to be a member of this system.
    ///
    /// Read once, at registration.
    fn query(&self) -> Query;

    /// Called after `entity` has been added to this system's membership.
    fn on_entity_added(&mut self, _entity: Entity, _components: &ComponentRegistry) {}

    /// Called after `entity` has been removed from this system's membership.
    ///
    /// The component whose removal triggered this is still stored and can be
    /// read through `components`.
    fn on_entity_removed(&mut self, _entity: Entity, _components: &ComponentRegistry) {}

    /// Called once per tick.
    fn on_update(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// A human-readable name for this system type.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

/// A compile-time-distinct identifier for a system type.
#[derive(Debug, Clone, Copy)]
pub struct SystemKind {
    id: TypeId,
    name: &'static str,
}

impl SystemKind {
    /// Returns the kind of system type `S`.
    #[must_use]
    pub fn of<S: System>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: S::type_name(),
        }
    }

    /// The diagnostic name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for SystemKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SystemKind {}

impl Hash for SystemKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An insertion-ordered set of entities.
#[derive(Debug, Default, Clone)]
pub struct Membership {
    order: Vec<Entity>,
    index: HashSet<Entity>,
}

impl Membership {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entity`; returns `false` if it was already present.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if !self.index.insert(entity) {
            return false;
        }
        self.order.push(entity);
        true
    }

    /// Remove `entity`; returns `false` if it was not present.
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.index.remove(&entity) {
            return false;
        }
        self.order.retain(|&e| e != entity);
        true
    }

    /// Returns `true` if `entity` is present.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains(&entity)
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    /// Members in insertion order, as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.order
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A system instance together with its query and membership.
pub struct RegisteredSystem {
    kind: SystemKind,
    query: Query,
    entities: Membership,
    system: Box<dyn System>,
}

impl RegisteredSystem {
    /// Wrap `system`, reading its query once.
    #[must_use]
    pub fn new<S: System>(system: S) -> Self {
        let query = system.query();
        Self {
            kind: SystemKind::of::<S>(),
            query,
            entities: Membership::new(),
            system: Box::new(system),
        }
    }

    /// The system's kind.
    #[must_use]
    pub fn kind(&self) -> SystemKind {
        self.kind
    }

    /// The query captured at registration.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Entities currently matching the query.
    #[must_use]
    pub fn entities(&self) -> &Membership {
        &self.entities
    }

    /// Returns `true` if `entity` is a member.
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.entities.contains(entity)
    }

    /// Insert `entity` into the membership, then fire `on_entity_added`.
    pub fn add(&mut self, entity: Entity, components: &ComponentRegistry) {
        self.entities.insert(entity);
        trace!(system = self.kind.name(), %entity, "entity joined system");
        self.system.on_entity_added(entity, components);
    }

    /// Remove `entity` from the membership, then fire `on_entity_removed`.
    pub fn remove(&mut self, entity: Entity, components: &ComponentRegistry) {
        self.entities.remove(entity);
        trace!(system = self.kind.name(), %entity, "entity left system");
        self.system.on_entity_removed(entity, components);
    }

    /// The wrapped instance, if it is an `S`.
    #[must_use]
    pub fn downcast_ref<S: System>(&self) -> Option<&S> {
        let system: &dyn Any = &*self.system;
        system.downcast_ref::<S>()
    }

    /// The wrapped instance, mutably, if it is an `S`.
    #[must_use]
    pub fn downcast_mut<S: System>(&mut self) -> Option<&mut S> {
        let system: &mut dyn Any = &mut *self.system;
        system.downcast_mut::<S>()
    }

    /// Run one tick of the wrapped system.
    pub(crate) fn run(&mut self, tick: u64, components: &mut ComponentRegistry, commands: &mut Commands) {
        let mut ctx = SystemContext::new(tick, &self.entities, components, commands);
        self.system.on_update(&mut ctx);
    }
}

impl fmt::Debug for RegisteredSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSystem")
            .field("kind", &self.kind.name())
            .field("query", &self.query)
            .field("entities", &self.entities.len())
            .finish()
    }
}
