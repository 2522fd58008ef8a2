//! Entity-component-system runtime.
//!
//! A [`World`] holds entities (opaque ids), their components (at most one
//! per kind) and registered [`System`]s. Each system declares a [`Query`];
//! the world keeps every system's entity set equal to the entities whose
//! components satisfy that query, firing the system's add/remove hooks as
//! entities enter and leave. [`World::update`] runs every system once per
//! tick, in registration order.

mod context;
mod entity_mut;
mod error;
mod registry;
mod storage;
mod system;
mod world;

pub use ecs_component::{Component, ComponentKind, Entity, KindSet, Query};

pub use context::{Commands, SystemContext};
pub use entity_mut::EntityMut;
pub use error::EcsError;
pub use registry::{ChangeAction, SystemRegistry};
pub use storage::{ComponentRegistry, EntityRecord, StorageStats};
pub use system::{Membership, RegisteredSystem, System, SystemKind};
pub use world::World;
