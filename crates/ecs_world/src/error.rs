//! World-level error types.

use ecs_component::Entity;

/// Errors raised by structural operations on a [`World`](crate::World).
///
/// Operations on unknown entities are never errors; they are silent no-ops
/// or return `false`/`None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity already holds a component of this kind.
    #[error("entity {entity} already has component {component}")]
    DuplicateComponent {
        /// The entity the component was being attached to.
        entity: Entity,
        /// Diagnostic name of the component kind.
        component: &'static str,
    },

    /// A system of this kind is already registered in this world.
    #[error("system {system} is already registered")]
    DuplicateSystem {
        /// Diagnostic name of the system kind.
        system: &'static str,
    },
}
