//! Core [`Component`] trait and the [`ComponentKind`] type tag.
//!
//! ## Type Identity
//!
//! A component's kind is its Rust [`TypeId`], captured at compile time. Two
//! unrelated types that happen to share a name are always distinct kinds.
//! The human-readable name travels alongside purely for logs and errors.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The core component trait.
///
/// Components are plain data records. Any `'static` type can be one; the
/// only thing to decide is the name used in diagnostics.
///
/// # Examples
///
/// ```rust
/// use ecs_component::{Component, ComponentKind};
///
/// #[derive(Debug, Clone, Copy)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str {
///         "Health"
///     }
/// }
///
/// assert_eq!(ComponentKind::of::<Health>().name(), "Health");
/// ```
pub trait Component: Any {
    /// A human-readable name for this component type.
    ///
    /// Defaults to the fully qualified Rust type name.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A compile-time-distinct identifier for a component type.
///
/// Equality and hashing consider only the [`TypeId`]; the name is carried for
/// display.
#[derive(Debug, Clone, Copy)]
pub struct ComponentKind {
    id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// Returns the kind of component type `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: C::type_name(),
        }
    }

    /// The diagnostic name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// The underlying [`TypeId`].
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.id
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
