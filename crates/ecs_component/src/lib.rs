//! # ecs_component
//!
//! The leaf vocabulary of the ECS: what an entity is, what a component is,
//! and how a system describes the components it cares about.
//!
//! This crate provides:
//!
//! - [`Entity`]: opaque random (v4 UUID) entity identifiers.
//! - [`Component`] trait: the marker all component data implements.
//! - [`ComponentKind`]: a compile-time-distinct type tag for a component type.
//! - [`Query`]: the ordered, non-empty set of kinds a system requires.

pub mod component;
pub mod entity;
pub mod query;

pub use component::{Component, ComponentKind};
pub use entity::Entity;
pub use query::{KindSet, Query};
