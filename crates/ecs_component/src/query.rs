//! Queries: the component requirements a system declares.
//!
//! A [`Query`] is an immutable, ordered list of distinct [`ComponentKind`]s.
//! An entity matches when its component set contains every kind in the list.

use std::collections::HashSet;

use crate::component::{Component, ComponentKind};

/// Anything that can answer "does this set contain kind `k`?".
///
/// Implemented by the registry's per-entity record so queries can be tested
/// against it without copying.
pub trait KindSet {
    /// Returns `true` if `kind` is present in the set.
    fn has_kind(&self, kind: ComponentKind) -> bool;
}

impl KindSet for [ComponentKind] {
    fn has_kind(&self, kind: ComponentKind) -> bool {
        self.contains(&kind)
    }
}

impl KindSet for HashSet<ComponentKind> {
    fn has_kind(&self, kind: ComponentKind) -> bool {
        self.contains(&kind)
    }
}

/// The ordered set of component kinds a system requires.
///
/// Built through [`Query::of`] and [`Query::with`], so a query is never
/// empty. Adding a kind twice has no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    kinds: Vec<ComponentKind>,
}

impl Query {
    /// Start a query requiring component `C`.
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            kinds: vec![ComponentKind::of::<C>()],
        }
    }

    /// Additionally require component `C`.
    #[must_use]
    pub fn with<C: Component>(self) -> Self {
        self.with_kind(ComponentKind::of::<C>())
    }

    /// Additionally require `kind`.
    #[must_use]
    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    /// Build a query from a runtime list of kinds.
    ///
    /// Returns `None` if `kinds` is empty.
    #[must_use]
    pub fn from_kinds<I>(kinds: I) -> Option<Self>
    where
        I: IntoIterator<Item = ComponentKind>,
    {
        let mut kinds = kinds.into_iter();
        let first = kinds.next()?;
        let query = kinds.fold(
            Self {
                kinds: vec![first],
            },
            Self::with_kind,
        );
        Some(query)
    }

    /// The required kinds, in declaration order.
    #[must_use]
    pub fn kinds(&self) -> &[ComponentKind] {
        &self.kinds
    }

    /// Returns `true` if `kind` is one of the required kinds.
    #[must_use]
    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Number of required kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false` for queries built through the public constructors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Returns `true` if `set` contains every required kind.
    #[must_use]
    pub fn is_satisfied_by<S: KindSet + ?Sized>(&self, set: &S) -> bool {
        self.kinds.iter().all(|&kind| set.has_kind(kind))
    }

    /// Like [`is_satisfied_by`](Self::is_satisfied_by), but treats `removed`
    /// as already absent from `set`.
    ///
    /// Removal notifications fire while the component is still stored, so
    /// this is the check that tells whether the entity will still match once
    /// the removal completes.
    #[must_use]
    pub fn is_satisfied_without<S: KindSet + ?Sized>(
        &self,
        set: &S,
        removed: ComponentKind,
    ) -> bool {
        self.kinds
            .iter()
            .all(|&kind| kind != removed && set.has_kind(kind))
    }
}
