//! # Aspects
//!
//! An aspect is the matching predicate of a system: three bitsets over
//! component-kind indices describing which combinations the system
//! accepts.
//!
//! - `all`: the entity must carry every listed kind.
//! - `any`: the entity must carry at least one listed kind (ignored
//!   when empty).
//! - `exclude`: the entity must carry none of the listed kinds.
//!   Exclusion always wins - it is checked last and can veto both
//!   prior checks.
//!
//! An aspect with empty `all` and `any` is a *dummy* matcher: it
//! matches nothing, for systems that process no entities but still
//! tick every frame.

use super::bits::BitSet;
use super::component::{Component, ComponentRegistry};

/// Registers a component kind and yields its dense index.
type Registrar = fn(&mut ComponentRegistry) -> usize;

/// Declarative description of an aspect, resolved at system
/// registration.
///
/// The builder records component kinds as registrar function pointers;
/// the world resolves them against its own [`ComponentRegistry`] when
/// the system is registered. This keeps kind indices world-owned - no
/// static registry is consulted at any point.
///
/// # Example
///
/// ```rust,ignore
/// AspectBuilder::new()
///     .all::<Position>()
///     .all::<Velocity>()
///     .exclude::<Frozen>()
/// ```
#[derive(Clone, Debug, Default)]
pub struct AspectBuilder {
    all: Vec<Registrar>,
    any: Vec<Registrar>,
    exclude: Vec<Registrar>,
}

impl AspectBuilder {
    /// Starts an empty description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the description of a dummy aspect - one that matches no
    /// entity. Use this for systems that tick without processing
    /// entities.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Requires the entity to carry kind `C`.
    #[must_use]
    pub fn all<C: Component>(mut self) -> Self {
        self.all.push(ComponentRegistry::index_of::<C>);
        self
    }

    /// Requires the entity to carry at least one of the `any` kinds.
    #[must_use]
    pub fn any<C: Component>(mut self) -> Self {
        self.any.push(ComponentRegistry::index_of::<C>);
        self
    }

    /// Rejects any entity carrying kind `C`, regardless of the other
    /// checks.
    #[must_use]
    pub fn exclude<C: Component>(mut self) -> Self {
        self.exclude.push(ComponentRegistry::index_of::<C>);
        self
    }

    /// Resolves the recorded kinds against `registry` into an
    /// immutable [`Aspect`].
    pub(crate) fn build(self, registry: &mut ComponentRegistry) -> Aspect {
        let mut resolve = |registrars: Vec<Registrar>| {
            let mut bits = BitSet::new();
            for registrar in registrars {
                bits.set(registrar(registry));
            }
            bits
        };

        Aspect {
            all: resolve(self.all),
            any: resolve(self.any),
            exclude: resolve(self.exclude),
        }
    }
}

/// An immutable entity-matching predicate over component-kind bitsets.
#[derive(Clone, Debug)]
pub struct Aspect {
    all: BitSet,
    any: BitSet,
    exclude: BitSet,
}

impl Aspect {
    /// Evaluates the predicate against an entity's component bits.
    ///
    /// `all` is checked first (every bit must be present), then `any`
    /// (some overlap required when non-empty), then `exclude` - last,
    /// so it can veto either prior result. A dummy aspect matches
    /// nothing.
    #[must_use]
    pub fn matches(&self, component_bits: &BitSet) -> bool {
        if self.is_dummy() {
            return false;
        }

        let mut interested = true;

        if !self.all.is_empty() {
            interested = component_bits.contains_all(&self.all);
        }

        if interested && !self.any.is_empty() {
            interested = self.any.intersects(component_bits);
        }

        if interested && !self.exclude.is_empty() {
            interested = !self.exclude.intersects(component_bits);
        }

        interested
    }

    /// Checks whether this aspect can never match (empty `all` and
    /// `any`). Dummy systems never hold entities but still tick.
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.all.is_empty() && self.any.is_empty()
    }
}
