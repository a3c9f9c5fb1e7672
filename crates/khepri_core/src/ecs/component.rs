//! # Component Kinds
//!
//! Components are pure data. Each distinct kind gets a dense integer
//! index on first use, assigned by a registry owned by the world - not
//! by a process-wide static - so parallel worlds and tests get
//! independent index spaces.
//!
//! Instances are recycled through per-kind pools; the [`Component::reset`]
//! hook runs every time an instance is handed back, guaranteeing no
//! stale field values leak across reuse.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use super::entity::Entity;
use super::world::WorldState;

/// Marker trait for attachable data.
///
/// Kinds must be `'static` (for type-identity lookup) and provide a
/// zero-argument [`reset`](Component::reset) that fully clears prior
/// state. A kind that is attached via the pooled
/// [`create_component`](super::world::WorldState::create_component)
/// path must also implement `Default`.
///
/// # Example
///
/// ```rust
/// use khepri_core::Component;
///
/// #[derive(Debug, Default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn reset(&mut self) {
///         self.current = 0.0;
///         self.max = 0.0;
///     }
/// }
/// ```
pub trait Component: Any + Send + Sync {
    /// Clears all fields back to their zero-equivalent values.
    ///
    /// Invoked whenever the instance is returned to its pool.
    fn reset(&mut self);
}

/// Assigns each component kind a stable small integer index.
///
/// Indices are handed out sequentially on first encounter and cached;
/// they are monotonic and never reused, even if a kind stops being
/// used. The index space is bounded by the number of *distinct kinds
/// ever seen*, not by what is currently attached.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Kind identity -> dense index.
    indices: HashMap<TypeId, usize>,
    /// Kind names by index, for diagnostics.
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-sized for `kinds` component kinds.
    #[must_use]
    pub fn with_capacity(kinds: usize) -> Self {
        Self {
            indices: HashMap::with_capacity(kinds),
            names: Vec::with_capacity(kinds),
        }
    }

    /// Returns the index for kind `C`, assigning the next sequential
    /// index on first encounter.
    pub fn index_of<C: Component>(&mut self) -> usize {
        let next = self.indices.len();
        let name = type_name::<C>();
        let names = &mut self.names;
        *self.indices.entry(TypeId::of::<C>()).or_insert_with(|| {
            names.push(name);
            tracing::trace!(kind = name, index = next, "component kind registered");
            next
        })
    }

    /// Returns the index for kind `C` if it has ever been registered.
    #[must_use]
    pub fn try_index_of<C: Component>(&self) -> Option<usize> {
        self.indices.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the number of kinds registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Checks whether no kind has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the name of the kind behind `index`, if assigned.
    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }
}

/// High-performance cached accessor for one component kind.
///
/// A mapper resolves its kind's index once - typically in a system's
/// `initialize`, the explicit binding step - and afterwards reads
/// components with a plain double index, no registry lookup.
///
/// [`get`](ComponentMapper::get) is the unchecked-fast path: it assumes
/// the entity possesses the component and panics otherwise.
/// [`get_safe`](ComponentMapper::get_safe) bounds-checks and returns
/// `None` for absent components.
pub struct ComponentMapper<C: Component> {
    /// Resolved dense index of `C`.
    index: usize,
    /// Marker for the kind; a mapper owns no data.
    _marker: PhantomData<fn() -> C>,
}

// Manual impls: a mapper is a plain index regardless of whether `C`
// itself is `Copy` or `Debug`.
impl<C: Component> Clone for ComponentMapper<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Component> Copy for ComponentMapper<C> {}

impl<C: Component> std::fmt::Debug for ComponentMapper<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentMapper")
            .field("kind", &type_name::<C>())
            .field("index", &self.index)
            .finish()
    }
}

impl<C: Component> ComponentMapper<C> {
    /// Builds a mapper for an already-resolved kind index.
    pub(crate) const fn with_index(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    /// Fast retrieval of the component for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not possess the component. In most
    /// scenarios - iterating a system's actives whose aspect requires
    /// the kind - possession is already guaranteed.
    #[inline]
    #[must_use]
    pub fn get<'a>(&self, world: &'a WorldState, entity: Entity) -> &'a C {
        match self.get_safe(world, entity) {
            Some(component) => component,
            None => panic!("{entity} has no {}", type_name::<C>()),
        }
    }

    /// Fast mutable retrieval of the component for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity does not possess the component.
    #[inline]
    pub fn get_mut<'a>(&self, world: &'a mut WorldState, entity: Entity) -> &'a mut C {
        match world.components_mut().slot_mut::<C>(self.index, entity) {
            Some(component) => component,
            None => panic!("{entity} has no {}", type_name::<C>()),
        }
    }

    /// Safe retrieval; returns `None` when the component is absent.
    #[inline]
    #[must_use]
    pub fn get_safe<'a>(&self, world: &'a WorldState, entity: Entity) -> Option<&'a C> {
        world.components().slot::<C>(self.index, entity)
    }

    /// Safe mutable retrieval; returns `None` when absent.
    #[inline]
    pub fn get_safe_mut<'a>(&self, world: &'a mut WorldState, entity: Entity) -> Option<&'a mut C> {
        world.components_mut().slot_mut::<C>(self.index, entity)
    }

    /// Checks whether `entity` currently has this component kind.
    #[inline]
    #[must_use]
    pub fn has(&self, world: &WorldState, entity: Entity) -> bool {
        self.get_safe(world, entity).is_some()
    }
}
