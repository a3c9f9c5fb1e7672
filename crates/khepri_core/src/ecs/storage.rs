//! # Component Storage
//!
//! One sparse column per component kind, indexed by entity id. Columns
//! grow to fit the highest id seen; out-of-range reads are "absent",
//! never an error.
//!
//! Removal is two-phase. Detaching clears the entity's component bit
//! immediately - matching must reflect the change within the same tick
//! - but the instance itself is only released back to its pool during
//! [`ComponentStore::clean`], after every manager and system has been
//! notified of the structural change. Nothing observes a recycled
//! instance mid-notification.

use std::any::Any;

use super::bits::BitSet;
use super::component::{Component, ComponentRegistry};
use super::entity::{Entity, EntityStore};
use crate::memory::pool::ComponentPool;

/// Type-erased view of one kind's column, enough for teardown paths
/// that do not know the concrete kind.
trait Column: Any {
    /// Moves the slot at `index` (if occupied) back into the pool.
    fn release(&mut self, index: usize);

    /// Borrows the component at `index` as its dyn form.
    fn get_dyn(&self, index: usize) -> Option<&dyn Component>;
}

/// Sparse slot array plus free-list pool for a single kind.
struct TypedColumn<C: Component> {
    /// entity id -> instance; `None` means absent.
    slots: Vec<Option<C>>,
    /// Recycler for detached instances.
    pool: ComponentPool<C>,
}

impl<C: Component> TypedColumn<C> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            pool: ComponentPool::new(),
        }
    }

    /// Stores `component` at `index`. An instance already in the slot
    /// is released to the pool first: add replaces and frees the
    /// previous.
    fn put(&mut self, index: usize, component: C) {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        if let Some(previous) = self.slots[index].replace(component) {
            self.pool.release(previous);
        }
    }

    fn slot(&self, index: usize) -> Option<&C> {
        self.slots.get(index)?.as_ref()
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut C> {
        self.slots.get_mut(index)?.as_mut()
    }
}

impl<C: Component> Column for TypedColumn<C> {
    fn release(&mut self, index: usize) {
        if let Some(component) = self.slots.get_mut(index).and_then(Option::take) {
            self.pool.release(component);
        }
    }

    fn get_dyn(&self, index: usize) -> Option<&dyn Component> {
        self.slot(index).map(|c| c as &dyn Component)
    }
}

/// Owns every component instance in the world, keyed by
/// (kind index, entity id).
///
/// The store also owns the [`ComponentRegistry`] that assigns kind
/// indices, and the two deferred-release queues: entities whose whole
/// component set is being torn down, and individually detached
/// (entity, kind) pairs.
#[derive(Default)]
pub struct ComponentStore {
    /// Kind index assignment, owned by this world.
    registry: ComponentRegistry,
    /// kind index -> column; `None` until the kind is first attached.
    columns: Vec<Option<Box<dyn Column>>>,
    /// Entities queued for full component teardown.
    deleted: Vec<Entity>,
    /// Individually detached pairs awaiting release.
    detached: Vec<(Entity, usize)>,
}

impl ComponentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-sized for `kinds` component kinds.
    #[must_use]
    pub fn with_capacity(kinds: usize) -> Self {
        Self {
            registry: ComponentRegistry::with_capacity(kinds),
            columns: Vec::with_capacity(kinds),
            ..Self::default()
        }
    }

    /// Read access to the kind registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Mutable registry access for registration paths.
    pub(crate) fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Obtains a detached instance of kind `C`: recycled from the pool
    /// when possible, freshly defaulted otherwise. Either way the
    /// instance is at its zero-equivalent state.
    pub fn create<C: Component + Default>(&mut self) -> C {
        let index = self.registry.index_of::<C>();
        self.column_or_insert::<C>(index).pool.obtain()
    }

    /// Stores `component` for `entity`, returning the kind index so
    /// the caller can set the entity's component bit.
    pub(crate) fn attach<C: Component>(&mut self, entity: Entity, component: C) -> usize {
        let index = self.registry.index_of::<C>();
        self.column_or_insert::<C>(index).put(entity.index(), component);
        index
    }

    /// Queues the (entity, kind) pair for release at the next
    /// [`clean`](Self::clean). The caller clears the component bit.
    pub(crate) fn queue_detach(&mut self, entity: Entity, kind: usize) {
        self.detached.push((entity, kind));
    }

    /// Queues `entity` for full component teardown at the next
    /// [`clean`](Self::clean).
    pub(crate) fn on_deleted(&mut self, entity: Entity) {
        self.deleted.push(entity);
    }

    /// Returns the component of kind `C` for `entity`, if attached.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        let index = self.registry.try_index_of::<C>()?;
        self.slot::<C>(index, entity)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let index = self.registry.try_index_of::<C>()?;
        self.slot_mut::<C>(index, entity)
    }

    /// Snapshot of every component attached to an entity, built by
    /// scanning its component bits. The returned collection does not
    /// track later changes.
    #[must_use]
    pub fn components_for_bits<'a>(&'a self, bits: &BitSet, entity: Entity) -> Vec<&'a dyn Component> {
        bits.ones()
            .filter_map(|kind| {
                self.columns
                    .get(kind)
                    .and_then(Option::as_deref)
                    .and_then(|column| column.get_dyn(entity.index()))
            })
            .collect()
    }

    /// Number of instances parked in kind `C`'s pool.
    ///
    /// Diagnostic accessor; tests use it to prove detach recycles.
    #[must_use]
    pub fn pool_free_count<C: Component>(&self) -> usize {
        self.registry
            .try_index_of::<C>()
            .and_then(|index| self.column::<C>(index))
            .map_or(0, |column| column.pool.free_count())
    }

    /// Releases every queued deletion and detachment back to the
    /// pools.
    ///
    /// Runs only after all observers have been notified: first the
    /// full teardown of delete-queued entities (their component bits
    /// are cleared here), then the individually detached pairs. A pair
    /// whose kind was re-attached after the detach is skipped - the
    /// new instance stays live.
    pub(crate) fn clean(&mut self, entities: &mut EntityStore) {
        let mut dead = std::mem::take(&mut self.deleted);
        for entity in dead.drain(..) {
            if let Some(record) = entities.record_mut(entity) {
                for kind in record.component_bits.ones() {
                    if let Some(column) = self.columns.get_mut(kind).and_then(Option::as_deref_mut) {
                        column.release(entity.index());
                    }
                }
                record.component_bits.clear_all();
            }
        }
        self.deleted = dead;

        let mut pairs = std::mem::take(&mut self.detached);
        for (entity, kind) in pairs.drain(..) {
            let reattached = entities
                .record(entity)
                .is_some_and(|record| record.component_bits.get(kind));
            if reattached {
                continue;
            }
            if let Some(column) = self.columns.get_mut(kind).and_then(Option::as_deref_mut) {
                column.release(entity.index());
            }
        }
        self.detached = pairs;
    }

    /// Direct slot read for an already-resolved kind index.
    pub(crate) fn slot<C: Component>(&self, index: usize, entity: Entity) -> Option<&C> {
        self.column::<C>(index)?.slot(entity.index())
    }

    /// Direct mutable slot read for an already-resolved kind index.
    pub(crate) fn slot_mut<C: Component>(&mut self, index: usize, entity: Entity) -> Option<&mut C> {
        self.column_mut::<C>(index)?.slot_mut(entity.index())
    }

    fn column<C: Component>(&self, index: usize) -> Option<&TypedColumn<C>> {
        let column: &dyn Column = self.columns.get(index)?.as_deref()?;
        let any: &dyn Any = column;
        any.downcast_ref::<TypedColumn<C>>()
    }

    fn column_mut<C: Component>(&mut self, index: usize) -> Option<&mut TypedColumn<C>> {
        let column: &mut dyn Column = self.columns.get_mut(index)?.as_deref_mut()?;
        let any: &mut dyn Any = column;
        any.downcast_mut::<TypedColumn<C>>()
    }

    fn column_or_insert<C: Component>(&mut self, index: usize) -> &mut TypedColumn<C> {
        if index >= self.columns.len() {
            self.columns.resize_with(index + 1, || None);
        }
        let column: &mut dyn Column = self.columns[index]
            .get_or_insert_with(|| Box::new(TypedColumn::<C>::new()))
            .as_mut();
        let any: &mut dyn Any = column;
        any.downcast_mut::<TypedColumn<C>>()
            .expect("component kind index bound to a different column type")
    }
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("kinds", &self.registry.len())
            .field("pending_deleted", &self.deleted.len())
            .field("pending_detached", &self.detached.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Fuel {
        x: i32,
    }

    impl Component for Fuel {
        fn reset(&mut self) {
            self.x = 0;
        }
    }

    #[derive(Debug, Default)]
    struct Beacon {
        lit: bool,
    }

    impl Component for Beacon {
        fn reset(&mut self) {
            self.lit = false;
        }
    }

    fn store_with_entity() -> (ComponentStore, EntityStore, Entity) {
        let mut entities = EntityStore::new();
        let entity = entities.create_instance();
        (ComponentStore::new(), entities, entity)
    }

    #[test]
    fn test_attach_then_get() {
        let (mut store, _entities, e) = store_with_entity();
        store.attach(e, Fuel { x: 9 });
        assert_eq!(store.get::<Fuel>(e), Some(&Fuel { x: 9 }));
        assert_eq!(store.get::<Beacon>(e).map(|b| b.lit), None);
    }

    #[test]
    fn test_replace_in_place_frees_previous() {
        let (mut store, _entities, e) = store_with_entity();
        store.attach(e, Fuel { x: 1 });
        store.attach(e, Fuel { x: 2 });

        // The new instance is live; the old one went back to the pool
        // with its field reset.
        assert_eq!(store.get::<Fuel>(e), Some(&Fuel { x: 2 }));
        assert_eq!(store.pool_free_count::<Fuel>(), 1);
        assert_eq!(store.create::<Fuel>(), Fuel { x: 0 });
        assert_eq!(store.pool_free_count::<Fuel>(), 0);
    }

    #[test]
    fn test_detach_is_deferred_until_clean() {
        let (mut store, mut entities, e) = store_with_entity();
        let kind = store.attach(e, Fuel { x: 5 });
        store.queue_detach(e, kind);

        // Slot still occupied mid-cycle; released only by clean().
        assert!(store.get::<Fuel>(e).is_some());
        store.clean(&mut entities);
        assert!(store.get::<Fuel>(e).is_none());
        assert_eq!(store.pool_free_count::<Fuel>(), 1);
    }

    #[test]
    fn test_detach_then_reattach_keeps_new_instance() {
        let (mut store, mut entities, e) = store_with_entity();
        let kind = store.attach(e, Fuel { x: 5 });
        store.queue_detach(e, kind);
        let kind_again = store.attach(e, Fuel { x: 6 });
        assert_eq!(kind, kind_again);
        if let Some(record) = entities.record_mut(e) {
            record.component_bits.set(kind);
        }

        store.clean(&mut entities);
        // Replacement released the first instance; the re-attached one
        // survives the detach that was queued before it.
        assert_eq!(store.get::<Fuel>(e), Some(&Fuel { x: 6 }));
        assert_eq!(store.pool_free_count::<Fuel>(), 1);
    }

    #[test]
    fn test_deleted_entity_teardown_releases_everything() {
        let (mut store, mut entities, e) = store_with_entity();
        let fuel_kind = store.attach(e, Fuel { x: 5 });
        let beacon_kind = store.attach(e, Beacon { lit: true });
        if let Some(record) = entities.record_mut(e) {
            record.component_bits.set(fuel_kind);
            record.component_bits.set(beacon_kind);
        }

        store.on_deleted(e);
        store.clean(&mut entities);

        assert!(store.get::<Fuel>(e).is_none());
        assert!(store.get::<Beacon>(e).is_none());
        assert_eq!(store.pool_free_count::<Fuel>(), 1);
        assert_eq!(store.pool_free_count::<Beacon>(), 1);
        assert!(entities.component_bits(e).unwrap().is_empty());
    }

    #[test]
    fn test_components_for_bits_snapshot() {
        let (mut store, mut entities, e) = store_with_entity();
        let fuel_kind = store.attach(e, Fuel { x: 1 });
        let beacon_kind = store.attach(e, Beacon { lit: true });
        if let Some(record) = entities.record_mut(e) {
            record.component_bits.set(fuel_kind);
            record.component_bits.set(beacon_kind);
        }

        let bits = entities.component_bits(e).unwrap().clone();
        let snapshot = store.components_for_bits(&bits, e);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_out_of_range_read_is_absent() {
        let mut store = ComponentStore::new();
        let mut entities = EntityStore::new();
        let first = entities.create_instance();
        store.attach(first, Fuel { x: 1 });

        let far = Entity::new(4000);
        assert!(store.get::<Fuel>(far).is_none());
    }
}
