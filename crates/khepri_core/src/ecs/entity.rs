//! # Entity Identity
//!
//! Entities are lightweight integer handles. The id is unique among
//! currently-active entities and is recycled after release - most
//! recently released first - so the id space stays dense and sparse
//! arrays indexed by id stay small.
//!
//! Per-entity bookkeeping (which component kinds are attached, which
//! systems hold the entity) lives in pooled records inside the store,
//! not in the handle: the handle is `Copy` and safe to queue.

use super::bits::BitSet;

/// A handle to an entity: its integer id.
///
/// Ids are reused after release, so a handle held across a delete may
/// end up referring to a different entity. The runtime itself never
/// lets a queued handle outlive its id - ids are only recycled during
/// the cleanup step, after every queue mentioning them has drained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Builds a handle from a raw id.
    #[inline]
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the id widened for array indexing.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity[{}]", self.0)
    }
}

/// Recycles integer entity ids.
///
/// `check_out` pops the most recently released id (stack discipline)
/// before minting new ones, starting at 0. `check_in` must be called
/// exactly once per checked-out id; there is no double-check-in defense
/// in the hot path. The runtime centralizes check-in inside entity
/// release so caller discipline reduces to one call site.
#[derive(Debug, Default)]
pub struct IdPool {
    /// Released ids, most recent on top.
    free: Vec<u32>,
    /// Next never-used id.
    next_id: u32,
}

impl IdPool {
    /// Creates an empty pool; the first checkout returns 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an id: a recycled one if any exist, else the next fresh
    /// integer.
    #[inline]
    pub fn check_out(&mut self) -> u32 {
        if let Some(id) = self.free.pop() {
            id
        } else {
            let id = self.next_id;
            self.next_id += 1;
            id
        }
    }

    /// Returns `id` to the free stack for reuse.
    #[inline]
    pub fn check_in(&mut self, id: u32) {
        self.free.push(id);
    }
}

/// Per-entity bookkeeping, pooled across lifecycles.
#[derive(Debug, Default)]
pub(crate) struct EntityRecord {
    /// Which component-kind indices are currently attached.
    pub(crate) component_bits: BitSet,
    /// Which systems currently hold this entity in their actives.
    pub(crate) system_bits: BitSet,
}

impl EntityRecord {
    /// Clears both bitsets, keeping their allocations for the next
    /// lifecycle.
    fn recycle(&mut self) {
        self.component_bits.clear_all();
        self.system_bits.clear_all();
    }
}

/// Owns the entity identity lifecycle.
///
/// Sparse slot array id -> record (`None` when the id is not checked
/// out), a disabled-flag bitset, and running counters. Creation takes a
/// record from the pool and an id from the [`IdPool`]; release - always
/// deferred to the cleanup step - returns both.
#[derive(Debug, Default)]
pub struct EntityStore {
    /// id -> record; `None` when the id is free.
    slots: Vec<Option<EntityRecord>>,
    /// Ids that have been activated (added and not yet released).
    active: BitSet,
    /// Ids explicitly disabled; orthogonal to activity.
    disabled: BitSet,
    /// Entities queued for release at the next cleanup.
    pending_release: Vec<Entity>,
    /// Id recycler.
    id_pool: IdPool,
    /// Record recycler; every parked record has cleared bitsets.
    record_pool: Vec<EntityRecord>,
    /// Currently-active entity count.
    active_count: usize,
    /// Entities created since start (includes never-added ones).
    created: u64,
    /// Entities activated since start.
    added: u64,
    /// Entities released since start.
    deleted: u64,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-sized for `capacity` simultaneous entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            active: BitSet::with_capacity(capacity),
            disabled: BitSet::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Obtains a fresh entity: recycled record, recycled-or-minted id,
    /// cleared bitsets. The entity is *not* active until it has been
    /// added to the world and the next tick has drained the queue.
    pub fn create_instance(&mut self) -> Entity {
        let id = self.id_pool.check_out();
        let index = id as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(self.record_pool.pop().unwrap_or_default());
        self.created += 1;
        Entity::new(id)
    }

    /// Marks `entity` active. Idempotent.
    pub(crate) fn on_added(&mut self, entity: Entity) {
        if !self.active.get(entity.index()) {
            self.active.set(entity.index());
            self.active_count += 1;
            self.added += 1;
        }
    }

    /// Clears the disabled flag. Does not affect activity.
    pub(crate) fn on_enabled(&mut self, entity: Entity) {
        self.disabled.clear(entity.index());
    }

    /// Sets the disabled flag. Does not affect activity.
    pub(crate) fn on_disabled(&mut self, entity: Entity) {
        self.disabled.set(entity.index());
    }

    /// Queues `entity` for release at the next cleanup.
    pub(crate) fn on_deleted(&mut self, entity: Entity) {
        self.pending_release.push(entity);
    }

    /// Releases every queued entity: clears its slot and disabled flag,
    /// adjusts counters, and returns the record and the id to their
    /// pools.
    ///
    /// The active count only drops for entities that were actually
    /// activated - an entity created and deleted without ever being
    /// added must not drift the counter.
    pub(crate) fn clean(&mut self) {
        let mut batch = std::mem::take(&mut self.pending_release);
        for entity in batch.drain(..) {
            let index = entity.index();
            if let Some(mut record) = self.slots.get_mut(index).and_then(Option::take) {
                record.recycle();
                self.record_pool.push(record);
                if self.active.get(index) {
                    self.active.clear(index);
                    self.active_count -= 1;
                }
                self.disabled.clear(index);
                self.deleted += 1;
                self.id_pool.check_in(entity.id());
            }
        }
        self.pending_release = batch;
    }

    /// Checks whether `entity` has a checked-out record (created and
    /// not yet released).
    #[inline]
    pub(crate) fn exists(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index())
            .is_some_and(Option::is_some)
    }

    /// Returns the handle for a raw id, if that id is currently
    /// checked out.
    #[must_use]
    pub fn entity(&self, id: u32) -> Option<Entity> {
        let entity = Entity::new(id);
        self.exists(entity).then_some(entity)
    }

    /// Checks whether `entity` has been added to the world and not yet
    /// released. Disabled entities still count as active.
    #[inline]
    #[must_use]
    pub fn is_active(&self, entity: Entity) -> bool {
        self.active.get(entity.index())
    }

    /// Checks whether `entity` is enabled. Entities are enabled by
    /// default; only an explicit disable flips this.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, entity: Entity) -> bool {
        !self.disabled.get(entity.index())
    }

    /// Returns the component-kind bitset of `entity`, if it exists.
    #[inline]
    #[must_use]
    pub fn component_bits(&self, entity: Entity) -> Option<&BitSet> {
        self.record(entity).map(|r| &r.component_bits)
    }

    /// Internal record access.
    #[inline]
    pub(crate) fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        self.slots.get(entity.index())?.as_ref()
    }

    /// Internal mutable record access.
    #[inline]
    pub(crate) fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        self.slots.get_mut(entity.index())?.as_mut()
    }

    /// Returns how many entities are currently active.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Returns how many entities have been created since start. A
    /// created entity may never be added, so this is always >= the
    /// added count.
    #[inline]
    #[must_use]
    pub fn total_created(&self) -> u64 {
        self.created
    }

    /// Returns how many entities have been activated since start.
    #[inline]
    #[must_use]
    pub fn total_added(&self) -> u64 {
        self.added
    }

    /// Returns how many entities have been released since start.
    #[inline]
    #[must_use]
    pub fn total_deleted(&self) -> u64 {
        self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_pool_stack_discipline() {
        let mut pool = IdPool::new();
        assert_eq!(pool.check_out(), 0);
        assert_eq!(pool.check_out(), 1);
        assert_eq!(pool.check_out(), 2);

        pool.check_in(0);
        pool.check_in(2);

        // Most recently released first, then minting resumes.
        assert_eq!(pool.check_out(), 2);
        assert_eq!(pool.check_out(), 0);
        assert_eq!(pool.check_out(), 3);
    }

    #[test]
    fn test_create_activate_release_cycle() {
        let mut store = EntityStore::new();
        let e = store.create_instance();

        assert!(store.exists(e));
        assert!(!store.is_active(e));
        assert_eq!(store.total_created(), 1);

        store.on_added(e);
        assert!(store.is_active(e));
        assert_eq!(store.active_count(), 1);

        store.on_deleted(e);
        store.clean();

        assert!(!store.exists(e));
        assert!(!store.is_active(e));
        assert_eq!(store.active_count(), 0);
        assert_eq!(store.total_deleted(), 1);
    }

    #[test]
    fn test_ids_are_reused_lifo() {
        let mut store = EntityStore::new();
        let a = store.create_instance();
        let b = store.create_instance();
        store.on_added(a);
        store.on_added(b);

        store.on_deleted(a);
        store.on_deleted(b);
        store.clean();

        // b was released last, so its id comes back first.
        assert_eq!(store.create_instance().id(), b.id());
        assert_eq!(store.create_instance().id(), a.id());
    }

    #[test]
    fn test_recycled_record_is_clean() {
        let mut store = EntityStore::new();
        let e = store.create_instance();
        store.on_added(e);
        store
            .record_mut(e)
            .map(|r| {
                r.component_bits.set(3);
                r.system_bits.set(7);
            })
            .unwrap();

        store.on_deleted(e);
        store.clean();

        let reborn = store.create_instance();
        assert_eq!(reborn.id(), e.id());
        let record = store.record(reborn).unwrap();
        assert!(record.component_bits.is_empty());
        assert!(record.system_bits.is_empty());
    }

    #[test]
    fn test_lookup_by_raw_id() {
        let mut store = EntityStore::new();
        let e = store.create_instance();
        assert_eq!(store.entity(e.id()), Some(e));
        assert_eq!(store.entity(99), None);

        store.on_deleted(e);
        store.clean();
        assert_eq!(store.entity(e.id()), None);
    }

    #[test]
    fn test_disable_enable_flags() {
        let mut store = EntityStore::new();
        let e = store.create_instance();
        store.on_added(e);

        assert!(store.is_enabled(e));
        store.on_disabled(e);
        assert!(!store.is_enabled(e));
        assert!(store.is_active(e));

        store.on_enabled(e);
        assert!(store.is_enabled(e));
    }

    #[test]
    fn test_never_added_delete_does_not_drift_active_count() {
        let mut store = EntityStore::new();
        let e = store.create_instance();
        store.on_deleted(e);
        store.clean();
        assert_eq!(store.active_count(), 0);
        assert_eq!(store.total_added(), 0);
        assert_eq!(store.total_deleted(), 1);
    }

    #[test]
    fn test_disabled_flag_cleared_on_release() {
        let mut store = EntityStore::new();
        let e = store.create_instance();
        store.on_added(e);
        store.on_disabled(e);

        store.on_deleted(e);
        store.clean();

        let reborn = store.create_instance();
        assert_eq!(reborn.id(), e.id());
        assert!(store.is_enabled(reborn));
    }
}
