//! # World
//!
//! The composition root and tick scheduler. The world owns the entity
//! and component stores, the registered managers and systems, and five
//! pending-change queues: added, changed, deleted, enabled, disabled.
//!
//! Structural mutations never land immediately - they are queued, then
//! applied by the next [`World::process`] in a fixed order:
//!
//! ```text
//! Tick N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. DRAIN added    -> activate, notify managers then systems  │
//! │ 2. DRAIN changed  -> re-match every notified system          │
//! │ 3. DRAIN disabled -> unconditional eviction from systems     │
//! │ 4. DRAIN enabled  -> re-match (late enables on dying         │
//! │                      entities still observed this tick)      │
//! │ 5. DRAIN deleted  -> unconditional eviction from systems     │
//! │ 6. CLEAN          -> release components, then entities/ids   │
//! │ 7. RUN            -> each non-passive system, in order       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cleanup step is the only irreversible one and runs strictly
//! after every observer has been notified, so no manager or system
//! ever sees a recycled instance mid-notification. Draining swaps the
//! queue out first: an entity re-queued by a hook lands in the *next*
//! tick's queue, never re-entrantly in the current drain.

use std::any::{type_name, Any};

use super::aspect::Aspect;
use super::bits::BitSet;
use super::component::{Component, ComponentMapper};
use super::entity::{Entity, EntityStore};
use super::manager::Manager;
use super::storage::ComponentStore;
use super::system::System;
use crate::config::WorldConfig;
use crate::error::CoreResult;

/// An ordered, deduplicated queue of entities pending notification.
///
/// A bitset guards against duplicate enqueues, so queueing is
/// idempotent; order of first enqueue is preserved.
#[derive(Debug, Default)]
struct ChangeQueue {
    list: Vec<Entity>,
    queued: BitSet,
}

impl ChangeQueue {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            list: Vec::with_capacity(capacity),
            queued: BitSet::with_capacity(capacity),
        }
    }

    /// Enqueues `entity` unless already queued; returns whether it was
    /// added.
    fn push(&mut self, entity: Entity) -> bool {
        if self.queued.get(entity.index()) {
            return false;
        }
        self.queued.set(entity.index());
        self.list.push(entity);
        true
    }

    /// Removes a pending entry, if present.
    fn cancel(&mut self, entity: Entity) {
        if self.queued.get(entity.index()) {
            self.queued.clear(entity.index());
            self.list.retain(|queued| *queued != entity);
        }
    }

    /// Takes the current batch for draining. Entities queued while the
    /// batch is being notified land in the fresh live queue.
    fn take(&mut self) -> Vec<Entity> {
        self.queued.clear_all();
        std::mem::take(&mut self.list)
    }

    /// Hands the drained batch back so its allocation is reused.
    fn put_back(&mut self, mut batch: Vec<Entity>) {
        batch.clear();
        if self.list.capacity() == 0 {
            self.list = batch;
        }
    }
}

/// The five structural-change queues of a world.
#[derive(Debug, Default)]
struct ChangeQueues {
    added: ChangeQueue,
    changed: ChangeQueue,
    deleted: ChangeQueue,
    enabled: ChangeQueue,
    disabled: ChangeQueue,
}

impl ChangeQueues {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            added: ChangeQueue::with_capacity(capacity),
            changed: ChangeQueue::with_capacity(capacity),
            deleted: ChangeQueue::with_capacity(capacity),
            enabled: ChangeQueue::with_capacity(capacity),
            disabled: ChangeQueue::with_capacity(capacity),
        }
    }
}

/// Everything a hook may touch: stores, queues, delta.
///
/// The world splits this from its system and manager lists so that a
/// running system can mutate world state - queue deletions, attach
/// components, read mappers - while the scheduler iterates the system
/// list. Structural mutations made here are queued and land at the
/// next tick.
#[derive(Debug, Default)]
pub struct WorldState {
    entities: EntityStore,
    components: ComponentStore,
    queues: ChangeQueues,
    delta: f32,
}

impl WorldState {
    fn with_config(config: &WorldConfig) -> Self {
        Self {
            entities: EntityStore::with_capacity(config.entity_capacity),
            components: ComponentStore::with_capacity(config.component_kinds),
            queues: ChangeQueues::with_capacity(config.queue_capacity),
            delta: 0.0,
        }
    }

    /// Creates a new or recycled entity instance with a fresh id and
    /// cleared bitsets. The entity is not part of the world until
    /// [`add_entity`](Self::add_entity) and the next tick.
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create_instance()
    }

    /// Queues `entity` for activation at the next tick.
    pub fn add_entity(&mut self, entity: Entity) {
        if self.entities.exists(entity) {
            self.queues.added.push(entity);
        }
    }

    /// Queues a re-match of `entity` against every system at the next
    /// tick. Call after changing its component set by hand; the attach
    /// and detach paths already queue this for active entities.
    pub fn changed_entity(&mut self, entity: Entity) {
        if self.entities.exists(entity) {
            self.queues.changed.push(entity);
        }
    }

    /// Queues `entity` for deletion. Idempotent: a second delete of an
    /// already-pending entity is a no-op. An entity still pending in
    /// the `added` queue is withdrawn from it - an entity deleted
    /// before it was ever added must never fire `inserted` on any
    /// system.
    pub fn delete_entity(&mut self, entity: Entity) {
        if !self.entities.exists(entity) {
            return;
        }
        if self.queues.deleted.push(entity) {
            self.queues.added.cancel(entity);
        }
    }

    /// Queues `entity` to be re-enabled at the next tick.
    pub fn enable(&mut self, entity: Entity) {
        if self.entities.exists(entity) {
            self.queues.enabled.push(entity);
        }
    }

    /// Queues `entity` to be disabled at the next tick. Disabled
    /// entities stay active but leave every system's actives until
    /// re-enabled.
    pub fn disable(&mut self, entity: Entity) {
        if self.entities.exists(entity) {
            self.queues.disabled.push(entity);
        }
    }

    /// Obtains a pooled (or fresh) instance of kind `C`, detached and
    /// at its zero-equivalent state.
    pub fn create_component<C: Component + Default>(&mut self) -> C {
        self.components.create()
    }

    /// Attaches `component` to `entity`, setting its component bit. An
    /// instance of the same kind already attached is released to the
    /// pool - add replaces and frees the previous. Attaching to an
    /// active entity queues a `changed` re-match.
    pub fn attach<C: Component>(&mut self, entity: Entity, component: C) {
        if !self.entities.exists(entity) {
            return;
        }
        let kind = self.components.attach(entity, component);
        if let Some(record) = self.entities.record_mut(entity) {
            record.component_bits.set(kind);
        }
        if self.entities.is_active(entity) {
            self.queues.changed.push(entity);
        }
    }

    /// Detaches kind `C` from `entity`. The component bit clears
    /// immediately - matching reflects the removal this tick - but the
    /// instance is only released to its pool during the cleanup step,
    /// after all observers have been notified. Detaching a kind the
    /// entity does not carry is a no-op.
    pub fn detach<C: Component>(&mut self, entity: Entity) {
        let Some(kind) = self.components.registry().try_index_of::<C>() else {
            return;
        };
        let Some(record) = self.entities.record_mut(entity) else {
            return;
        };
        if record.component_bits.get(kind) {
            record.component_bits.clear(kind);
            self.components.queue_detach(entity, kind);
            if self.entities.is_active(entity) {
                self.queues.changed.push(entity);
            }
        }
    }

    /// Returns the component of kind `C` for `entity`, or `None` when
    /// absent. Prefer a [`ComponentMapper`] in per-tick code.
    #[must_use]
    pub fn component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.components.get(entity)
    }

    /// Mutable variant of [`component`](Self::component).
    pub fn component_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.components.get_mut(entity)
    }

    /// Snapshot of every component currently attached to `entity`.
    #[must_use]
    pub fn components_of(&self, entity: Entity) -> Vec<&dyn Component> {
        self.entities
            .component_bits(entity)
            .map_or_else(Vec::new, |bits| {
                self.components.components_for_bits(bits, entity)
            })
    }

    /// Builds a cached fast accessor for kind `C`, registering the
    /// kind if needed. Typically called from a system's `initialize`.
    pub fn mapper<C: Component>(&mut self) -> ComponentMapper<C> {
        ComponentMapper::with_index(self.components.registry_mut().index_of::<C>())
    }

    /// Returns the live handle for a raw id, if any entity currently
    /// holds it.
    #[must_use]
    pub fn entity(&self, id: u32) -> Option<Entity> {
        self.entities.entity(id)
    }

    /// Checks whether `entity` has been added and not yet released.
    #[must_use]
    pub fn is_active(&self, entity: Entity) -> bool {
        self.entities.is_active(entity)
    }

    /// Checks whether `entity` is enabled (the default state).
    #[must_use]
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.entities.is_enabled(entity)
    }

    /// Time since the last tick, as set by the embedding loop.
    #[must_use]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Sets the delta for the coming tick.
    pub fn set_delta(&mut self, delta: f32) {
        self.delta = delta;
    }

    /// Read access to the entity store and its counters.
    #[must_use]
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Read access to the component store.
    #[must_use]
    pub fn components(&self) -> &ComponentStore {
        &self.components
    }

    /// Mutable component store access, for mapper-based writes.
    pub fn components_mut(&mut self) -> &mut ComponentStore {
        &mut self.components
    }
}

/// A registered system plus the bookkeeping the world keeps for it:
/// its resolved aspect, its membership bit, and its active list.
struct SystemEntry {
    system: Box<dyn System>,
    aspect: Aspect,
    actives: Vec<Entity>,
    /// This system's index into every entity's system bitset.
    bit: usize,
    passive: bool,
    /// Dummy systems (empty all+any) never hold entities.
    dummy: bool,
}

impl SystemEntry {
    /// Re-evaluates whether `entity` belongs in this system, and
    /// reconciles the active list, the membership bit, and the
    /// inserted/removed hooks.
    fn check(&mut self, state: &mut WorldState, entity: Entity) {
        if self.dummy {
            return;
        }
        let Some(record) = state.entities.record(entity) else {
            return;
        };
        let contains = record.system_bits.get(self.bit);
        let interested = self.aspect.matches(&record.component_bits);

        if interested && !contains {
            self.insert(state, entity);
        } else if !interested && contains {
            self.remove(state, entity);
        }
    }

    /// Unconditional removal for deleted/disabled entities - the
    /// entity is leaving regardless of aspect, so no re-evaluation.
    fn evict(&mut self, state: &mut WorldState, entity: Entity) {
        let member = state
            .entities
            .record(entity)
            .is_some_and(|record| record.system_bits.get(self.bit));
        if member {
            self.remove(state, entity);
        }
    }

    fn insert(&mut self, state: &mut WorldState, entity: Entity) {
        self.actives.push(entity);
        if let Some(record) = state.entities.record_mut(entity) {
            record.system_bits.set(self.bit);
        }
        self.system.inserted(state, entity);
    }

    fn remove(&mut self, state: &mut WorldState, entity: Entity) {
        if let Some(position) = self.actives.iter().position(|active| *active == entity) {
            self.actives.remove(position);
        }
        if let Some(record) = state.entities.record_mut(entity) {
            record.system_bits.clear(self.bit);
        }
        self.system.removed(state, entity);
    }

    fn run(&mut self, state: &mut WorldState) {
        if self.system.check_processing(state.delta) {
            self.system.begin(state);
            self.system.process_entities(state, &self.actives);
            self.system.end(state);
        }
    }
}

/// The primary instance of the runtime.
///
/// Create entities, queue structural changes, register managers and
/// systems, set the delta each loop iteration, and call
/// [`process`](World::process) once per tick.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
/// world.set_system(MovementSystem::default());
/// world.initialize();
///
/// let e = world.create_entity();
/// world.attach(e, Position::default());
/// world.add_entity(e);
///
/// loop {
///     world.set_delta(frame_delta);
///     world.process();
/// }
/// ```
#[derive(Default)]
pub struct World {
    state: WorldState,
    managers: Vec<Box<dyn Manager>>,
    systems: Vec<SystemEntry>,
}

impl World {
    /// Creates a world with default capacity hints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world pre-sized from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`](crate::error::CoreError)
    /// if the configuration fails validation.
    pub fn with_config(config: &WorldConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            state: WorldState::with_config(config),
            managers: Vec::new(),
            systems: Vec::new(),
        })
    }

    /// Registers a manager. Managers are notified of every lifecycle
    /// event before any system, in registration order.
    pub fn set_manager<M: Manager>(&mut self, manager: M) {
        let name = type_name::<M>();
        tracing::debug!(manager = name, "manager registered");
        self.managers.push(Box::new(manager));
    }

    /// Returns the registered manager of type `M`, if any.
    #[must_use]
    pub fn get_manager<M: Manager>(&self) -> Option<&M> {
        self.managers.iter().find_map(|manager| {
            let any: &dyn Any = manager.as_ref();
            any.downcast_ref::<M>()
        })
    }

    /// Mutable variant of [`get_manager`](Self::get_manager).
    pub fn get_manager_mut<M: Manager>(&mut self) -> Option<&mut M> {
        self.managers.iter_mut().find_map(|manager| {
            let any: &mut dyn Any = manager.as_mut();
            any.downcast_mut::<M>()
        })
    }

    /// Registers a system to be run by every [`process`](Self::process)
    /// call, in registration order. The system's aspect is resolved
    /// against this world's registry and it is assigned the next
    /// membership bit.
    pub fn set_system<S: System>(&mut self, system: S) {
        self.register_system(system, false);
    }

    /// Registers a passive system: matched and notified like any
    /// other, but excluded from the automatic per-tick invocation.
    /// Run it manually with [`process_system`](Self::process_system).
    pub fn set_passive_system<S: System>(&mut self, system: S) {
        self.register_system(system, true);
    }

    fn register_system<S: System>(&mut self, system: S, passive: bool) {
        let aspect = system.aspect().build(self.state.components.registry_mut());
        let bit = self.systems.len();
        let name = type_name::<S>();
        tracing::debug!(system = name, bit, passive, "system registered");
        self.systems.push(SystemEntry {
            dummy: aspect.is_dummy(),
            aspect,
            actives: Vec::new(),
            bit,
            passive,
            system: Box::new(system),
        });
    }

    /// Returns the registered system of type `S`, if any.
    #[must_use]
    pub fn get_system<S: System>(&self) -> Option<&S> {
        self.systems.iter().find_map(|entry| {
            let any: &dyn Any = entry.system.as_ref();
            any.downcast_ref::<S>()
        })
    }

    /// Mutable variant of [`get_system`](Self::get_system).
    pub fn get_system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.systems.iter_mut().find_map(|entry| {
            let any: &mut dyn Any = entry.system.as_mut();
            any.downcast_mut::<S>()
        })
    }

    /// Returns the entities currently matched by system `S`, in
    /// insertion order.
    #[must_use]
    pub fn actives_of<S: System>(&self) -> Option<&[Entity]> {
        self.systems.iter().find_map(|entry| {
            let any: &dyn Any = entry.system.as_ref();
            any.is::<S>().then_some(entry.actives.as_slice())
        })
    }

    /// Initializes every manager, then every system, in registration
    /// order. Call once after registration, before the first tick.
    pub fn initialize(&mut self) {
        let Self {
            state,
            managers,
            systems,
        } = self;
        for manager in managers.iter_mut() {
            manager.initialize(state);
        }
        for entry in systems.iter_mut() {
            entry.system.initialize(state);
        }
        tracing::debug!(
            managers = managers.len(),
            systems = systems.len(),
            "world initialized"
        );
    }

    /// Runs one tick: drains the five change queues in fixed order
    /// (added, changed, disabled, enabled, deleted), releases
    /// everything queued for cleanup, then runs each non-passive
    /// system. See the module docs for why the order matters.
    pub fn process(&mut self) {
        let Self {
            state,
            managers,
            systems,
        } = self;

        let batch = state.queues.added.take();
        if !batch.is_empty() {
            tracing::trace!(count = batch.len(), "draining added entities");
        }
        for &entity in &batch {
            state.entities.on_added(entity);
            for manager in managers.iter_mut() {
                manager.added(state, entity);
            }
            for entry in systems.iter_mut() {
                entry.check(state, entity);
            }
        }
        state.queues.added.put_back(batch);

        let batch = state.queues.changed.take();
        if !batch.is_empty() {
            tracing::trace!(count = batch.len(), "draining changed entities");
        }
        for &entity in &batch {
            for manager in managers.iter_mut() {
                manager.changed(state, entity);
            }
            for entry in systems.iter_mut() {
                entry.check(state, entity);
            }
        }
        state.queues.changed.put_back(batch);

        let batch = state.queues.disabled.take();
        for &entity in &batch {
            state.entities.on_disabled(entity);
            for manager in managers.iter_mut() {
                manager.disabled(state, entity);
            }
            for entry in systems.iter_mut() {
                entry.evict(state, entity);
            }
        }
        state.queues.disabled.put_back(batch);

        let batch = state.queues.enabled.take();
        for &entity in &batch {
            state.entities.on_enabled(entity);
            for manager in managers.iter_mut() {
                manager.enabled(state, entity);
            }
            for entry in systems.iter_mut() {
                entry.check(state, entity);
            }
        }
        state.queues.enabled.put_back(batch);

        let batch = state.queues.deleted.take();
        if !batch.is_empty() {
            tracing::trace!(count = batch.len(), "draining deleted entities");
        }
        for &entity in &batch {
            state.components.on_deleted(entity);
            state.entities.on_deleted(entity);
            for manager in managers.iter_mut() {
                manager.deleted(state, entity);
            }
            for entry in systems.iter_mut() {
                entry.evict(state, entity);
            }
        }
        state.queues.deleted.put_back(batch);

        // Structural release only after every observer has seen the
        // change: components first, then entity records and ids.
        state.components.clean(&mut state.entities);
        state.entities.clean();

        for entry in systems.iter_mut() {
            if !entry.passive {
                entry.run(state);
            }
        }
    }

    /// Runs system `S` once, outside the automatic tick - the manual
    /// invocation path for passive systems. Returns `false` if no such
    /// system is registered.
    pub fn process_system<S: System>(&mut self) -> bool {
        let Self { state, systems, .. } = self;
        for entry in systems.iter_mut() {
            let any: &dyn Any = entry.system.as_ref();
            if any.is::<S>() {
                entry.run(state);
                return true;
            }
        }
        false
    }

    /// The mutable world state, for driving the world from embedding
    /// code the same way system hooks do.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// Read access to the world state.
    #[must_use]
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    // Delegations: the world exposes the state surface directly so
    // embedding code does not have to reach through `state_mut` for
    // every call.

    /// See [`WorldState::create_entity`].
    pub fn create_entity(&mut self) -> Entity {
        self.state.create_entity()
    }

    /// See [`WorldState::add_entity`].
    pub fn add_entity(&mut self, entity: Entity) {
        self.state.add_entity(entity);
    }

    /// See [`WorldState::changed_entity`].
    pub fn changed_entity(&mut self, entity: Entity) {
        self.state.changed_entity(entity);
    }

    /// See [`WorldState::delete_entity`].
    pub fn delete_entity(&mut self, entity: Entity) {
        self.state.delete_entity(entity);
    }

    /// See [`WorldState::enable`].
    pub fn enable(&mut self, entity: Entity) {
        self.state.enable(entity);
    }

    /// See [`WorldState::disable`].
    pub fn disable(&mut self, entity: Entity) {
        self.state.disable(entity);
    }

    /// See [`WorldState::create_component`].
    pub fn create_component<C: Component + Default>(&mut self) -> C {
        self.state.create_component::<C>()
    }

    /// See [`WorldState::attach`].
    pub fn attach<C: Component>(&mut self, entity: Entity, component: C) {
        self.state.attach(entity, component);
    }

    /// See [`WorldState::detach`].
    pub fn detach<C: Component>(&mut self, entity: Entity) {
        self.state.detach::<C>(entity);
    }

    /// See [`WorldState::component`].
    #[must_use]
    pub fn component<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.state.component(entity)
    }

    /// See [`WorldState::component_mut`].
    pub fn component_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.state.component_mut(entity)
    }

    /// See [`WorldState::components_of`].
    #[must_use]
    pub fn components_of(&self, entity: Entity) -> Vec<&dyn Component> {
        self.state.components_of(entity)
    }

    /// See [`WorldState::mapper`].
    pub fn mapper<C: Component>(&mut self) -> ComponentMapper<C> {
        self.state.mapper::<C>()
    }

    /// See [`WorldState::entity`].
    #[must_use]
    pub fn entity(&self, id: u32) -> Option<Entity> {
        self.state.entity(id)
    }

    /// See [`WorldState::is_active`].
    #[must_use]
    pub fn is_active(&self, entity: Entity) -> bool {
        self.state.is_active(entity)
    }

    /// See [`WorldState::is_enabled`].
    #[must_use]
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.state.is_enabled(entity)
    }

    /// See [`WorldState::delta`].
    #[must_use]
    pub fn delta(&self) -> f32 {
        self.state.delta()
    }

    /// See [`WorldState::set_delta`].
    pub fn set_delta(&mut self, delta: f32) {
        self.state.set_delta(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::aspect::AspectBuilder;
    use crate::ecs::manager::TagManager;

    #[derive(Debug, Default, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {
        fn reset(&mut self) {
            self.x = 0.0;
            self.y = 0.0;
        }
    }

    #[derive(Debug, Default)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    impl Component for Velocity {
        fn reset(&mut self) {
            self.dx = 0.0;
            self.dy = 0.0;
        }
    }

    #[derive(Debug, Default)]
    struct Frozen;

    impl Component for Frozen {
        fn reset(&mut self) {}
    }

    #[derive(Default)]
    struct MovementSystem {
        position: Option<ComponentMapper<Position>>,
        velocity: Option<ComponentMapper<Velocity>>,
        inserted_count: usize,
        removed_count: usize,
    }

    impl System for MovementSystem {
        fn aspect(&self) -> AspectBuilder {
            AspectBuilder::new()
                .all::<Position>()
                .all::<Velocity>()
                .exclude::<Frozen>()
        }

        fn initialize(&mut self, world: &mut WorldState) {
            self.position = Some(world.mapper());
            self.velocity = Some(world.mapper());
        }

        fn process_entities(&mut self, world: &mut WorldState, actives: &[Entity]) {
            let (Some(position), Some(velocity)) = (self.position, self.velocity) else {
                return;
            };
            let delta = world.delta();
            for &entity in actives {
                let (dx, dy) = {
                    let v = velocity.get(world, entity);
                    (v.dx, v.dy)
                };
                let p = position.get_mut(world, entity);
                p.x += dx * delta;
                p.y += dy * delta;
            }
        }

        fn inserted(&mut self, _world: &mut WorldState, _entity: Entity) {
            self.inserted_count += 1;
        }

        fn removed(&mut self, _world: &mut WorldState, _entity: Entity) {
            self.removed_count += 1;
        }
    }

    #[derive(Default)]
    struct TickCounter {
        ticks: usize,
    }

    impl System for TickCounter {
        fn aspect(&self) -> AspectBuilder {
            AspectBuilder::none()
        }

        fn process_entities(&mut self, _world: &mut WorldState, actives: &[Entity]) {
            assert!(actives.is_empty());
            self.ticks += 1;
        }
    }

    fn movement_world() -> World {
        let mut world = World::new();
        world.set_system(MovementSystem::default());
        world.initialize();
        world
    }

    #[test]
    fn test_matching_follows_component_changes() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.add_entity(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 0);

        world.attach(e, Velocity::default());
        world.process();
        let actives = world.actives_of::<MovementSystem>().unwrap();
        assert_eq!(actives, &[e]);

        world.detach::<Position>(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 0);
    }

    #[test]
    fn test_exclusion_vetoes_and_releases() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.attach(e, Velocity::default());
        world.attach(e, Frozen);
        world.add_entity(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 0);
        assert_eq!(world.get_system::<MovementSystem>().unwrap().inserted_count, 0);

        world.detach::<Frozen>(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 1);

        world.attach(e, Frozen);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 0);
        assert_eq!(world.get_system::<MovementSystem>().unwrap().removed_count, 1);
    }

    #[test]
    fn test_add_then_delete_same_tick_never_inserts() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.attach(e, Velocity::default());
        world.add_entity(e);
        world.delete_entity(e);
        world.process();

        let system = world.get_system::<MovementSystem>().unwrap();
        assert_eq!(system.inserted_count, 0);
        assert!(!world.is_active(e));
    }

    #[test]
    fn test_disable_evicts_enable_rematches() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.attach(e, Velocity::default());
        world.add_entity(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 1);

        world.disable(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 0);
        assert!(world.is_active(e));
        assert!(!world.is_enabled(e));

        world.enable(e);
        world.process();
        assert_eq!(world.actives_of::<MovementSystem>().unwrap().len(), 1);
        assert!(world.is_enabled(e));
    }

    #[test]
    fn test_movement_applies_delta() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.attach(e, Velocity { dx: 1.0, dy: 2.0 });
        world.add_entity(e);

        world.set_delta(0.5);
        world.process();

        let position = world.component::<Position>(e).unwrap();
        assert!((position.x - 0.5).abs() < f32::EPSILON);
        assert!((position.y - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dummy_system_ticks_every_frame() {
        let mut world = World::new();
        world.set_system(TickCounter::default());
        world.initialize();

        world.process();
        world.process();
        world.process();
        assert_eq!(world.get_system::<TickCounter>().unwrap().ticks, 3);
    }

    #[test]
    fn test_passive_system_runs_only_manually() {
        let mut world = World::new();
        world.set_passive_system(TickCounter::default());
        world.initialize();

        world.process();
        assert_eq!(world.get_system::<TickCounter>().unwrap().ticks, 0);

        assert!(world.process_system::<TickCounter>());
        assert_eq!(world.get_system::<TickCounter>().unwrap().ticks, 1);
        assert!(!world.process_system::<MovementSystem>());
    }

    #[test]
    fn test_replace_attach_frees_previous_to_pool() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position { x: 1.0, y: 0.0 });
        world.attach(e, Position { x: 2.0, y: 0.0 });

        assert_eq!(
            world.component::<Position>(e),
            Some(&Position { x: 2.0, y: 0.0 })
        );
        assert_eq!(world.state().components().pool_free_count::<Position>(), 1);

        // The pooled instance comes back fully reset.
        let recycled: Position = world.create_component();
        assert_eq!(recycled, Position::default());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.attach(e, Velocity::default());
        world.add_entity(e);
        world.process();

        world.delete_entity(e);
        world.delete_entity(e);
        world.process();

        assert!(!world.is_active(e));
        assert_eq!(world.state().entities().active_count(), 0);
        assert_eq!(world.get_system::<MovementSystem>().unwrap().removed_count, 1);
    }

    #[test]
    fn test_tag_manager_forgets_deleted_entities() {
        let mut world = World::new();
        world.set_manager(TagManager::new());
        world.initialize();

        let e = world.create_entity();
        world.add_entity(e);
        world.process();
        world
            .get_manager_mut::<TagManager>()
            .unwrap()
            .register("player", e);

        world.delete_entity(e);
        world.process();
        assert!(!world.get_manager::<TagManager>().unwrap().is_registered("player"));
    }

    #[test]
    fn test_components_of_snapshot() {
        let mut world = movement_world();
        let e = world.create_entity();
        world.attach(e, Position::default());
        world.attach(e, Velocity::default());
        assert_eq!(world.components_of(e).len(), 2);

        world.detach::<Velocity>(e);
        assert_eq!(world.components_of(e).len(), 1);
    }

    #[test]
    fn test_config_validation_rejects_zero_capacity() {
        let config = WorldConfig {
            entity_capacity: 0,
            ..WorldConfig::default()
        };
        assert!(World::with_config(&config).is_err());
        assert!(World::with_config(&WorldConfig::default()).is_ok());
    }
}
