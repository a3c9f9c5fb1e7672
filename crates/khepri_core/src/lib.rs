//! # KHEPRI Core Runtime
//!
//! A pooled Entity-Component-System runtime designed for:
//! - Thousands of entities per tick with minimal per-tick allocation
//! - Incremental, bitset-based aspect matching - no per-tick scans
//! - Queued structural changes, applied atomically at tick boundaries
//!
//! ## Architecture Rules
//!
//! 1. **Two-phase change model** - add/remove/enable/disable/delete are
//!    queued and land at the next tick, never mid-notification
//! 2. **Recycle, don't reallocate** - entity ids, entity records and
//!    component instances all cycle through pools
//! 3. **Single-threaded by contract** - one logical thread drives the
//!    world; no locks, no suspension
//!
//! ## Example
//!
//! ```rust,ignore
//! use khepri_core::World;
//!
//! let mut world = World::new();
//! world.set_system(MovementSystem::default());
//! world.initialize();
//!
//! let e = world.create_entity();
//! world.attach(e, Position::default());
//! world.add_entity(e);
//!
//! world.set_delta(0.016);
//! world.process();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;

pub use config::WorldConfig;
pub use ecs::{
    Aspect, AspectBuilder, BitSet, Component, ComponentMapper, ComponentRegistry, ComponentStore,
    Entity, EntityStore, GroupManager, IdPool, Interval, Manager, System, TagManager, World,
    WorldState,
};
pub use error::{CoreError, CoreResult};
pub use memory::ComponentPool;
