//! # Entity Component System
//!
//! The runtime's core building blocks:
//! - Bitsets and aspects (the matching machinery)
//! - Entity identity and lifecycle
//! - Component kinds, storage and fast accessors
//! - Systems, managers, and the world scheduler
//!
//! Public API exposure is re-exported from the crate root.

pub mod aspect;
pub mod bits;
pub mod component;
pub mod entity;
pub mod manager;
pub mod storage;
pub mod system;
pub mod world;

pub use aspect::{Aspect, AspectBuilder};
pub use bits::{BitSet, Ones};
pub use component::{Component, ComponentMapper, ComponentRegistry};
pub use entity::{Entity, EntityStore, IdPool};
pub use manager::{GroupManager, Manager, TagManager};
pub use storage::ComponentStore;
pub use system::{Interval, System};
pub use world::{World, WorldState};
