//! # Memory Management
//!
//! Pooling keeps the runtime allocation-free in the steady state:
//! component instances are recycled through free lists instead of being
//! dropped and reallocated every time an entity changes shape.

pub mod pool;

pub use pool::ComponentPool;
