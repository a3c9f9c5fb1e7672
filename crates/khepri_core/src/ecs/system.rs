//! # Systems
//!
//! A system is a per-tick processor of the entities its aspect
//! currently matches. Authors implement [`System`] on a plain struct;
//! the world owns the membership bookkeeping (active list, membership
//! bit) and calls the hooks here at the right points of the tick.
//!
//! The contract, in order:
//!
//! 1. `aspect()` describes the component combination of interest -
//!    consumed once, at registration.
//! 2. `initialize` runs when the world initializes; resolve
//!    [`ComponentMapper`](super::component::ComponentMapper)s here.
//! 3. Every tick: `check_processing` gates the run (interval and
//!    delay gating is cooperative - return `false` to skip), then
//!    `begin`, `process_entities` over the actives, `end`.
//! 4. `inserted` / `removed` fire when membership changes.
//!
//! A system registered as *passive* is skipped by the automatic
//! per-tick invocation but can still be run manually.

use std::any::Any;

use super::aspect::AspectBuilder;
use super::entity::Entity;
use super::world::WorldState;

/// Per-tick entity processor.
///
/// See the module docs for the hook order. Only
/// [`process_entities`](System::process_entities) and
/// [`aspect`](System::aspect) are mandatory.
pub trait System: Any {
    /// Describes which entities this system wants. Use
    /// [`AspectBuilder::none`] for a system that processes no
    /// entities but still ticks.
    fn aspect(&self) -> AspectBuilder;

    /// One-time setup when the world initializes; the place to
    /// resolve component mappers.
    fn initialize(&mut self, _world: &mut WorldState) {}

    /// Runs before `process_entities` on ticks where the system
    /// processes.
    fn begin(&mut self, _world: &mut WorldState) {}

    /// Processes the entities currently matched by this system's
    /// aspect, in insertion order.
    fn process_entities(&mut self, world: &mut WorldState, actives: &[Entity]);

    /// Runs after `process_entities` on ticks where the system
    /// processes.
    fn end(&mut self, _world: &mut WorldState) {}

    /// Gates processing for this tick. Defaults to `true`; interval
    /// and delay systems override it, typically via [`Interval`].
    fn check_processing(&mut self, _delta: f32) -> bool {
        true
    }

    /// Fires when an entity starts matching this system's aspect.
    fn inserted(&mut self, _world: &mut WorldState, _entity: Entity) {}

    /// Fires when an entity stops matching, is deleted, or is
    /// disabled.
    fn removed(&mut self, _world: &mut WorldState, _entity: Entity) {}
}

/// Delta accumulator for interval-gated systems.
///
/// Collision or physics systems often run at a fixed cadence rather
/// than every tick; they keep an `Interval` and forward
/// `check_processing` to [`ready`](Interval::ready).
///
/// # Example
///
/// ```rust,ignore
/// fn check_processing(&mut self, delta: f32) -> bool {
///     self.interval.ready(delta)
/// }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Interval {
    /// Seconds between runs.
    interval: f32,
    /// Time accumulated since the last run.
    accumulated: f32,
}

impl Interval {
    /// Creates an accumulator that becomes ready every `interval`
    /// seconds of accumulated delta.
    #[must_use]
    pub const fn new(interval: f32) -> Self {
        Self {
            interval,
            accumulated: 0.0,
        }
    }

    /// Accumulates `delta`; returns `true` when a full interval has
    /// elapsed. The overshoot carries into the next period, so the
    /// long-run cadence stays accurate.
    pub fn ready(&mut self, delta: f32) -> bool {
        self.accumulated += delta;
        if self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_gates_until_elapsed() {
        let mut interval = Interval::new(1.0);
        assert!(!interval.ready(0.4));
        assert!(!interval.ready(0.4));
        assert!(interval.ready(0.4));
    }

    #[test]
    fn test_interval_overshoot_carries() {
        let mut interval = Interval::new(1.0);
        assert!(interval.ready(1.5));
        // 0.5 carried over; another 0.5 completes the next period.
        assert!(interval.ready(0.5));
        assert!(!interval.ready(0.1));
    }
}
