//! Simulated recompute cost paid on every cache miss.

use std::fmt::Debug;
use std::time::Duration;

use listkeep_core::ItemKind;

/// Cost model for recomputing an item after a cache miss.
///
/// The orchestrator owns the wait itself so it can race it against
/// cancellation; implementations only say how long it lasts.
pub trait SimulatedLatency: Debug + Send + Sync {
    fn delay_for(&self, kind: ItemKind) -> Duration;
}

/// The same delay for every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLatency(Duration);

impl FixedLatency {
    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }
}

impl Default for FixedLatency {
    fn default() -> Self {
        Self(Duration::from_secs(3))
    }
}

impl SimulatedLatency for FixedLatency {
    fn delay_for(&self, _kind: ItemKind) -> Duration {
        self.0
    }
}

/// No delay. Used by tests that do not exercise the recompute cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoLatency;

impl SimulatedLatency for NoLatency {
    fn delay_for(&self, _kind: ItemKind) -> Duration {
        Duration::ZERO
    }
}
