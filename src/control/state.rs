//! Immutable run-loop state snapshots.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::schema::Observation;

/// Lifecycle phase of a run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No engine.
    #[default]
    Uninitialized,
    /// Engine creation (or in-place restart) pending.
    Initializing,
    /// Engine ready, no call in flight.
    Idle,
    /// One step in flight.
    Stepping,
    /// Teardown waiting for an in-flight step before disposal.
    Destroying,
}

impl Phase {
    /// Whether an engine handle exists.
    pub fn is_initialized(self) -> bool {
        matches!(self, Self::Initializing | Self::Idle | Self::Stepping)
    }
}

/// Authoritative state of one simulation instance.
///
/// Replaced, never mutated, on every transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunState {
    pub phase: Phase,
    pub auto_run: bool,
    /// A step is in flight.
    pub busy: bool,
    /// One-shot manual step request, cleared when the step starts.
    pub step_requested: bool,
    pub last_observation: Option<Arc<Observation>>,
    /// Seed the current instance was created with.
    pub seed: Option<String>,
    pub steps_executed: u64,
    pub elapsed_run_time: Duration,
    /// Generation token of the engine instance.
    pub instance: u64,
    pub cells_ever_active: usize,
    /// Message of the last fatal engine error.
    pub error: Option<String>,
}
