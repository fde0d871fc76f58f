//! Engine module - Simulation engines behind an initialize/step/reset/dispose contract.
//!
//! An [`EngineFactory`] creates an [`Engine`] from a [`SimulationConfig`];
//! an [`EngineHandle`] owns the engine, running it inline or on a worker
//! thread, and answers every call with a [`Pending`] completion.

mod evolution;
mod handle;
mod life;
mod pending;

#[cfg(test)]
pub(crate) mod testing;

use crate::compute::LifeError;
use crate::schema::{ConfigError, Observation, SimulationConfig};

pub use evolution::{EvolutionEngine, EvolutionEngineFactory};
pub use handle::EngineHandle;
pub use life::{LifeEngine, LifeEngineFactory};
pub use pending::Pending;

/// Stateful simulation driven one step at a time.
pub trait Engine: Send + 'static {
    /// Advance one step and report the result.
    fn step(&mut self) -> Result<Observation, EngineError>;

    /// Reinitialize in place from a new configuration.
    fn reset(&mut self, config: &SimulationConfig) -> Result<Observation, EngineError>;

    /// Current state without advancing.
    fn observe(&self) -> Observation;

    /// Release resources. Called exactly once before the engine is dropped.
    fn dispose(&mut self) {}
}

/// Creates engines; shared with worker threads.
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: Engine;

    fn create(&self, config: &SimulationConfig) -> Result<Self::Engine, EngineError>;
}

/// Engine creation and execution errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Life(#[from] LifeError),
    #[error("No seed configured")]
    MissingSeed,
    #[error("Engine step failed: {0}")]
    Step(String),
    #[error("Failed to spawn engine worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Engine worker is gone")]
    WorkerGone,
    #[error("Engine already disposed")]
    Disposed,
}
