//! GA of Life - Evolving Game of Life seeds.
//!
//! An evolutionary algorithm searches for small binary seed patterns that
//! keep a Game of Life grid busy, and a cooperative run-loop layer drives
//! both simulations from presentation-layer commands without overlapping
//! engine calls.
//!
//! # Architecture
//!
//! - `schema`: Configuration, control settings and observation types
//! - `compute`: Game of Life grid and the evolutionary search
//! - `engine`: Engines behind an initialize/step/reset/dispose contract,
//!   run inline or on a worker thread
//! - `control`: Run loops, auto-play scheduling, statistics series and
//!   the activation tracker
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Instant;
//!
//! use ga_of_life::{
//!     control::{Command, RunLoop},
//!     engine::EvolutionEngineFactory,
//!     schema::{ControlConfig, SimulationConfig},
//! };
//!
//! let origin = Instant::now();
//! let clock = move || origin.elapsed();
//!
//! let mut run_loop = RunLoop::new(EvolutionEngineFactory, ControlConfig::evolution());
//! run_loop.dispatch(Command::Initialize(SimulationConfig::default()), clock());
//!
//! // Auto-run steps the population until 50 generations are done.
//! run_loop.run_blocking(&clock, |state| state.steps_executed >= 50);
//!
//! let state = run_loop.state();
//! if let Some(observation) = &state.last_observation {
//!     println!("Best fitness: {:?}", observation.max_fitness);
//! }
//! ```

pub mod compute;
pub mod control;
pub mod engine;
pub mod schema;

// WebAssembly bindings (only for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export commonly used types
pub use compute::GameOfLife;
pub use control::{Command, Phase, RunLoop, RunState, SeedBinding};
pub use engine::{EvolutionEngineFactory, LifeEngineFactory};
pub use schema::{ControlConfig, Observation, SimulationConfig};
