//! Schema module - Simulation, control and observation types.

mod config;
mod control;
mod observation;

pub use config::*;
pub use control::*;
pub use observation::*;
