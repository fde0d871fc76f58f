//! Control module - Run loops that drive engines from presentation commands.
//!
//! A [`RunLoop`] owns the lifecycle state machine, the auto-play scheduler,
//! the activation tracker and the statistics series of one simulation.
//! [`SeedBinding`] hands the best evolved phenotype to a Game of Life loop.

mod command;
mod run_loop;
mod scheduler;
mod seed;
mod series;
mod state;
mod tracker;

pub use command::{Command, CommandError};
pub use run_loop::{RunLoop, StateListener};
pub use scheduler::{AutoPlayScheduler, clock_from_millis};
pub use seed::{SeedBinding, SeedSync};
pub use series::{PlotUpdate, StatisticsAggregator, TimeSeries, TimeSeriesPoint};
pub use state::{Phase, RunState};
pub use tracker::ActivationMap;
