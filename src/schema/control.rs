//! Run-loop control settings: auto-play cadence, execution mode and plotted series.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Where the engine of a run loop executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    /// On the thread that pumps the run loop.
    #[default]
    Inline,
    /// On a dedicated worker thread (native targets only).
    Worker,
}

/// Observation field plotted by a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    MaxFitness,
    AvgFitness,
    EvaluationsDelta,
    CaStepsDelta,
    ActiveCells,
    /// Size of the cumulative activation map.
    CellsEverActive,
}

/// How observations are reduced into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reduction {
    /// One point per new step index.
    Direct,
    /// Running maximum, emitted on multiples of `stride`.
    WindowMax { stride: u64 },
}

/// One plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub metric: Metric,
    pub reduction: Reduction,
}

impl SeriesConfig {
    pub fn direct(metric: Metric) -> Self {
        Self {
            metric,
            reduction: Reduction::Direct,
        }
    }

    pub fn window_max(metric: Metric, stride: u64) -> Self {
        Self {
            metric,
            reduction: Reduction::WindowMax { stride },
        }
    }
}

/// Settings of a single run loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Whether auto-run is enabled right after initialization.
    pub auto_run: bool,
    /// Delay between a completed step and the next auto-play tick, in milliseconds.
    pub step_delay_ms: u64,
    /// Engine execution mode.
    #[serde(default)]
    pub execution: Execution,
    /// Maximum number of points kept per series.
    pub history_len: usize,
    /// Plotted series.
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

impl ControlConfig {
    /// Cellular automaton preset: manual stepping, 10 ms auto-play cadence,
    /// alive cells sampled every 10 steps.
    pub fn life() -> Self {
        Self {
            auto_run: false,
            step_delay_ms: 10,
            execution: Execution::Inline,
            history_len: 250,
            series: vec![
                SeriesConfig::window_max(Metric::ActiveCells, 10),
                SeriesConfig::window_max(Metric::CellsEverActive, 10),
            ],
        }
    }

    /// Evolutionary algorithm preset: auto-run on a worker with a 250 point history.
    pub fn evolution() -> Self {
        Self {
            auto_run: true,
            step_delay_ms: 0,
            execution: Execution::Worker,
            history_len: 250,
            series: vec![
                SeriesConfig::direct(Metric::MaxFitness),
                SeriesConfig::direct(Metric::EvaluationsDelta),
            ],
        }
    }

    #[inline]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_len == 0 {
            return Err(ConfigError::InvalidHistoryLength);
        }
        let zero_stride = self
            .series
            .iter()
            .any(|s| matches!(s.reduction, Reduction::WindowMax { stride: 0 }));
        if zero_stride {
            return Err(ConfigError::InvalidSamplingStride);
        }
        Ok(())
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self::life()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let life = ControlConfig::life();
        assert!(!life.auto_run);
        assert_eq!(life.step_delay(), Duration::from_millis(10));
        assert_eq!(life.execution, Execution::Inline);
        assert!(life.validate().is_ok());

        let evolution = ControlConfig::evolution();
        assert!(evolution.auto_run);
        assert_eq!(evolution.execution, Execution::Worker);
        assert_eq!(evolution.history_len, 250);
        assert!(evolution.validate().is_ok());
    }

    #[test]
    fn test_invalid_control() {
        let mut config = ControlConfig::life();
        config.history_len = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHistoryLength)
        ));

        let mut config = ControlConfig::life();
        config.series = vec![SeriesConfig::window_max(Metric::ActiveCells, 0)];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSamplingStride)
        ));
    }

    #[test]
    fn test_series_json() {
        let parsed: SeriesConfig = serde_json::from_str(
            r#"{ "metric": "active_cells", "reduction": { "type": "window_max", "stride": 5 } }"#,
        )
        .unwrap();
        assert_eq!(parsed, SeriesConfig::window_max(Metric::ActiveCells, 5));
    }
}
