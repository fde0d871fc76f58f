//! Bounded time series fed from the observation stream.

use std::collections::VecDeque;
use std::mem;

use serde::Serialize;

use crate::schema::{Metric, Observation, Reduction, SeriesConfig};

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    /// Step index.
    pub x: u64,
    pub y: f64,
}

/// Ring buffer of points; the oldest point is evicted at capacity.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    capacity: usize,
    points: VecDeque<TimeSeriesPoint>,
}

impl TimeSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            points: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Append a point; returns `true` when the oldest point was evicted.
    pub fn push(&mut self, point: TimeSeriesPoint) -> bool {
        let shifted = self.points.len() == self.capacity;
        if shifted {
            self.points.pop_front();
        }
        self.points.push_back(point);
        shifted
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn points(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.points.back()
    }
}

/// Incremental change to a plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlotUpdate {
    /// Point added below capacity.
    Append {
        metric: Metric,
        point: TimeSeriesPoint,
    },
    /// Point added at capacity; the oldest point scrolled out.
    Shift {
        metric: Metric,
        point: TimeSeriesPoint,
    },
    /// Every series was emptied.
    Clear,
}

impl Metric {
    /// Value of this metric for one observation, if the engine reports it.
    pub fn sample(self, observation: &Observation, cells_ever_active: usize) -> Option<f64> {
        match self {
            Self::MaxFitness => observation.max_fitness.map(f64::from),
            Self::AvgFitness => observation.avg_fitness.map(f64::from),
            Self::EvaluationsDelta => Some(observation.evaluations_delta as f64),
            Self::CaStepsDelta => Some(observation.ca_steps_delta as f64),
            Self::ActiveCells => Some(observation.active_cells as f64),
            Self::CellsEverActive => Some(cells_ever_active as f64),
        }
    }
}

#[derive(Debug)]
struct Track {
    config: SeriesConfig,
    series: TimeSeries,
    window: Option<f64>,
    last_x: Option<u64>,
}

/// Turns observations into bounded series and queued plot updates.
#[derive(Debug)]
pub struct StatisticsAggregator {
    tracks: Vec<Track>,
    updates: Vec<PlotUpdate>,
}

impl StatisticsAggregator {
    pub fn new(series: &[SeriesConfig], history_len: usize) -> Self {
        Self {
            tracks: series
                .iter()
                .map(|&config| Track {
                    config,
                    series: TimeSeries::new(history_len),
                    window: None,
                    last_x: None,
                })
                .collect(),
            updates: Vec::new(),
        }
    }

    /// Feed one observation.
    ///
    /// Direct series append once per new step index. Window-max series fold
    /// the value into a running maximum and emit it on multiples of the
    /// stride.
    pub fn push(&mut self, observation: &Observation, cells_ever_active: usize) {
        let x = observation.step;
        for track in &mut self.tracks {
            let Some(y) = track.config.metric.sample(observation, cells_ever_active) else {
                continue;
            };

            let emitted = match track.config.reduction {
                Reduction::Direct => {
                    if track.last_x == Some(x) {
                        None
                    } else {
                        Some(y)
                    }
                }
                Reduction::WindowMax { stride } => {
                    let max = track.window.map_or(y, |m| m.max(y));
                    if stride > 0 && x % stride == 0 && track.last_x != Some(x) {
                        track.window = None;
                        Some(max)
                    } else {
                        track.window = Some(max);
                        None
                    }
                }
            };

            if let Some(y) = emitted {
                let point = TimeSeriesPoint { x, y };
                let metric = track.config.metric;
                track.last_x = Some(x);
                self.updates.push(if track.series.push(point) {
                    PlotUpdate::Shift { metric, point }
                } else {
                    PlotUpdate::Append { metric, point }
                });
            }
        }
    }

    /// Empty every series and queue a [`PlotUpdate::Clear`].
    pub fn clear(&mut self) {
        for track in &mut self.tracks {
            track.series.clear();
            track.window = None;
            track.last_x = None;
        }
        self.updates.clear();
        self.updates.push(PlotUpdate::Clear);
    }

    pub fn series(&self, metric: Metric) -> Option<&TimeSeries> {
        self.tracks
            .iter()
            .find(|t| t.config.metric == metric)
            .map(|t| &t.series)
    }

    /// Drain queued plot updates.
    pub fn take_updates(&mut self) -> Vec<PlotUpdate> {
        mem::take(&mut self.updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn active(step: u64, cells: usize) -> Observation {
        Observation {
            step,
            active_cells: cells,
            ..Default::default()
        }
    }

    fn ys(series: &TimeSeries) -> Vec<f64> {
        series.points().map(|p| p.y).collect()
    }

    #[test]
    fn test_window_max_emits_on_stride() {
        let mut stats =
            StatisticsAggregator::new(&[SeriesConfig::window_max(Metric::ActiveCells, 4)], 10);
        for (step, cells) in [(1, 3), (2, 9), (3, 2), (4, 4)] {
            stats.push(&active(step, cells), 0);
        }

        let series = stats.series(Metric::ActiveCells).unwrap();
        assert_eq!(ys(series), vec![9.0]);
        assert_eq!(series.last().unwrap().x, 4);

        // The window restarts after each emitted point.
        for (step, cells) in [(5, 1), (6, 2), (7, 1), (8, 0)] {
            stats.push(&active(step, cells), 0);
        }
        assert_eq!(ys(stats.series(Metric::ActiveCells).unwrap()), vec![9.0, 2.0]);
    }

    #[test]
    fn test_direct_appends_once_per_step() {
        let mut stats =
            StatisticsAggregator::new(&[SeriesConfig::direct(Metric::CellsEverActive)], 10);
        stats.push(&active(1, 0), 5);
        stats.push(&active(1, 0), 6);
        stats.push(&active(2, 0), 7);

        assert_eq!(
            ys(stats.series(Metric::CellsEverActive).unwrap()),
            vec![5.0, 7.0]
        );
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let mut stats = StatisticsAggregator::new(&[SeriesConfig::direct(Metric::MaxFitness)], 4);
        stats.push(&active(1, 0), 0);
        assert!(stats.series(Metric::MaxFitness).unwrap().is_empty());
        assert!(stats.take_updates().is_empty());
    }

    #[test]
    fn test_shift_and_clear_updates() {
        let mut stats =
            StatisticsAggregator::new(&[SeriesConfig::direct(Metric::ActiveCells)], 2);
        for step in 1..=3 {
            stats.push(&active(step, step as usize), 0);
        }

        let updates = stats.take_updates();
        assert!(matches!(updates[0], PlotUpdate::Append { .. }));
        assert!(matches!(updates[1], PlotUpdate::Append { .. }));
        assert_eq!(
            updates[2],
            PlotUpdate::Shift {
                metric: Metric::ActiveCells,
                point: TimeSeriesPoint { x: 3, y: 3.0 }
            }
        );
        assert_eq!(ys(stats.series(Metric::ActiveCells).unwrap()), vec![2.0, 3.0]);

        stats.clear();
        assert_eq!(stats.take_updates(), vec![PlotUpdate::Clear]);
        assert!(stats.series(Metric::ActiveCells).unwrap().is_empty());
        assert!(stats.take_updates().is_empty());
    }

    #[test]
    fn test_plot_update_json() {
        let update = PlotUpdate::Append {
            metric: Metric::MaxFitness,
            point: TimeSeriesPoint { x: 2, y: 1.5 },
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["type"], "append");
        assert_eq!(json["metric"], "max_fitness");
        assert_eq!(json["point"]["y"], 1.5);
    }

    proptest! {
        #[test]
        fn prop_series_is_bounded(
            capacity in 1usize..20,
            values in prop::collection::vec(0u32..1000, 0..100),
        ) {
            let mut series = TimeSeries::new(capacity);
            for (i, &v) in values.iter().enumerate() {
                let before: Vec<TimeSeriesPoint> = series.points().copied().collect();
                let shifted = series.push(TimeSeriesPoint { x: i as u64, y: v as f64 });
                prop_assert!(series.len() <= capacity);
                prop_assert_eq!(shifted, before.len() == capacity);

                let after: Vec<TimeSeriesPoint> = series.points().copied().collect();
                let kept = if shifted { &before[1..] } else { &before[..] };
                prop_assert_eq!(&after[..after.len() - 1], kept);
            }
        }
    }
}
