//! Per-step results reported by simulation engines.

use serde::{Deserialize, Serialize};

/// Owned copy of a grid's alive cells, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<bool>,
}

impl GridSnapshot {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x]
    }

    pub fn num_alive(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Result of one engine step.
///
/// For the evolutionary engine `step` is the generation index; for the
/// cellular automaton it is the CA step. Fields an engine does not produce
/// stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Step or generation index.
    pub step: u64,
    /// Cumulative fitness evaluations.
    pub evaluations: u64,
    /// Evaluations performed by this step.
    pub evaluations_delta: u64,
    /// Cumulative Game of Life steps run inside the engine.
    pub ca_steps: u64,
    /// Game of Life steps run by this step.
    pub ca_steps_delta: u64,
    pub max_fitness: Option<f32>,
    pub avg_fitness: Option<f32>,
    /// Cells alive right now.
    pub active_cells: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_genotype: Option<String>,
    /// Best phenotype as a row-major bit string, usable as a CA seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_phenotype: Option<String>,
    /// Fraction of the population with each gene set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_distribution: Option<Vec<f32>>,
    /// Fraction of the population with each phenotype cell alive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_distribution: Option<Vec<f32>>,
}
