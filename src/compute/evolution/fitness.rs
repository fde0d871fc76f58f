//! Fitness evaluation: run a seed patch on a Game of Life grid and score it.

use crate::compute::{GameOfLife, LifeError};
use crate::schema::{FitnessWeights, SimulationConfig};

use super::genome::Phenotype;

/// Minimum number of steps without progress before a trial counts as stalled.
const MIN_STALL_STEPS: f32 = 10.0;

/// What happened while running one seed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialStats {
    /// Alive cells in the seed.
    pub start_cells: usize,
    /// Largest number of simultaneously alive cells.
    pub max_alive_cells: usize,
    /// Step at which `max_alive_cells` was first reached.
    pub max_alive_steps: u64,
    /// Cells that were alive at least once.
    pub toggled_cells: usize,
    /// Step at which the last new cell came alive.
    pub toggled_steps: u64,
    /// Game of Life steps run.
    pub steps: u64,
}

/// Runs phenotypes on a fixed grid and applies the fitness weights.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    template: GameOfLife,
    seed_size: usize,
    weights: FitnessWeights,
    max_steps: u64,
    stall_factor: f32,
}

impl FitnessEvaluator {
    pub fn new(config: &SimulationConfig) -> Result<Self, LifeError> {
        let ca = &config.ca;
        let template = GameOfLife::new(ca.width, ca.height, ca.border)?;
        if ca.seed_size > ca.width || ca.seed_size > ca.height {
            return Err(LifeError::PatchTooLarge {
                size: ca.seed_size,
                width: ca.width,
                height: ca.height,
            });
        }

        Ok(Self {
            template,
            seed_size: ca.seed_size,
            weights: config.fitness.clone(),
            max_steps: config.ea.max_steps as u64,
            stall_factor: config.ea.stall_factor,
        })
    }

    /// Evaluate a phenotype, returning its fitness and trial statistics.
    pub fn evaluate(&self, phenotype: &Phenotype) -> (f32, TrialStats) {
        let stats = self.run_trial(phenotype);
        (self.score(&stats), stats)
    }

    /// Weighted sum of the trial terms.
    pub fn score(&self, stats: &TrialStats) -> f32 {
        let w = &self.weights;
        w.num_toggled_cells * stats.toggled_cells as f32
            + w.num_toggled_steps * stats.toggled_steps as f32
            + w.max_alive_cells * stats.max_alive_cells as f32
            + w.max_alive_steps * stats.max_alive_steps as f32
            + w.num_start_cells * stats.start_cells as f32
    }

    /// Run the phenotype until it dies out, stalls or hits the step limit.
    pub fn run_trial(&self, phenotype: &Phenotype) -> TrialStats {
        let mut life = self.template.clone();
        let size = self.seed_size.min(phenotype.size);
        let (x0, y0) = life.patch_origin(size);
        for y in 0..size {
            for x in 0..size {
                if phenotype.cells[y * phenotype.size + x] {
                    life.set(x0 + x, y0 + y, true);
                }
            }
        }

        let mut ever_alive: Vec<bool> = life.cells().iter().map(|&c| c != 0).collect();
        let start_cells = life.num_alive();
        let mut stats = TrialStats {
            start_cells,
            max_alive_cells: start_cells,
            toggled_cells: start_cells,
            ..Default::default()
        };
        if start_cells == 0 {
            return stats;
        }

        let mut last_progress = 0u64;
        while stats.steps < self.max_steps {
            life.step();
            stats.steps += 1;
            let step = stats.steps;

            let mut alive = 0;
            let mut newly_toggled = 0;
            for (cell, seen) in life.cells().iter().zip(ever_alive.iter_mut()) {
                if *cell != 0 {
                    alive += 1;
                    if !*seen {
                        *seen = true;
                        newly_toggled += 1;
                    }
                }
            }

            if newly_toggled > 0 {
                stats.toggled_cells += newly_toggled;
                stats.toggled_steps = step;
                last_progress = step;
            }
            if alive > stats.max_alive_cells {
                stats.max_alive_cells = alive;
                stats.max_alive_steps = step;
                last_progress = step;
            }

            if alive == 0 {
                break;
            }
            let patience = (last_progress as f32 * self.stall_factor).max(MIN_STALL_STEPS);
            if (step - last_progress) as f32 > patience {
                break;
            }
        }

        stats
    }
}
