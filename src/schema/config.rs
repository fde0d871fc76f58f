//! Configuration types for the Game of Life grid and the evolutionary search.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Smallest grid edge the Game of Life engine accepts.
pub const MIN_GRID_SIZE: usize = 3;

/// Largest grid edge accepted by validation.
pub const MAX_GRID_SIZE: usize = 1024;

/// Population size bounds.
pub const POPULATION_BOUNDS: (usize, usize) = (2, 1000);

/// Tournament size bounds.
pub const TOURNAMENT_BOUNDS: (usize, usize) = (1, 5);

/// Absolute bound for each fitness weight.
pub const MAX_FITNESS_WEIGHT: f32 = 100.0;

/// How cells beyond the grid edge are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridBorder {
    /// Cells outside the grid are always dead.
    #[default]
    Zeroes,
    /// Opposite edges are neighbours (torus).
    Wrapped,
}

/// Top-level simulation configuration shared by both engines.
///
/// Never mutated in place by the control layer: a changed setting produces a
/// new config (see [`SimulationConfig::with_seed`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Cellular automaton settings.
    #[serde(default)]
    pub ca: CaConfig,
    /// Evolutionary algorithm settings.
    #[serde(default)]
    pub ea: EaConfig,
    /// Weights of the fitness terms.
    #[serde(default)]
    pub fitness: FitnessWeights,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ca: CaConfig::default(),
            ea: EaConfig::default(),
            fitness: FitnessWeights::default(),
        }
    }
}

/// Game of Life grid settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Edge behavior.
    #[serde(default)]
    pub border: GridBorder,
    /// Edge length of the square seed patch placed at the grid center.
    #[serde(default = "default_seed_size")]
    pub seed_size: usize,
    /// Seed patch as a row-major bit string (`'0'` is dead).
    #[serde(default)]
    pub seed: Option<String>,
}

fn default_seed_size() -> usize {
    8
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            border: GridBorder::Zeroes,
            seed_size: default_seed_size(),
            seed: None,
        }
    }
}

/// Recombination operator used when breeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recombination {
    /// N-point crossover.
    NPoint { points: usize },
    /// Uniform crossover; `bias` in `[0, 1)` favours the first parent.
    Uniform { bias: f32 },
}

impl Default for Recombination {
    fn default() -> Self {
        Self::NPoint { points: 1 }
    }
}

/// Evolutionary algorithm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EaConfig {
    /// Number of individuals per generation.
    pub population_size: usize,
    /// Probability that a child is bred by recombining two parents.
    pub recombination_rate: f32,
    /// Probability that a child is mutated.
    pub mutation_rate: f32,
    /// Number of contestants per tournament.
    pub tournament_size: usize,
    /// Carry the best individual over unmutated.
    pub elitism: bool,
    /// Recombination operator.
    #[serde(default)]
    pub recombination: Recombination,
    /// Maximum Game of Life steps per fitness evaluation.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// An evaluation stops once no progress was made for
    /// `stall_factor * last_progress_step` steps.
    #[serde(default = "default_stall_factor")]
    pub stall_factor: f32,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_max_steps() -> usize {
    100
}

fn default_stall_factor() -> f32 {
    2.0
}

impl Default for EaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            recombination_rate: 0.4,
            mutation_rate: 0.9,
            tournament_size: 2,
            elitism: true,
            recombination: Recombination::default(),
            max_steps: default_max_steps(),
            stall_factor: default_stall_factor(),
            random_seed: None,
        }
    }
}

/// Weights of the terms summed into a seed's fitness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Number of cells that were alive at least once.
    pub num_toggled_cells: f32,
    /// Step at which the final toggled-cell count was reached.
    pub num_toggled_steps: f32,
    /// Maximum number of simultaneously alive cells.
    pub max_alive_cells: f32,
    /// Step at which the maximum was first reached.
    pub max_alive_steps: f32,
    /// Number of alive cells in the seed.
    pub num_start_cells: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            num_toggled_cells: 1.0,
            num_toggled_steps: 0.0,
            max_alive_cells: 0.0,
            max_alive_steps: 0.0,
            num_start_cells: 0.0,
        }
    }
}

impl FitnessWeights {
    fn terms(&self) -> [(&'static str, f32); 5] {
        [
            ("num_toggled_cells", self.num_toggled_cells),
            ("num_toggled_steps", self.num_toggled_steps),
            ("max_alive_cells", self.max_alive_cells),
            ("max_alive_steps", self.max_alive_steps),
            ("num_start_cells", self.num_start_cells),
        ]
    }
}

impl SimulationConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Number of bits in a genotype (one per seed patch cell).
    #[inline]
    pub fn genotype_len(&self) -> usize {
        self.ca.seed_size * self.ca.seed_size
    }

    /// Number of cells in the grid.
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.ca.width * self.ca.height
    }

    /// Copy of this config with the CA seed replaced.
    pub fn with_seed(&self, seed: impl Into<String>) -> Self {
        let mut config = self.clone();
        config.ca.seed = Some(seed.into());
        config
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ca = &self.ca;
        let ea = &self.ea;

        for (axis, size) in [("width", ca.width), ("height", ca.height)] {
            if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
                return Err(ConfigError::InvalidGridSize { axis, size });
            }
        }
        if ca.seed_size == 0 || ca.seed_size > ca.width.min(ca.height) {
            return Err(ConfigError::InvalidSeedSize(ca.seed_size));
        }
        if let Some(seed) = &ca.seed
            && seed.chars().count() != self.genotype_len()
        {
            return Err(ConfigError::SeedLength {
                expected: self.genotype_len(),
                actual: seed.chars().count(),
            });
        }

        if !(POPULATION_BOUNDS.0..=POPULATION_BOUNDS.1).contains(&ea.population_size) {
            return Err(ConfigError::InvalidPopulationSize(ea.population_size));
        }
        for (name, rate) in [
            ("recombination_rate", ea.recombination_rate),
            ("mutation_rate", ea.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidRate { name, rate });
            }
        }
        if !(TOURNAMENT_BOUNDS.0..=TOURNAMENT_BOUNDS.1).contains(&ea.tournament_size) {
            return Err(ConfigError::InvalidTournamentSize(ea.tournament_size));
        }
        match ea.recombination {
            Recombination::NPoint { points } => {
                if points == 0 || points >= self.genotype_len() {
                    return Err(ConfigError::InvalidCrossoverPoints(points));
                }
            }
            Recombination::Uniform { bias } => {
                if !(0.0..1.0).contains(&bias) {
                    return Err(ConfigError::InvalidBias(bias));
                }
            }
        }
        if ea.max_steps == 0 {
            return Err(ConfigError::InvalidMaxSteps);
        }
        if ea.stall_factor <= 0.0 {
            return Err(ConfigError::InvalidStallFactor(ea.stall_factor));
        }

        for (name, weight) in self.fitness.terms() {
            if weight.abs() > MAX_FITNESS_WEIGHT || weight.is_nan() {
                return Err(ConfigError::InvalidWeight { name, weight });
            }
        }

        Ok(())
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Grid {axis} {size} outside [{MIN_GRID_SIZE}, {MAX_GRID_SIZE}]")]
    InvalidGridSize { axis: &'static str, size: usize },
    #[error("Seed size {0} must be non-zero and fit in the grid")]
    InvalidSeedSize(usize),
    #[error("Seed has {actual} cells, expected {expected}")]
    SeedLength { expected: usize, actual: usize },
    #[error("Population size {0} out of range")]
    InvalidPopulationSize(usize),
    #[error("{name} {rate} must be within [0, 1]")]
    InvalidRate { name: &'static str, rate: f32 },
    #[error("Tournament size {0} out of range")]
    InvalidTournamentSize(usize),
    #[error("Crossover point count {0} must be within [1, genotype length)")]
    InvalidCrossoverPoints(usize),
    #[error("Uniform crossover bias {0} must be within [0, 1)")]
    InvalidBias(f32),
    #[error("Evaluation steps must be positive")]
    InvalidMaxSteps,
    #[error("Stall factor {0} must be positive")]
    InvalidStallFactor(f32),
    #[error("Fitness weight {name} = {weight} out of range")]
    InvalidWeight { name: &'static str, weight: f32 },
    #[error("History length must be non-zero")]
    InvalidHistoryLength,
    #[error("Sampling stride must be non-zero")]
    InvalidSamplingStride,
}
