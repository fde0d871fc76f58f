//! Game of Life engine: steps a seeded grid.

use crate::compute::GameOfLife;
use crate::schema::{Observation, SimulationConfig};

use super::{Engine, EngineError, EngineFactory};

/// Game of Life seeded with the configured patch at the grid center.
#[derive(Debug)]
pub struct LifeEngine {
    life: GameOfLife,
}

impl LifeEngine {
    /// Fails with [`EngineError::MissingSeed`] when the config has no seed.
    pub fn new(config: &SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let seed = config.ca.seed.as_deref().ok_or(EngineError::MissingSeed)?;

        let mut life = GameOfLife::new(config.ca.width, config.ca.height, config.ca.border)?;
        life.seed_patch(seed, config.ca.seed_size)?;
        log::info!(
            "Game of Life {}x{} seeded with {} cells",
            life.width(),
            life.height(),
            life.num_alive()
        );

        Ok(Self { life })
    }

    pub fn life(&self) -> &GameOfLife {
        &self.life
    }
}

impl Engine for LifeEngine {
    fn step(&mut self) -> Result<Observation, EngineError> {
        self.life.step();
        Ok(self.observe())
    }

    fn reset(&mut self, config: &SimulationConfig) -> Result<Observation, EngineError> {
        *self = Self::new(config)?;
        Ok(self.observe())
    }

    fn observe(&self) -> Observation {
        let steps = self.life.steps();
        Observation {
            step: steps,
            ca_steps: steps,
            ca_steps_delta: u64::from(steps > 0),
            active_cells: self.life.num_alive(),
            grid: Some(self.life.snapshot()),
            ..Default::default()
        }
    }
}

/// Creates [`LifeEngine`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifeEngineFactory;

impl EngineFactory for LifeEngineFactory {
    type Engine = LifeEngine;

    fn create(&self, config: &SimulationConfig) -> Result<LifeEngine, EngineError> {
        LifeEngine::new(config)
    }
}
