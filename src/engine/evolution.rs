//! Evolutionary algorithm engine: one generation per step.

use crate::compute::evolution::EvolutionaryAlgorithm;
use crate::schema::{Observation, SimulationConfig};

use super::{Engine, EngineError, EngineFactory};

/// Genetic algorithm searching for Game of Life seeds.
pub struct EvolutionEngine {
    ea: EvolutionaryAlgorithm,
}

impl EvolutionEngine {
    pub fn new(config: &SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let ea = EvolutionaryAlgorithm::new(config)?;
        log::info!(
            "Evolution engine: population {}, {}x{} seed patch",
            config.ea.population_size,
            config.ca.seed_size,
            config.ca.seed_size
        );
        Ok(Self { ea })
    }
}

impl Engine for EvolutionEngine {
    fn step(&mut self) -> Result<Observation, EngineError> {
        self.ea.step();
        Ok(self.observe())
    }

    fn reset(&mut self, config: &SimulationConfig) -> Result<Observation, EngineError> {
        *self = Self::new(config)?;
        Ok(self.observe())
    }

    fn observe(&self) -> Observation {
        let stats = self.ea.stats();
        let best = self.ea.best_candidate();
        let phenotype = self.ea.best_phenotype();
        let has_population = !self.ea.population().is_empty();

        Observation {
            step: stats.generation,
            evaluations: stats.evaluations,
            evaluations_delta: stats.evaluations_delta,
            ca_steps: stats.ca_steps,
            ca_steps_delta: stats.ca_steps_delta,
            max_fitness: stats.max_fitness,
            avg_fitness: stats.avg_fitness,
            active_cells: phenotype.as_ref().map_or(0, |p| p.num_alive()),
            grid: None,
            best_genotype: best.map(|c| c.genotype.to_bit_string()),
            best_phenotype: phenotype.map(|p| p.to_bit_string()),
            gene_distribution: has_population.then(|| self.ea.gene_distribution()),
            cell_distribution: has_population.then(|| self.ea.cell_distribution()),
        }
    }
}

/// Creates [`EvolutionEngine`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvolutionEngineFactory;

impl EngineFactory for EvolutionEngineFactory {
    type Engine = EvolutionEngine;

    fn create(&self, config: &SimulationConfig) -> Result<EvolutionEngine, EngineError> {
        EvolutionEngine::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.ca.width = 16;
        config.ca.height = 16;
        config.ca.seed_size = 4;
        config.ea.population_size = 10;
        config.ea.max_steps = 20;
        config.ea.random_seed = Some(11);
        config
    }

    #[test]
    fn test_initial_observation_is_empty() {
        let engine = EvolutionEngineFactory.create(&small_config()).unwrap();
        let obs = engine.observe();
        assert_eq!(obs.step, 0);
        assert!(obs.max_fitness.is_none());
        assert!(obs.best_phenotype.is_none());
        assert!(obs.gene_distribution.is_none());
    }

    #[test]
    fn test_step_reports_generation() {
        let mut engine = EvolutionEngine::new(&small_config()).unwrap();
        let obs = engine.step().unwrap();

        assert_eq!(obs.step, 1);
        assert_eq!(obs.evaluations, 10);
        assert_eq!(obs.evaluations_delta, 10);
        assert!(obs.max_fitness.is_some());
        assert_eq!(obs.best_genotype.as_ref().map(String::len), Some(16));
        let phenotype = obs.best_phenotype.unwrap();
        assert_eq!(phenotype.len(), 16);
        assert_eq!(
            obs.active_cells,
            phenotype.chars().filter(|&c| c == '1').count()
        );
        assert_eq!(obs.cell_distribution.map(|d| d.len()), Some(16));
    }

    #[test]
    fn test_reset_restarts_counters() {
        let mut engine = EvolutionEngine::new(&small_config()).unwrap();
        engine.step().unwrap();
        engine.step().unwrap();

        let obs = engine.reset(&small_config()).unwrap();
        assert_eq!(obs.step, 0);
        assert_eq!(obs.evaluations, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.ea.population_size = 0;
        assert!(matches!(
            EvolutionEngine::new(&config),
            Err(EngineError::Config(_))
        ));
    }
}
