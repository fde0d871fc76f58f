//! Generational genetic algorithm over binary seed chromosomes.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::compute::LifeError;
use crate::schema::{EaConfig, SimulationConfig};

use super::fitness::FitnessEvaluator;
use super::genome::{BinaryChromosome, GenomeRng, Phenotype};

/// A candidate individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub genotype: BinaryChromosome,
    /// `None` until evaluated.
    pub fitness: Option<f32>,
}

impl Candidate {
    fn new(genotype: BinaryChromosome) -> Self {
        Self {
            genotype,
            fitness: None,
        }
    }

    #[inline]
    fn score(&self) -> f32 {
        self.fitness.unwrap_or(f32::NEG_INFINITY)
    }
}

/// Counters and fitness summary of the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationStats {
    pub generation: u64,
    pub evaluations: u64,
    pub evaluations_delta: u64,
    pub ca_steps: u64,
    pub ca_steps_delta: u64,
    pub max_fitness: Option<f32>,
    pub avg_fitness: Option<f32>,
}

/// Genetic algorithm searching for Game of Life seeds.
pub struct EvolutionaryAlgorithm {
    config: EaConfig,
    seed_size: usize,
    rng: GenomeRng,
    evaluator: FitnessEvaluator,
    population: Vec<Candidate>,
    generation: u64,
    evaluations: u64,
    evaluations_delta: u64,
    ca_steps: u64,
    ca_steps_delta: u64,
}

impl EvolutionaryAlgorithm {
    pub fn new(config: &SimulationConfig) -> Result<Self, LifeError> {
        let evaluator = FitnessEvaluator::new(config)?;
        let rng = match config.ea.random_seed {
            Some(seed) => GenomeRng::new(seed),
            None => GenomeRng::random(),
        };

        Ok(Self {
            config: config.ea.clone(),
            seed_size: config.ca.seed_size,
            rng,
            evaluator,
            population: Vec::new(),
            generation: 0,
            evaluations: 0,
            evaluations_delta: 0,
            ca_steps: 0,
            ca_steps_delta: 0,
        })
    }

    #[inline]
    fn genotype_len(&self) -> usize {
        self.seed_size * self.seed_size
    }

    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Number of completed generations.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Produce and evaluate the next generation (the first call creates a
    /// random population).
    pub fn step(&mut self) {
        if self.population.is_empty() {
            self.populate();
        } else {
            self.breed();
        }
        self.evaluate_population();
        self.generation += 1;

        log::debug!(
            "Generation {}: {} evaluations, {} CA steps",
            self.generation,
            self.evaluations_delta,
            self.ca_steps_delta
        );
    }

    fn populate(&mut self) {
        let len = self.genotype_len();
        self.population = (0..self.config.population_size)
            .map(|_| Candidate::new(self.rng.random_chromosome(len)))
            .collect();
    }

    /// Breed a new generation from the current one.
    ///
    /// With elitism the best candidate survives unmutated and keeps its
    /// fitness, so it is not evaluated again.
    fn breed(&mut self) {
        let size = self.config.population_size;
        let bit_prob = 1.0 / self.genotype_len() as f64;
        let mut next_gen = Vec::with_capacity(size);

        if self.config.elitism
            && let Some(best) = self.best_candidate()
        {
            next_gen.push(best.clone());
        }

        while next_gen.len() < size {
            let mut genotype = if self.rng.chance(self.config.recombination_rate) {
                let idx1 = self.select_index();
                let idx2 = self.select_index();
                self.rng.crossover(
                    &self.config.recombination,
                    &self.population[idx1].genotype,
                    &self.population[idx2].genotype,
                )
            } else {
                let idx = self.select_index();
                self.population[idx].genotype.clone()
            };

            if self.rng.chance(self.config.mutation_rate) {
                self.rng.mutate(&mut genotype, bit_prob);
            }
            next_gen.push(Candidate::new(genotype));
        }

        self.population = next_gen;
    }

    /// Tournament selection.
    fn select_index(&mut self) -> usize {
        let len = self.population.len();
        let mut best_idx = self.rng.index(len);
        for _ in 1..self.config.tournament_size {
            let idx = self.rng.index(len);
            if self.population[idx].score() > self.population[best_idx].score() {
                best_idx = idx;
            }
        }
        best_idx
    }

    /// Evaluate all unevaluated candidates in the population.
    #[cfg(not(target_arch = "wasm32"))]
    fn evaluate_population(&mut self) {
        let evaluator = &self.evaluator;
        let seed_size = self.seed_size;

        // Parallel evaluation
        let steps: Vec<u64> = self
            .population
            .par_iter_mut()
            .filter(|candidate| candidate.fitness.is_none())
            .map(|candidate| {
                let (fitness, stats) = evaluator.evaluate(&candidate.genotype.express(seed_size));
                candidate.fitness = Some(fitness);
                stats.steps
            })
            .collect();

        self.record_evaluations(&steps);
    }

    #[cfg(target_arch = "wasm32")]
    fn evaluate_population(&mut self) {
        let evaluator = &self.evaluator;
        let seed_size = self.seed_size;

        // Sequential evaluation for WASM
        let mut steps = Vec::new();
        for candidate in self.population.iter_mut().filter(|c| c.fitness.is_none()) {
            let (fitness, stats) = evaluator.evaluate(&candidate.genotype.express(seed_size));
            candidate.fitness = Some(fitness);
            steps.push(stats.steps);
        }

        self.record_evaluations(&steps);
    }

    fn record_evaluations(&mut self, steps: &[u64]) {
        self.evaluations_delta = steps.len() as u64;
        self.ca_steps_delta = steps.iter().sum();
        self.evaluations += self.evaluations_delta;
        self.ca_steps += self.ca_steps_delta;
    }

    /// Fittest evaluated candidate.
    pub fn best_candidate(&self) -> Option<&Candidate> {
        self.population
            .iter()
            .filter(|c| c.fitness.is_some())
            .max_by(|a, b| a.score().total_cmp(&b.score()))
    }

    pub fn best_phenotype(&self) -> Option<Phenotype> {
        self.best_candidate()
            .map(|c| c.genotype.express(self.seed_size))
    }

    pub fn stats(&self) -> GenerationStats {
        let fitnesses: Vec<f32> = self.population.iter().filter_map(|c| c.fitness).collect();
        let (max_fitness, avg_fitness) = if fitnesses.is_empty() {
            (None, None)
        } else {
            let max = fitnesses.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let avg = fitnesses.iter().sum::<f32>() / fitnesses.len() as f32;
            (Some(max), Some(avg))
        };

        GenerationStats {
            generation: self.generation,
            evaluations: self.evaluations,
            evaluations_delta: self.evaluations_delta,
            ca_steps: self.ca_steps,
            ca_steps_delta: self.ca_steps_delta,
            max_fitness,
            avg_fitness,
        }
    }

    /// Fraction of the population with each gene set.
    pub fn gene_distribution(&self) -> Vec<f32> {
        let mut counts = vec![0u32; self.genotype_len()];
        for candidate in &self.population {
            for (count, &bit) in counts.iter_mut().zip(candidate.genotype.bits()) {
                *count += bit as u32;
            }
        }
        self.normalize(counts)
    }

    /// Fraction of the population with each phenotype cell alive, row-major.
    pub fn cell_distribution(&self) -> Vec<f32> {
        let mut counts = vec![0u32; self.genotype_len()];
        for candidate in &self.population {
            let phenotype = candidate.genotype.express(self.seed_size);
            for (count, &cell) in counts.iter_mut().zip(&phenotype.cells) {
                *count += cell as u32;
            }
        }
        self.normalize(counts)
    }

    fn normalize(&self, counts: Vec<u32>) -> Vec<f32> {
        let n = self.population.len().max(1) as f32;
        counts.into_iter().map(|c| c as f32 / n).collect()
    }
}
