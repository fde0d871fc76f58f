//! Evolutionary search for Game of Life seed patterns.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): binary chromosomes, expression into
//!   seed patches, bit-flip mutation, N-point and uniform crossover
//! - **Fitness** (`fitness`): runs a seed on a Game of Life grid and scores
//!   the trial with configurable weights
//! - **Search** (`search`): generational GA with tournament selection and
//!   optional elitism
//!
//! # Example
//!
//! ```rust,no_run
//! use ga_of_life::schema::SimulationConfig;
//! use ga_of_life::compute::evolution::EvolutionaryAlgorithm;
//!
//! let config = SimulationConfig::default();
//! let mut ea = EvolutionaryAlgorithm::new(&config).unwrap();
//! for _ in 0..10 {
//!     ea.step();
//!     let stats = ea.stats();
//!     println!("Generation {}: max fitness = {:?}", stats.generation, stats.max_fitness);
//! }
//!
//! if let Some(best) = ea.best_phenotype() {
//!     println!("Best seed: {}", best.to_bit_string());
//! }
//! ```

mod fitness;
mod genome;
mod search;

pub use fitness::{FitnessEvaluator, TrialStats};
pub use genome::{BinaryChromosome, GenomeRng, Phenotype};
pub use search::{Candidate, EvolutionaryAlgorithm, GenerationStats};
