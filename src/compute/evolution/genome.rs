//! Binary chromosomes and their variation operators.
//!
//! Provides random generation, crossover, and mutation operations.

use rand::prelude::*;
use rand_distr::Geometric;

use crate::schema::Recombination;

/// Fixed-length bit string genotype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryChromosome {
    bits: Vec<bool>,
}

impl BinaryChromosome {
    pub fn zeroes(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn ones(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn get(&self, i: usize) -> bool {
        self.bits[i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: bool) {
        self.bits[i] = value;
    }

    #[inline]
    pub fn flip(&mut self, i: usize) {
        self.bits[i] = !self.bits[i];
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Render as `'0'`/`'1'` characters.
    pub fn to_bit_string(&self) -> String {
        bit_string(&self.bits)
    }

    /// Express as a square seed patch.
    ///
    /// Gene `x * size + y` drives cell `(x, y)`; the phenotype is stored
    /// row-major so it can be placed directly onto a grid.
    pub fn express(&self, size: usize) -> Phenotype {
        let mut cells = vec![false; size * size];
        for x in 0..size {
            for y in 0..size {
                cells[y * size + x] = self.bits[x * size + y];
            }
        }
        Phenotype { size, cells }
    }
}

/// Square seed patch, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phenotype {
    pub size: usize,
    pub cells: Vec<bool>,
}

impl Phenotype {
    pub fn num_alive(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn to_bit_string(&self) -> String {
        bit_string(&self.cells)
    }
}

fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

/// Random number generator wrapper for chromosome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Chromosome with every bit drawn uniformly.
    pub fn random_chromosome(&mut self, len: usize) -> BinaryChromosome {
        BinaryChromosome {
            bits: (0..len).map(|_| self.rng.r#gen::<bool>()).collect(),
        }
    }

    /// True with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.r#gen::<f32>() < p
    }

    /// Uniform index in `0..len`.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Flip each bit independently with probability `bit_prob`.
    ///
    /// Draws the gap to the next flipped bit from a geometric distribution
    /// instead of rolling once per bit.
    pub fn mutate(&mut self, target: &mut BinaryChromosome, bit_prob: f64) {
        let Ok(skips) = Geometric::new(bit_prob) else {
            return;
        };
        if bit_prob <= 0.0 {
            return;
        }

        let mut i = 0usize;
        loop {
            let skip = usize::try_from(skips.sample(&mut self.rng)).unwrap_or(usize::MAX);
            i = i.saturating_add(skip);
            if i >= target.len() {
                return;
            }
            target.flip(i);
            i += 1;
        }
    }

    /// Breed a child from two parents with the configured operator.
    pub fn crossover(
        &mut self,
        method: &Recombination,
        parent1: &BinaryChromosome,
        parent2: &BinaryChromosome,
    ) -> BinaryChromosome {
        match *method {
            Recombination::NPoint { points } => self.n_point_crossover(points, parent1, parent2),
            Recombination::Uniform { bias } => self.uniform_crossover(bias, parent1, parent2),
        }
    }

    /// Alternate parents between `n` random cut points, starting with `parent1`.
    fn n_point_crossover(
        &mut self,
        n: usize,
        parent1: &BinaryChromosome,
        parent2: &BinaryChromosome,
    ) -> BinaryChromosome {
        let len = parent1.len().min(parent2.len());
        let mut child = parent1.clone();
        if len < 2 {
            return child;
        }

        let mut points: Vec<usize> = (0..n).map(|_| self.rng.gen_range(1..len)).collect();
        points.sort_unstable();
        if points.len() % 2 == 1 {
            points.push(len);
        }

        for pair in points.chunks_exact(2) {
            for j in pair[0]..pair[1] {
                child.set(j, parent2.get(j));
            }
        }
        child
    }

    /// Take each bit from `parent2` with probability `(1 - bias) / 2`.
    fn uniform_crossover(
        &mut self,
        bias: f32,
        parent1: &BinaryChromosome,
        parent2: &BinaryChromosome,
    ) -> BinaryChromosome {
        let limit = 0.5 * (1.0 + bias);
        let mut child = parent1.clone();
        for i in 0..child.len().min(parent2.len()) {
            if self.rng.r#gen::<f32>() >= limit {
                child.set(i, parent2.get(i));
            }
        }
        child
    }

    /// Get next random u64 (for seeding child RNGs).
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}
