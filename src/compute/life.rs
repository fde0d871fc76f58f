//! Conway's Game of Life on a finite grid.
//!
//! Cells are stored as a flat row-major `Vec<u8>` (0 dead, 1 alive) with a
//! second buffer for the next generation, swapped after every step.

use crate::schema::{GridBorder, GridSnapshot, MIN_GRID_SIZE};

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

/// Grids with at least this many cells are stepped row-parallel.
#[cfg(not(target_arch = "wasm32"))]
const PARALLEL_THRESHOLD: usize = 128 * 128;

/// Game of Life grid with B3/S23 rules.
#[derive(Debug, Clone)]
pub struct GameOfLife {
    width: usize,
    height: usize,
    border: GridBorder,
    cells: Vec<u8>,
    next: Vec<u8>,
    steps: u64,
}

impl GameOfLife {
    pub fn new(width: usize, height: usize, border: GridBorder) -> Result<Self, LifeError> {
        if width < MIN_GRID_SIZE || height < MIN_GRID_SIZE {
            return Err(LifeError::InvalidDimensions { width, height });
        }
        let len = width * height;
        Ok(Self {
            width,
            height,
            border,
            cells: vec![0; len],
            next: vec![0; len],
            steps: 0,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn border(&self) -> GridBorder {
        self.border
    }

    /// Number of steps since creation or the last [`clear`](Self::clear).
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[y * self.width + x] = alive as u8;
    }

    /// Raw cell buffer, row-major, 0 or 1 per cell.
    #[inline]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Kill every cell and reset the step counter.
    pub fn clear(&mut self) {
        self.cells.fill(0);
        self.steps = 0;
    }

    pub fn num_alive(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Place a `size x size` row-major bit string at the grid center.
    ///
    /// `'0'` is a dead cell, any other character an alive one. Cells outside
    /// the patch are left untouched.
    pub fn seed_patch(&mut self, seed: &str, size: usize) -> Result<(), LifeError> {
        if size > self.width || size > self.height {
            return Err(LifeError::PatchTooLarge {
                size,
                width: self.width,
                height: self.height,
            });
        }
        let len = seed.chars().count();
        if len != size * size {
            return Err(LifeError::SeedLength {
                expected: size * size,
                actual: len,
            });
        }

        let (x0, y0) = self.patch_origin(size);
        for (i, c) in seed.chars().enumerate() {
            let (x, y) = (i % size, i / size);
            self.set(x0 + x, y0 + y, c != '0');
        }
        Ok(())
    }

    /// Top-left cell of a centered `size x size` patch.
    #[inline]
    pub fn patch_origin(&self, size: usize) -> (usize, usize) {
        ((self.width - size) / 2, (self.height - size) / 2)
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        let (width, height, border) = (self.width, self.height, self.border);
        let cells = &self.cells;

        #[cfg(not(target_arch = "wasm32"))]
        {
            if cells.len() >= PARALLEL_THRESHOLD {
                self.next
                    .par_chunks_mut(width)
                    .enumerate()
                    .for_each(|(y, row)| next_row(cells, width, height, border, y, row));
            } else {
                for (y, row) in self.next.chunks_mut(width).enumerate() {
                    next_row(cells, width, height, border, y, row);
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            for (y, row) in self.next.chunks_mut(width).enumerate() {
                next_row(cells, width, height, border, y, row);
            }
        }

        std::mem::swap(&mut self.cells, &mut self.next);
        self.steps += 1;
    }

    /// Owned copy of the grid for observers.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(|&c| c != 0).collect(),
        }
    }
}

fn next_row(
    cells: &[u8],
    width: usize,
    height: usize,
    border: GridBorder,
    y: usize,
    row: &mut [u8],
) {
    for (x, out) in row.iter_mut().enumerate() {
        let n = live_neighbors(cells, width, height, border, x, y);
        let alive = cells[y * width + x] != 0;
        *out = matches!((alive, n), (true, 2) | (_, 3)) as u8;
    }
}

fn live_neighbors(
    cells: &[u8],
    width: usize,
    height: usize,
    border: GridBorder,
    x: usize,
    y: usize,
) -> u8 {
    let mut count = 0;
    for dy in [-1isize, 0, 1] {
        for dx in [-1isize, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            let (nx, ny) = match border {
                GridBorder::Wrapped => (
                    nx.rem_euclid(width as isize) as usize,
                    ny.rem_euclid(height as isize) as usize,
                ),
                GridBorder::Zeroes => {
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    (nx as usize, ny as usize)
                }
            };
            count += cells[ny * width + nx];
        }
    }
    count
}

/// Game of Life construction and seeding errors.
#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    #[error("Grid must be at least {MIN_GRID_SIZE}x{MIN_GRID_SIZE}, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("Seed patch {size}x{size} does not fit in {width}x{height} grid")]
    PatchTooLarge {
        size: usize,
        width: usize,
        height: usize,
    },
    #[error("Seed has {actual} cells, expected {expected}")]
    SeedLength { expected: usize, actual: usize },
}
