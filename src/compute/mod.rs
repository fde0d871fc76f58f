//! Compute module - Game of Life grid and evolutionary seed search.

mod life;

pub mod evolution;

pub use life::*;
