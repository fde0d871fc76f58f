//! Cumulative record of grid cells that were ever alive.

use crate::schema::GridSnapshot;

/// One flag per grid cell, set once a cell is seen alive.
#[derive(Debug, Clone, Default)]
pub struct ActivationMap {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    count: usize,
}

impl ActivationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every alive cell of `grid`; returns the number of newly marked cells.
    ///
    /// An empty map takes the dimensions of the first grid it sees. Grids with
    /// other dimensions are ignored until the map is cleared.
    pub fn record(&mut self, grid: &GridSnapshot) -> usize {
        if self.cells.is_empty() {
            self.width = grid.width;
            self.height = grid.height;
            self.cells = vec![false; grid.width * grid.height];
        } else if grid.width != self.width || grid.height != self.height {
            log::warn!(
                "Ignoring {}x{} grid for {}x{} activation map",
                grid.width,
                grid.height,
                self.width,
                self.height
            );
            return 0;
        }

        let mut marked = 0;
        for (seen, &alive) in self.cells.iter_mut().zip(&grid.cells) {
            if alive && !*seen {
                *seen = true;
                marked += 1;
            }
        }
        self.count += marked;
        marked
    }

    /// Forget every mark and the dimensions.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of cells ever alive.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major flags.
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(width: usize, height: usize, alive: &[usize]) -> GridSnapshot {
        let mut cells = vec![false; width * height];
        for &i in alive {
            cells[i] = true;
        }
        GridSnapshot {
            width,
            height,
            cells,
        }
    }

    #[test]
    fn test_accumulates_and_clears() {
        let mut map = ActivationMap::new();
        assert_eq!(map.record(&grid(3, 3, &[0, 4])), 2);
        assert_eq!(map.record(&grid(3, 3, &[4, 8])), 1);
        assert_eq!(map.count(), 3);
        assert!(map.is_set(0, 0) && map.is_set(1, 1) && map.is_set(2, 2));
        assert!(!map.is_set(1, 0));
        assert!(!map.is_set(5, 5));

        map.clear();
        assert_eq!(map.count(), 0);
        assert!(map.cells().iter().all(|&c| !c));
    }

    #[test]
    fn test_mismatched_grid_is_ignored() {
        let mut map = ActivationMap::new();
        map.record(&grid(3, 3, &[0, 1, 2]));
        assert_eq!(map.record(&grid(4, 4, &[15])), 0);
        assert_eq!(map.count(), 3);
        assert_eq!((map.width(), map.height()), (3, 3));
        assert!(map.is_set(2, 0));

        // After a clear the next grid sets the dimensions.
        map.clear();
        assert_eq!((map.width(), map.height()), (0, 0));
        assert_eq!(map.record(&grid(4, 4, &[15])), 1);
        assert_eq!((map.width(), map.height()), (4, 4));
        assert!(map.is_set(3, 3));
    }

    proptest! {
        #[test]
        fn prop_marks_are_monotonic(
            frames in prop::collection::vec(prop::collection::vec(any::<bool>(), 25), 1..20)
        ) {
            let mut map = ActivationMap::new();
            let mut previous = vec![false; 25];
            for cells in frames {
                let snapshot = GridSnapshot { width: 5, height: 5, cells: cells.clone() };
                map.record(&snapshot);
                for i in 0..25 {
                    prop_assert!(!previous[i] || map.cells()[i]);
                    prop_assert!(!cells[i] || map.cells()[i]);
                }
                prop_assert_eq!(map.count(), map.cells().iter().filter(|&&c| c).count());
                previous = map.cells().to_vec();
            }
        }
    }
}
