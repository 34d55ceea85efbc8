use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Dense 2D grid of per-cell values.
///
/// Cells are addressed `(i, j)` with `i < n_x`, `j < n_y`, stored row-major
/// with `i` as the row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field<T> {
    n_x: usize,
    n_y: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Field<T> {
    pub fn zeros(n_x: usize, n_y: usize) -> Self {
        assert!(n_x > 0 && n_y > 0, "field dimensions must be positive");
        Self {
            n_x,
            n_y,
            data: vec![T::default(); n_x * n_y],
        }
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[self.flat(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        let idx = self.flat(i, j);
        self.data[idx] = value;
    }

    /// Fill every cell of rows `rows` (clamped to the grid) with `value`.
    pub fn fill_rows(&mut self, rows: std::ops::Range<usize>, value: T) {
        let start = rows.start.min(self.n_x) * self.n_y;
        let end = rows.end.min(self.n_x) * self.n_y;
        if start < end {
            self.data[start..end].fill(value);
        }
    }
}

impl<T> Field<T> {
    pub fn n_x(&self) -> usize {
        self.n_x
    }

    pub fn n_y(&self) -> usize {
        self.n_y
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Rows of the grid, `i` ascending.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.n_y)
    }

    /// Resolve a signed coordinate to an in-bounds cell, or `None` when it
    /// falls off the grid. No wrapping.
    pub fn resolve(&self, i: isize, j: isize) -> Option<(usize, usize)> {
        if i < 0 || j < 0 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);
        (i < self.n_x && j < self.n_y).then_some((i, j))
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        i < self.n_x && j < self.n_y
    }

    fn flat(&self, i: usize, j: usize) -> usize {
        debug_assert!(self.contains(i, j), "cell ({i}, {j}) out of bounds");
        i * self.n_y + j
    }
}

impl<T> Index<(usize, usize)> for Field<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(self.contains(i, j), "cell ({i}, {j}) out of bounds");
        &self.data[i * self.n_y + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Field<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        assert!(self.contains(i, j), "cell ({i}, {j}) out of bounds");
        &mut self.data[i * self.n_y + j]
    }
}

impl Field<u64> {
    pub fn total(&self) -> u64 {
        self.data.iter().sum()
    }

    pub fn occupied(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }
}

impl Field<f64> {
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.total() / self.data.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

impl Field<u8> {
    /// Sorted distinct values present in the field.
    pub fn distinct(&self) -> Vec<u8> {
        let mut seen = [false; 256];
        for &v in &self.data {
            seen[v as usize] = true;
        }
        (0..=255u8).filter(|&v| seen[v as usize]).collect()
    }
}
