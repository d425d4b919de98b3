//! Dense row-major 2-D grid
//!
//! Every band, mask and normalized image in the pipeline is a `Grid`.
//! Shapes are `(rows, cols)`, row 0 is the northern edge of the window.

use std::ops::{Index, IndexMut};

/// A 2-D array stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid filled with one value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Grid { rows, cols, data: vec![value; rows * cols] }
    }

    /// Copies a rectangular sub-grid
    ///
    /// Returns `None` when the requested rectangle leaves the grid.
    pub fn crop(&self, row_off: usize, col_off: usize, rows: usize, cols: usize) -> Option<Grid<T>> {
        if row_off + rows > self.rows || col_off + cols > self.cols {
            return None;
        }
        let mut data = Vec::with_capacity(rows * cols);
        for r in row_off..row_off + rows {
            let start = r * self.cols + col_off;
            data.extend_from_slice(&self.data[start..start + cols]);
        }
        Some(Grid { rows, cols, data })
    }
}

impl<T> Grid<T> {
    /// Wraps a row-major vector, checking its length against the shape
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Grid { rows, cols, data })
    }

    /// Builds a grid by evaluating `f(row, col)` for every cell
    pub fn from_fn<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, mut f: F) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Grid { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Checked cell access
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Applies `f` to every cell, keeping the shape
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid { rows: self.rows, cols: self.cols, data: self.data.iter().map(f).collect() }
    }

    /// Combines two grids of the same shape cell by cell
    ///
    /// Returns `None` on a shape mismatch.
    pub fn zip_map<U, V, F: FnMut(&T, &U) -> V>(&self, other: &Grid<U>, mut f: F) -> Option<Grid<V>> {
        if self.shape() != other.shape() {
            return None;
        }
        let data = self.data.iter().zip(other.data.iter()).map(|(a, b)| f(a, b)).collect();
        Some(Grid { rows: self.rows, cols: self.cols, data })
    }
}

impl Grid<bool> {
    /// Number of `true` cells
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    /// Whether any cell is `true`
    pub fn any(&self) -> bool {
        self.data.iter().any(|v| *v)
    }

    /// Percentage of `true` cells, 0 for an empty grid
    pub fn percent_true(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.count_true() as f64 / self.data.len() as f64 * 100.0
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.cols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row * self.cols + col]
    }
}
