//! Nearest-neighbour resampling

use crate::raster::grid::Grid;

/// Resamples a grid to `out_rows` x `out_cols` by sampling pixel centres
///
/// Output cell `(r, c)` takes the source cell containing the point
/// `((r + 0.5) * rows / out_rows, (c + 0.5) * cols / out_cols)`.
pub fn nearest<T: Copy>(grid: &Grid<T>, out_rows: usize, out_cols: usize) -> Option<Grid<T>> {
    let (rows, cols) = grid.shape();
    if rows == 0 || cols == 0 {
        return None;
    }
    if (rows, cols) == (out_rows, out_cols) {
        return Some(grid.clone());
    }

    let source_index = |i: usize, from: usize, to: usize| {
        let pos = ((i as f64 + 0.5) * from as f64 / to as f64).floor() as usize;
        pos.min(from - 1)
    };

    Some(Grid::from_fn(out_rows, out_cols, |r, c| {
        grid[(source_index(r, rows, out_rows), source_index(c, cols, out_cols))]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsample_repeats_cells() {
        let grid = Grid::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
        let up = nearest(&grid, 4, 4).unwrap();
        assert_eq!(up.data(), &[1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4]);
    }

    #[test]
    fn test_downsample_non_integer_ratio() {
        let grid = Grid::from_fn(1, 9, |_, c| c);
        let down = nearest(&grid, 1, 4).unwrap();
        // centres at 1.125, 3.375, 5.625, 7.875
        assert_eq!(down.data(), &[1, 3, 5, 7]);
    }

    #[test]
    fn test_empty_grid() {
        let grid: Grid<u8> = Grid::from_vec(0, 0, vec![]).unwrap();
        assert!(nearest(&grid, 3, 3).is_none());
    }
}
