//! Binary morphology with a 5-point cross kernel
//!
//! Each iteration combines every pixel with its four direct neighbours.
//! Neighbours outside the grid take no part: they neither add pixels on
//! dilation nor remove pixels on erosion, and nothing wraps around.

use crate::raster::grid::Grid;

/// Centre plus the four direct neighbours
const CROSS: [(isize, isize); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];

/// Binary dilation (union over the kernel), `iterations` times
pub fn dilate(mask: &Grid<bool>, iterations: usize) -> Grid<bool> {
    (0..iterations).fold(mask.clone(), |current, _| step(&current, false, |acc, v| acc || v))
}

/// Binary erosion (intersection over the kernel), `iterations` times
pub fn erode(mask: &Grid<bool>, iterations: usize) -> Grid<bool> {
    (0..iterations).fold(mask.clone(), |current, _| step(&current, true, |acc, v| acc && v))
}

/// One pass: fold every in-grid kernel neighbour into `init` with `combine`
fn step<F: Fn(bool, bool) -> bool>(mask: &Grid<bool>, init: bool, combine: F) -> Grid<bool> {
    let (rows, cols) = mask.shape();
    Grid::from_fn(rows, cols, |r, c| {
        CROSS.iter().fold(init, |acc, (dr, dc)| {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                acc
            } else {
                combine(acc, mask[(nr as usize, nc as usize)])
            }
        })
    })
}
