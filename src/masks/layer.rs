//! Optional mask layers
//!
//! Quality and land-cover bands may be missing for a scene. Every
//! consumer matches on `MaskLayer` and handles both arms explicitly.

use crate::raster::grid::Grid;

/// A mask that may be absent
#[derive(Debug, Clone, PartialEq)]
pub enum MaskLayer {
    Present(Grid<bool>),
    Absent,
}

impl MaskLayer {
    pub fn is_present(&self) -> bool {
        matches!(self, MaskLayer::Present(_))
    }

    /// Borrow the mask when present
    pub fn as_grid(&self) -> Option<&Grid<bool>> {
        match self {
            MaskLayer::Present(grid) => Some(grid),
            MaskLayer::Absent => None,
        }
    }

    /// Drops a present mask whose shape differs from `shape`
    pub fn matching_shape(self, shape: (usize, usize)) -> MaskLayer {
        match self {
            MaskLayer::Present(grid) if grid.shape() == shape => MaskLayer::Present(grid),
            _ => MaskLayer::Absent,
        }
    }
}

impl From<Option<Grid<bool>>> for MaskLayer {
    fn from(mask: Option<Grid<bool>>) -> Self {
        match mask {
            Some(grid) => MaskLayer::Present(grid),
            None => MaskLayer::Absent,
        }
    }
}
