//! Core TIFF data structures

use crate::tiff::ifd::IFD;
use std::fmt;

/// Represents a TIFF file with its Image File Directories (IFDs)
#[derive(Debug)]
pub struct TIFF {
    /// Image File Directories in the TIFF file
    pub ifds: Vec<IFD>,
    /// Whether this is a BigTIFF format
    pub is_big_tiff: bool,
}

impl TIFF {
    /// Creates a new empty TIFF structure
    pub fn new(is_big_tiff: bool) -> Self {
        TIFF {
            ifds: Vec::new(),
            is_big_tiff,
        }
    }

    /// Returns the main (first) IFD if available
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// Returns the first full-resolution IFD
    ///
    /// Cloud-optimized GeoTIFFs put the full-resolution image first, but
    /// files written by other tools may lead with an overview.
    pub fn full_resolution_ifd(&self) -> Option<&IFD> {
        self.ifds.iter()
            .find(|ifd| !ifd.is_overview())
            .or_else(|| self.main_ifd())
    }

    /// Returns the number of IFDs in the TIFF file
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with {} IFDs", if self.is_big_tiff { "BigTIFF" } else { "TIFF" }, self.ifds.len())
    }
}
