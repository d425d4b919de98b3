//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for the block codecs a GeoTIFF may use
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Compress one strip or tile
    ///
    /// Test support: the pipeline only reads rasters, and this is what the
    /// GeoTIFF fixture writer uses to lay out compressed blocks.
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Human-readable codec name, used in log lines
    fn name(&self) -> &'static str;
}
