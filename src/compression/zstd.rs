//! Handler for ZSTD compressed data

use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use log::{trace, warn};

/// ZSTD compression handler (compression code 14)
pub struct ZstdHandler {
    /// Level used when compressing (1-22)
    compression_level: i32,
}

impl ZstdHandler {
    /// Create a new ZSTD handler with the default level of 3
    pub fn new() -> Self {
        ZstdHandler {
            compression_level: 3
        }
    }
}

impl Default for ZstdHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        zstd::decode_all(data)
            .map(|decompressed| {
                trace!("ZSTD: {} -> {} bytes", data.len(), decompressed.len());
                decompressed
            })
            .map_err(|e| {
                warn!("ZSTD decompression error: {}", e);
                TiffError::GenericError(format!("ZSTD decompression error: {}", e))
            })
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        zstd::encode_all(data, self.compression_level)
            .map_err(|e| TiffError::GenericError(format!("ZSTD compression error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }
}
