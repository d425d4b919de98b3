//! Compression handling for GeoTIFF blocks
//!
//! Each supported Compression tag value maps to a strategy object
//! created by `CompressionFactory`.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
