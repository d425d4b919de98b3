//! I/O primitives for raster decoding
//!
//! Byte order strategies and the seekable reader abstraction used by the
//! GeoTIFF reader.

pub mod seekable;
pub mod byte_order;
