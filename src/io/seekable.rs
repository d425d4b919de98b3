//! Seekable reader trait
//!
//! Raster assets are decoded from anything that can both read and seek:
//! local files, buffered files, or in-memory cursors in tests.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
