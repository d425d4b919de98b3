//! Byte order handling for GeoTIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian), both when walking the file
//! structure through a reader and when decoding raw sample buffers.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use byteorder::ByteOrder as RawByteOrder;
use std::io::Result;

use crate::io::seekable::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        let byte_order = reader.read_u16::<LittleEndian>()?;
        match byte_order {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II" (Intel)
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM" (Motorola)
            _ => Err(TiffError::InvalidByteOrder(byte_order)),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }
}

/// Trait for byte order handling strategies
pub trait ByteOrderHandler: Send + Sync {
    /// Read a u16 value
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    /// Read a u32 value
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    /// Read a u64 value
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;

    /// Read an f64 value
    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64>;

    /// Decode one unsigned sample of `width` bytes (1, 2, 4 or 8) from a buffer
    ///
    /// The raw bit pattern is returned; interpreting it as signed or
    /// floating point is up to the caller, which knows the sample format.
    fn sample_bits(&self, bytes: &[u8], width: usize) -> u64;

    /// Encode the low bits of `value` into a sample slot of `slot.len()` bytes
    fn write_sample_bits(&self, slot: &mut [u8], value: u64);
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

impl ByteOrderHandler for LittleEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<LittleEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<LittleEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<LittleEndian>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<LittleEndian>()
    }

    fn sample_bits(&self, bytes: &[u8], width: usize) -> u64 {
        match width {
            1 => bytes[0] as u64,
            2 => LittleEndian::read_u16(bytes) as u64,
            4 => LittleEndian::read_u32(bytes) as u64,
            _ => LittleEndian::read_u64(bytes),
        }
    }

    fn write_sample_bits(&self, slot: &mut [u8], value: u64) {
        match slot.len() {
            1 => slot[0] = value as u8,
            2 => LittleEndian::write_u16(slot, value as u16),
            4 => LittleEndian::write_u32(slot, value as u32),
            _ => LittleEndian::write_u64(slot, value),
        }
    }
}

/// Big-endian byte order handler
pub struct BigEndianHandler;

impl ByteOrderHandler for BigEndianHandler {
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<BigEndian>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<BigEndian>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<BigEndian>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<BigEndian>()
    }

    fn sample_bits(&self, bytes: &[u8], width: usize) -> u64 {
        match width {
            1 => bytes[0] as u64,
            2 => BigEndian::read_u16(bytes) as u64,
            4 => BigEndian::read_u32(bytes) as u64,
            _ => BigEndian::read_u64(bytes),
        }
    }

    fn write_sample_bits(&self, slot: &mut [u8], value: u64) {
        match slot.len() {
            1 => slot[0] = value as u8,
            2 => BigEndian::write_u16(slot, value as u16),
            4 => BigEndian::write_u32(slot, value as u32),
            _ => BigEndian::write_u64(slot, value),
        }
    }
}
