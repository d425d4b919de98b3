//! TIFF file reader implementation
//!
//! This module walks the TIFF/BigTIFF directory structure using the
//! Strategy pattern to handle different byte orders. It reads structure
//! and tag values only; pixel data is decoded by the extractor.

use log::{debug, warn};
use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;

/// Upper bound on the IFD chain length, guards against offset loops
const MAX_IFDS: usize = 64;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
        }
    }

    /// Returns the byte order handler, or an error before `read` has run
    pub fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler.as_deref()
            .ok_or_else(|| TiffError::GenericError("Byte order not yet determined".to_string()))
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Reads the TIFF structure from the given reader
    ///
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read all IFDs (Image File Directories)
    ///
    /// # Arguments
    /// * `reader` - Any struct implementing the SeekableReader trait
    ///
    /// # Returns
    /// A TIFF structure containing the file's directories
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        self.byte_order_handler = Some(byte_order.create_handler());

        self.is_big_tiff = self.detect_format(reader)?;
        let first_ifd_offset = self.read_offset(reader)?;
        debug!("First IFD offset: {}", first_ifd_offset);

        let file_size = file_size(reader)?;
        if first_ifd_offset >= file_size || first_ifd_offset < 8 {
            return Err(TiffError::GenericError(format!(
                "Invalid IFD offset: {} (file size: {})",
                first_ifd_offset, file_size
            )));
        }

        let mut tiff = TIFF::new(self.is_big_tiff);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;

        debug!("Read {} IFDs", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads the version number and validates the BigTIFF header extension
    fn detect_format(&self, reader: &mut dyn SeekableReader) -> TiffResult<bool> {
        let handler = self.handler()?;
        let version = handler.read_u16(reader)?;

        match version {
            header::TIFF_VERSION => Ok(false),
            header::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(reader)?;
                let zeros = handler.read_u16(reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE || zeros != 0 {
                    return Err(TiffError::InvalidBigTIFFHeader);
                }
                Ok(true)
            },
            _ => Err(TiffError::UnsupportedVersion(version)),
        }
    }

    /// Reads an offset field: 4 bytes in classic TIFF, 8 in BigTIFF
    fn read_offset(&self, reader: &mut dyn SeekableReader) -> TiffResult<u64> {
        let handler = self.handler()?;
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u32(reader)? as u64)
        }
    }

    /// Reads a chain of IFDs starting from the given offset
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64, file_size: u64) -> TiffResult<Vec<IFD>> {
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < MAX_IFDS {
            if ifd_offset >= file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", ifd_offset, file_size);
                break;
            }

            let ifd = self.read_ifd(reader, ifd_offset, ifds.len())?;

            // The reader sits right after the last entry, on the next-IFD field
            let next_ifd_offset = match self.read_offset(reader) {
                Ok(offset) => offset,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    ifds.push(ifd);
                    break;
                }
            };

            ifds.push(ifd);
            if next_ifd_offset == ifd_offset {
                warn!("IFD at {} points to itself, stopping IFD chain", ifd_offset);
                break;
            }
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD from the reader
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `offset` - Offset in the file where the IFD starts
    /// * `number` - The index of this IFD in the file
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<IFD> {
        reader.seek(SeekFrom::Start(offset))?;
        let handler = self.handler()?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        debug!("IFD #{} at {}: {} entries", number, offset, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            ifd.add_entry(self.read_ifd_entry(reader)?);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry, keeping inline value bytes verbatim
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let handler = self.handler()?;

        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u32(reader)? as u64
        };

        let mut field = vec![0u8; if self.is_big_tiff { 8 } else { 4 }];
        reader.read_exact(&mut field)?;

        let probe = IFDEntry::new(tag, field_type, count, 0);
        if probe.is_value_inline(self.is_big_tiff) {
            // Decode the first value so single-valued tags read naturally
            let mut cursor = Cursor::new(field.clone());
            let first = if count > 0 {
                read_value(&mut cursor, field_type, handler).unwrap_or(0)
            } else {
                0
            };
            Ok(IFDEntry::new(tag, field_type, count, first).with_inline_data(field))
        } else {
            let mut cursor = Cursor::new(field);
            let offset = if self.is_big_tiff {
                handler.read_u64(&mut cursor)?
            } else {
                handler.read_u32(&mut cursor)? as u64
            };
            Ok(IFDEntry::new(tag, field_type, count, offset))
        }
    }

    /// Reads an integer-valued tag as a vector of u64
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `ifd` - The IFD containing the tag
    /// * `tag` - The tag number to read
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let handler = self.handler()?;

        if entry.is_value_inline(self.is_big_tiff) {
            if entry.inline_data.is_empty() {
                return Ok(vec![entry.value_offset]);
            }
            let mut cursor = Cursor::new(entry.inline_data.clone());
            return (0..entry.count)
                .map(|_| read_value(&mut cursor, entry.field_type, handler))
                .collect();
        }

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        let mut values = Vec::with_capacity(entry.count as usize);
        for _ in 0..entry.count {
            values.push(read_value(reader, entry.field_type, handler)?);
        }
        Ok(values)
    }

    /// Reads a DOUBLE-valued tag such as ModelPixelScale or ModelTiepoint
    pub fn read_tag_doubles(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        if entry.field_type != field_types::DOUBLE {
            return Err(TiffError::UnsupportedFieldType(entry.field_type));
        }
        let handler = self.handler()?;

        let mut values = Vec::with_capacity(entry.count as usize);
        if entry.is_value_inline(self.is_big_tiff) {
            let mut cursor = Cursor::new(entry.inline_data.clone());
            for _ in 0..entry.count {
                values.push(handler.read_f64(&mut cursor)?);
            }
        } else {
            reader.seek(SeekFrom::Start(entry.value_offset))?;
            for _ in 0..entry.count {
                values.push(handler.read_f64(reader)?);
            }
        }
        Ok(values)
    }
}

/// Reads one integer value of the given field type
fn read_value(reader: &mut dyn SeekableReader, field_type: u16, handler: &dyn ByteOrderHandler) -> TiffResult<u64> {
    let value = match field_type {
        field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => {
            let mut byte = [0u8; 1];
            reader.read_exact(&mut byte)?;
            byte[0] as u64
        },
        field_types::SHORT | field_types::SSHORT => handler.read_u16(reader)? as u64,
        field_types::LONG | field_types::SLONG => handler.read_u32(reader)? as u64,
        field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(reader)?,
        _ => return Err(TiffError::UnsupportedFieldType(field_type)),
    };
    Ok(value)
}

/// Determines the stream length without disturbing the read position
fn file_size(reader: &mut dyn SeekableReader) -> TiffResult<u64> {
    let current_position = reader.stream_position()?;
    let size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(current_position))?;
    Ok(size)
}
