//! Image File Directory (IFD) structures and methods
//!
//! An IFD stores the metadata of one image in a TIFF file as a list of tag
//! entries. Small values live inline in the entry, larger ones at an
//! offset elsewhere in the file.

use std::collections::HashMap;
use std::fmt;
use log::{debug, trace};

use crate::tiff::constants::{field_types, tags};

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Cached tag values for quick lookup
    tag_map: HashMap<u16, IFDEntry>,
}

/// Represents an entry in an Image File Directory (IFD)
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value or offset to values
    pub value_offset: u64,
    /// Raw bytes of the value field when the values are stored inline
    pub inline_data: Vec<u8>,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64) -> Self {
        trace!("IFD entry: tag={}, type={}, count={}, offset/value={}",
               tag, field_type, count, value_offset);

        Self {
            tag,
            field_type,
            count,
            value_offset,
            inline_data: Vec::new(),
        }
    }

    /// Attaches the raw inline value bytes read from the directory
    pub fn with_inline_data(mut self, bytes: Vec<u8>) -> Self {
        self.inline_data = bytes;
        self
    }

    /// Total byte size of this entry's values
    pub fn byte_size(&self) -> u64 {
        field_types::size_of(self.field_type) * self.count
    }

    /// Determines if the value is stored inline in value_offset
    ///
    /// Classic TIFF has 4 bytes of inline storage per entry, BigTIFF has 8.
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        self.byte_size() <= inline_size
    }
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u64) -> Self {
        debug!("Creating new IFD #{} at offset {}", number, offset);

        Self {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    pub fn add_entry(&mut self, entry: IFDEntry) {
        self.tag_map.insert(entry.tag, entry.clone());
        self.entries.push(entry);
    }

    /// Gets a tag value (value_offset) directly
    ///
    /// Only meaningful for single-valued tags stored inline.
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.tag_map.get(&tag).map(|entry| entry.value_offset)
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag)
    }

    /// Gets the dimensions (width, height) of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Returns number of samples per pixel (default 1 if not specified)
    pub fn get_samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Whether image data is organised in tiles rather than strips
    pub fn is_tiled(&self) -> bool {
        self.has_tag(tags::TILE_OFFSETS)
    }

    /// Whether this IFD is a reduced-resolution overview of another image
    pub fn is_overview(&self) -> bool {
        self.get_tag_value(tags::NEW_SUBFILE_TYPE)
            .map(|subfile_type| subfile_type & 1 == 1)
            .unwrap_or(false)
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IFD #{} (offset: {}, {} entries", self.number, self.offset, self.entries.len())?;
        if let Some((width, height)) = self.get_dimensions() {
            write!(f, ", {}x{}", width, height)?;
        }
        write!(f, ")")
    }
}
