//! Sample and block layout of a TIFF image
//!
//! `SampleLayout` describes how one pixel value is encoded; `BlockLayout`
//! describes how the image is cut into strips or tiles and where each
//! block lives in the file.

use log::debug;

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{planar_config, predictor, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::region::PixelWindow;

/// Encoding of individual samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    pub bits_per_sample: u16,
    pub sample_format: u16,
    /// Samples interleaved in each pixel of a block (1 for planar files)
    pub interleaved_samples: usize,
    pub predictor: u16,
    pub compression: u64,
}

impl SampleLayout {
    /// Reads and validates the sample layout of an IFD
    ///
    /// Only the first sample of each pixel is ever decoded; for planar
    /// files that is the first plane.
    pub fn from_ifd(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Self> {
        let first_value = |reader: &mut dyn SeekableReader, tag: u16, default: u64| -> TiffResult<u64> {
            if !ifd.has_tag(tag) {
                return Ok(default);
            }
            Ok(tiff_reader.read_tag_values(reader, ifd, tag)?.first().copied().unwrap_or(default))
        };

        let bits_per_sample = first_value(reader, tags::BITS_PER_SAMPLE, 1)? as u16;
        let sample_format = first_value(reader, tags::SAMPLE_FORMAT, sample_format::UNSIGNED as u64)? as u16;
        let predictor_code = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64) as u16;
        let compression = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1);
        let samples_per_pixel = ifd.get_samples_per_pixel().max(1) as usize;
        let planar = ifd.get_tag_value(tags::PLANAR_CONFIGURATION).unwrap_or(planar_config::CHUNKY as u64) as u16;

        let supported = match sample_format {
            sample_format::UNSIGNED | sample_format::SIGNED => matches!(bits_per_sample, 8 | 16 | 32 | 64),
            sample_format::IEEEFP => matches!(bits_per_sample, 32 | 64),
            _ => false,
        };
        if !supported {
            return Err(TiffError::UnsupportedSampleLayout { bits: bits_per_sample, format: sample_format });
        }

        match predictor_code {
            predictor::NONE => {},
            predictor::HORIZONTAL_DIFFERENCING if sample_format != sample_format::IEEEFP => {},
            other => return Err(TiffError::UnsupportedPredictor(other as u64)),
        }

        let interleaved_samples = if planar == planar_config::PLANAR { 1 } else { samples_per_pixel };

        Ok(SampleLayout { bits_per_sample, sample_format, interleaved_samples, predictor: predictor_code, compression })
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample / 8) as usize
    }

    /// Bytes occupied by one pixel inside a decoded block
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_sample() * self.interleaved_samples
    }

    /// Interprets raw sample bits according to the sample format
    pub fn to_f64(&self, bits: u64) -> f64 {
        match (self.sample_format, self.bits_per_sample) {
            (sample_format::IEEEFP, 32) => f32::from_bits(bits as u32) as f64,
            (sample_format::IEEEFP, _) => f64::from_bits(bits),
            (sample_format::SIGNED, 8) => bits as u8 as i8 as f64,
            (sample_format::SIGNED, 16) => bits as u16 as i16 as f64,
            (sample_format::SIGNED, 32) => bits as u32 as i32 as f64,
            (sample_format::SIGNED, _) => bits as i64 as f64,
            _ => bits as f64,
        }
    }
}

/// Arrangement of strips or tiles covering the image
#[derive(Debug, Clone)]
pub struct BlockLayout {
    pub block_width: usize,
    pub block_height: usize,
    pub blocks_across: usize,
    pub blocks_down: usize,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl BlockLayout {
    /// Reads the strip or tile arrangement of an IFD
    pub fn from_ifd(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        let (width, height) = (width as usize, height as usize);

        let (block_width, block_height, offsets_tag, counts_tag) = if ifd.is_tiled() {
            let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).ok_or(TiffError::TagNotFound(tags::TILE_WIDTH))?;
            let tile_length = ifd.get_tag_value(tags::TILE_LENGTH).ok_or(TiffError::TagNotFound(tags::TILE_LENGTH))?;
            (tile_width as usize, tile_length as usize, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP)
                .map(|rows| (rows as usize).min(height))
                .unwrap_or(height);
            (width, rows_per_strip, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        if block_width == 0 || block_height == 0 {
            return Err(TiffError::GenericError("Zero-sized strip or tile".to_string()));
        }

        let offsets = tiff_reader.read_tag_values(reader, ifd, offsets_tag)?;
        let byte_counts = tiff_reader.read_tag_values(reader, ifd, counts_tag)?;
        if offsets.len() != byte_counts.len() {
            return Err(TiffError::GenericError(format!(
                "{} block offsets but {} byte counts", offsets.len(), byte_counts.len()
            )));
        }

        let blocks_across = width.div_ceil(block_width);
        let blocks_down = height.div_ceil(block_height);
        if offsets.len() < blocks_across * blocks_down {
            return Err(TiffError::GenericError(format!(
                "Expected {} blocks, found {}", blocks_across * blocks_down, offsets.len()
            )));
        }

        debug!("Block layout: {}x{} blocks of {}x{} ({})",
               blocks_across, blocks_down, block_width, block_height,
               if ifd.is_tiled() { "tiles" } else { "strips" });

        Ok(BlockLayout { block_width, block_height, blocks_across, blocks_down, offsets, byte_counts })
    }

    /// Block coordinates `(block_col, block_row)` intersecting a window
    pub fn blocks_for(&self, window: &PixelWindow) -> Vec<(usize, usize)> {
        if window.width == 0 || window.height == 0 {
            return Vec::new();
        }
        let first_col = window.col_off / self.block_width;
        let last_col = ((window.end_col() - 1) / self.block_width).min(self.blocks_across.saturating_sub(1));
        let first_row = window.row_off / self.block_height;
        let last_row = ((window.end_row() - 1) / self.block_height).min(self.blocks_down.saturating_sub(1));

        let mut blocks = Vec::new();
        for block_row in first_row..=last_row {
            for block_col in first_col..=last_col {
                blocks.push((block_col, block_row));
            }
        }
        blocks
    }

    /// Index of a block in the offsets table
    pub fn index(&self, block_col: usize, block_row: usize) -> usize {
        block_row * self.blocks_across + block_col
    }
}
