//! Windowed sample extraction
//!
//! Decodes the first band of an image into a `Grid<f64>`, touching only
//! the strips or tiles that intersect the requested window.

use log::{debug, trace, warn};
use std::io::{Read, Seek, SeekFrom};

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::seekable::SeekableReader;
use crate::raster::grid::Grid;
use crate::tiff::constants::predictor;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::layout::{BlockLayout, SampleLayout};
use super::predictor::undo_horizontal_differencing;
use super::region::PixelWindow;

/// Reads pixel windows from one image directory
pub struct WindowReader<'a> {
    /// TIFF reader that parsed the file structure
    tiff_reader: &'a TiffReader,
    /// IFD of the image to read
    ifd: &'a IFD,
}

impl<'a> WindowReader<'a> {
    /// Create a new window reader
    pub fn new(tiff_reader: &'a TiffReader, ifd: &'a IFD) -> Self {
        WindowReader { tiff_reader, ifd }
    }

    /// Reads a window of first-band samples
    ///
    /// `keep_going` is consulted before every block; returning `false`
    /// stops the read with `TiffError::Interrupted`. Sparse blocks (zero
    /// byte count) read as 0.
    ///
    /// # Arguments
    /// * `reader` - The seekable stream of the file
    /// * `window` - Pixel window, must lie within the image
    /// * `keep_going` - Interruption hook
    ///
    /// # Returns
    /// A grid of `window.height` rows by `window.width` columns
    pub fn read(
        &self,
        reader: &mut dyn SeekableReader,
        window: PixelWindow,
        keep_going: &mut dyn FnMut() -> bool,
    ) -> TiffResult<Grid<f64>> {
        let (width, height) = self.ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        if !window.fits_within(width as usize, height as usize) {
            return Err(TiffError::GenericError(format!(
                "Window {:?} exceeds image {}x{}", window, width, height
            )));
        }

        let samples = SampleLayout::from_ifd(self.tiff_reader, reader, self.ifd)?;
        let blocks = BlockLayout::from_ifd(self.tiff_reader, reader, self.ifd)?;
        let codec = CompressionFactory::create_handler(samples.compression)?;
        let handler = self.tiff_reader.handler()?;

        let block_list = blocks.blocks_for(&window);
        debug!("Reading window {}x{} at ({}, {}) from {} block(s) using {}",
               window.width, window.height, window.col_off, window.row_off,
               block_list.len(), codec.name());

        let mut grid = Grid::filled(window.height, window.width, 0.0f64);
        let bytes_per_sample = samples.bytes_per_sample();
        let bytes_per_pixel = samples.bytes_per_pixel();
        let row_bytes = blocks.block_width * bytes_per_pixel;

        for (block_col, block_row) in block_list {
            if !keep_going() {
                return Err(TiffError::Interrupted);
            }

            let index = blocks.index(block_col, block_row);
            let data = match read_block(reader, &blocks, index, codec.as_ref())? {
                Some(mut data) => {
                    if samples.predictor == predictor::HORIZONTAL_DIFFERENCING {
                        undo_horizontal_differencing(
                            &mut data, blocks.block_width, samples.interleaved_samples, bytes_per_sample, handler,
                        );
                    }
                    data
                },
                None => continue,
            };

            let block_x0 = block_col * blocks.block_width;
            let block_y0 = block_row * blocks.block_height;
            let col_start = window.col_off.max(block_x0);
            let col_end = window.end_col().min(block_x0 + blocks.block_width);
            let row_start = window.row_off.max(block_y0);
            let row_end = window.end_row().min(block_y0 + blocks.block_height);

            for row in row_start..row_end {
                let row_base = (row - block_y0) * row_bytes;
                for col in col_start..col_end {
                    let at = row_base + (col - block_x0) * bytes_per_pixel;
                    if at + bytes_per_sample > data.len() {
                        break;
                    }
                    let bits = handler.sample_bits(&data[at..at + bytes_per_sample], bytes_per_sample);
                    grid[(row - window.row_off, col - window.col_off)] = samples.to_f64(bits);
                }
            }
        }

        Ok(grid)
    }
}

/// Reads and decompresses one block, `None` for sparse blocks
fn read_block(
    reader: &mut dyn SeekableReader,
    blocks: &BlockLayout,
    index: usize,
    codec: &dyn CompressionHandler,
) -> TiffResult<Option<Vec<u8>>> {
    let offset = blocks.offsets[index];
    let byte_count = blocks.byte_counts[index];
    if byte_count == 0 {
        warn!("Block {} is sparse, filling with zeros", index);
        return Ok(None);
    }

    trace!("Block {}: {} bytes at offset {}", index, byte_count, offset);
    reader.seek(SeekFrom::Start(offset))?;
    let mut compressed = vec![0u8; byte_count as usize];
    reader.read_exact(&mut compressed)?;

    Ok(Some(codec.decompress(&compressed)?))
}
