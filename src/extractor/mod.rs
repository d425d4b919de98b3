//! Windowed raster extraction
//!
//! Turns an image directory into numeric grids: window geometry, block
//! layout, predictor reversal and nearest-neighbour resampling.

mod region;
mod layout;
mod predictor;
mod sample_reader;
pub mod resample;

pub use region::PixelWindow;
pub use layout::{BlockLayout, SampleLayout};
pub use predictor::undo_horizontal_differencing;
pub use sample_reader::WindowReader;
