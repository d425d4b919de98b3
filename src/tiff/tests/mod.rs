//! Tests for TIFF structure parsing and windowed decoding

mod reader_tests;
mod window_tests;
