//! Error types for the thermal pipeline
//!
//! Every stage of the pipeline reports failures through [`PipelineError`].
//! Decoding errors from the raster layer arrive as [`TiffError`] and are
//! wrapped, so callers only ever have to match on one enum.

use std::fmt;
use std::io;

use crate::tiff::errors::TiffError;

/// Pipeline error kinds
#[derive(Debug)]
pub enum PipelineError {
    /// The catalog returned zero candidates for the area/date filter
    NoScenesFound(String),
    /// Every candidate failed the local clarity bar or lacked a thermal asset
    NoClearSceneFound {
        /// Location the search was run for, as "lat, lon"
        location: String,
        /// Number of catalog records examined
        checked: usize,
        /// Minimum clear percentage that was required
        threshold: f64,
    },
    /// Network, file or parse failure on an individual read
    ExternalRead(String),
    /// An optional band (quality mask, land cover) is absent or unreadable
    MissingOptionalAsset(String),
    /// No usable pixels remain after masking
    NoValidThermalData,
    /// An aligned band disagrees with the recorded crop and cannot be re-cropped
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// Caller supplied coordinates or dates outside the accepted domain
    InvalidInput(String),
    /// Configuration document could not be interpreted
    Config(String),
    /// Catalog document could not be parsed
    Catalog(String),
    /// The invocation was cancelled by its owner
    Cancelled,
    /// The overall deadline for the invocation passed
    DeadlineExceeded,
    /// Raster decoding failure
    Tiff(TiffError),
    /// Local I/O failure (output files, logs)
    Io(io::Error),
    /// Image encoding failure
    Image(String),
}

impl PipelineError {
    /// Whether this error stops the invocation instead of being retried
    ///
    /// Cancellation and deadline errors must never be retried: the retry
    /// loop checks this before scheduling another attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineError::Cancelled | PipelineError::DeadlineExceeded)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::NoScenesFound(location) => write!(f, "No scenes found for {}", location),
            PipelineError::NoClearSceneFound { location, checked, threshold } => write!(
                f,
                "No locally clear scenes found for {} (checked {} candidates, need {}% clear)",
                location, checked, threshold
            ),
            PipelineError::ExternalRead(msg) => write!(f, "External read failed: {}", msg),
            PipelineError::MissingOptionalAsset(msg) => write!(f, "Optional asset unavailable: {}", msg),
            PipelineError::NoValidThermalData => write!(f, "No valid clear thermal data"),
            PipelineError::ShapeMismatch { expected, actual } => write!(
                f,
                "Band shape {}x{} cannot be aligned to crop {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            PipelineError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Catalog(msg) => write!(f, "Catalog error: {}", msg),
            PipelineError::Cancelled => write!(f, "Pipeline cancelled"),
            PipelineError::DeadlineExceeded => write!(f, "Pipeline deadline exceeded"),
            PipelineError::Tiff(e) => write!(f, "Raster decoding error: {}", e),
            PipelineError::Io(e) => write!(f, "I/O error: {}", e),
            PipelineError::Image(msg) => write!(f, "Image error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<io::Error> for PipelineError {
    fn from(error: io::Error) -> Self {
        PipelineError::Io(error)
    }
}

impl From<TiffError> for PipelineError {
    fn from(error: TiffError) -> Self {
        PipelineError::Tiff(error)
    }
}

impl From<image::ImageError> for PipelineError {
    fn from(error: image::ImageError) -> Self {
        PipelineError::Image(error.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::Catalog(error.to_string())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
