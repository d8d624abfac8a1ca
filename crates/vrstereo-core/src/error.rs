//! Error types for vrstereo-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Each variant captures enough context for diagnostics without exposing
//! internal buffer layout.

use thiserror::Error;

/// vrstereo core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Buffer dimension mismatch
    #[error("dimension mismatch: expected {}x{}, got {}x{}", .expected.0, .expected.1, .actual.0, .actual.1)]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A sample value outside its permitted range
    #[error("value {value} at ({x}, {y}) outside [{min}, {max}]")]
    ValueOutOfRange {
        x: u32,
        y: u32,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Frame index does not continue the sequence
    #[error("non-contiguous frame index: expected {expected}, found {found}")]
    NonContiguousIndex { expected: u32, found: u32 },

    /// Raw buffer length does not match the declared dimensions
    #[error("buffer length {len} does not match {width}x{height} (expected {expected})")]
    BufferLength {
        len: usize,
        width: u32,
        height: u32,
        expected: usize,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
