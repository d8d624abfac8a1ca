//! Error types for vrstereo-stereo

use thiserror::Error;

/// Errors that can occur during stereo synthesis and packing
#[derive(Debug, Error)]
pub enum StereoError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] vrstereo_core::Error),

    /// Transform error
    #[error("transform error: {0}")]
    Transform(#[from] vrstereo_transform::TransformError),

    /// Filter error
    #[error("filter error: {0}")]
    Filter(#[from] vrstereo_filter::FilterError),

    /// Region error
    #[error("region error: {0}")]
    Region(#[from] vrstereo_region::RegionError),

    /// A parameter was rejected before any processing
    #[error("invalid parameter {param}: {reason}")]
    InvalidParameter {
        param: &'static str,
        reason: String,
    },

    /// Two inputs that must agree in size do not
    #[error("{what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Left and right sequences differ in length
    #[error("left sequence has {left} frames, right has {right}")]
    CountMismatch { left: usize, right: usize },

    /// Left and right frames at the same position carry different indices
    #[error("position {position}: left frame {left} paired with right frame {right}")]
    IndexMismatch { position: usize, left: u32, right: u32 },

    /// No frames to process
    #[error("empty frame sequence")]
    EmptySequence,
}

/// Result type for stereo operations
pub type StereoResult<T> = Result<T, StereoError>;
