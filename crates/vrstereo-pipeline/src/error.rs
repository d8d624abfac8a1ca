//! Error types for vrstereo-pipeline
//!
//! Every fatal job error names the [`Stage`] it happened in. Broken
//! preconditions between stages are reported as a [`Violation`] so that a
//! dimension mismatch can be told apart from a count mismatch without
//! parsing messages.

use std::fmt;
use thiserror::Error;
use vrstereo_stereo::StereoError;

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Extract,
    Depth,
    Synthesize,
    Pack,
    Assemble,
    Preview,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Extract => "extract",
            Stage::Depth => "depth",
            Stage::Synthesize => "synthesize",
            Stage::Pack => "pack",
            Stage::Assemble => "assemble",
            Stage::Preview => "preview",
        };
        f.write_str(name)
    }
}

/// A broken precondition between stages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    /// Two images that must agree in size do not
    #[error("{what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Two sequences that must pair up differ in length
    #[error("left has {left} frames, right has {right}")]
    CountMismatch { left: usize, right: usize },

    /// A sequence that must hold at least one frame is empty
    #[error("empty frame sequence")]
    EmptySequence,

    /// Frame indices are not `0..n`
    #[error("expected frame index {expected}, found {found}")]
    NonContiguousIndex { expected: u32, found: u32 },

    /// A depth value outside `[0, 1]` or not finite
    #[error("depth {value} at ({x}, {y}) outside [0, 1]")]
    DepthOutOfRange { x: u32, y: u32, value: f32 },
}

/// Errors of the depth oracle seam
#[derive(Debug, Error)]
pub enum OracleError {
    /// The input frame could not be handed to the estimator
    #[error("unreadable depth input: {0}")]
    Input(String),

    /// The estimator output could not be read or is malformed
    #[error("unreadable depth output: {0}")]
    Output(String),

    /// The estimator itself failed
    #[error("depth estimator failed: {0}")]
    Failed(String),
}

/// Errors that can occur while running a conversion job
#[derive(Debug, Error)]
pub enum JobError {
    /// A configuration value was rejected before processing
    #[error("invalid {param}: {reason}")]
    Validation { param: String, reason: String },

    /// A stage received input breaking its precondition
    #[error("{stage} stage: {violation}")]
    Contract { stage: Stage, violation: Violation },

    /// An external program or estimator failed
    #[error("{stage} stage: {message}")]
    Collaborator { stage: Stage, message: String },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding or decoding error
    #[error("{stage} stage: image I/O: {source}")]
    Image {
        stage: Stage,
        #[source]
        source: vrstereo_io::IoError,
    },

    /// Configuration file could not be parsed
    #[error("config file: {0}")]
    ConfigFile(#[from] serde_json::Error),

    /// The job was cancelled before finishing
    #[error("job cancelled")]
    Cancelled,
}

/// Result type for pipeline operations
pub type JobResult<T> = Result<T, JobError>;

impl JobError {
    /// Shorthand for a validation error
    pub fn validation(param: impl Into<String>, reason: impl Into<String>) -> Self {
        JobError::Validation {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a contract violation
    pub fn contract(stage: Stage, violation: Violation) -> Self {
        JobError::Contract { stage, violation }
    }

    /// Shorthand for a collaborator failure
    pub fn collaborator(stage: Stage, message: impl Into<String>) -> Self {
        JobError::Collaborator {
            stage,
            message: message.into(),
        }
    }

    /// The stage this error is attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            JobError::Validation { .. } | JobError::ConfigFile(_) => Some(Stage::Config),
            JobError::Contract { stage, .. }
            | JobError::Collaborator { stage, .. }
            | JobError::Image { stage, .. } => Some(*stage),
            JobError::Io(_) | JobError::Cancelled => None,
        }
    }

    /// The violation, for contract errors
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            JobError::Contract { violation, .. } => Some(violation),
            _ => None,
        }
    }

    /// Attribute an image I/O error to a stage
    ///
    /// Index gaps found while reading a frame directory are contract
    /// violations; everything else stays an image error.
    pub fn from_io(stage: Stage, err: vrstereo_io::IoError) -> Self {
        match err {
            vrstereo_io::IoError::Core(e) => match core_violation(&e) {
                Some(violation) => JobError::contract(stage, violation),
                None => JobError::Image {
                    stage,
                    source: vrstereo_io::IoError::Core(e),
                },
            },
            vrstereo_io::IoError::Io(e) => JobError::Io(e),
            other => JobError::Image {
                stage,
                source: other,
            },
        }
    }

    /// Attribute a stereo error to a stage
    pub fn from_stereo(stage: Stage, err: StereoError) -> Self {
        match err {
            StereoError::InvalidParameter { param, reason } => JobError::validation(param, reason),
            StereoError::DimensionMismatch {
                what,
                expected,
                actual,
            } => JobError::contract(
                stage,
                Violation::DimensionMismatch {
                    what: what.to_string(),
                    expected,
                    actual,
                },
            ),
            StereoError::CountMismatch { left, right } => {
                JobError::contract(stage, Violation::CountMismatch { left, right })
            }
            StereoError::EmptySequence => JobError::contract(stage, Violation::EmptySequence),
            StereoError::IndexMismatch { left, right, .. } => JobError::contract(
                stage,
                Violation::NonContiguousIndex {
                    expected: left,
                    found: right,
                },
            ),
            StereoError::Core(e) => match core_violation(&e) {
                Some(violation) => JobError::contract(stage, violation),
                None => JobError::collaborator(stage, e.to_string()),
            },
            other => JobError::collaborator(stage, other.to_string()),
        }
    }

    /// Attribute a transform error to a stage
    pub fn from_transform(stage: Stage, err: vrstereo_transform::TransformError) -> Self {
        match err {
            vrstereo_transform::TransformError::Core(e) => match core_violation(&e) {
                Some(violation) => JobError::contract(stage, violation),
                None => JobError::collaborator(stage, e.to_string()),
            },
            other => JobError::collaborator(stage, other.to_string()),
        }
    }

    /// Attribute a depth oracle error
    pub fn from_oracle(err: OracleError) -> Self {
        JobError::collaborator(Stage::Depth, err.to_string())
    }
}

fn core_violation(err: &vrstereo_core::Error) -> Option<Violation> {
    use vrstereo_core::Error;
    match *err {
        Error::DimensionMismatch { expected, actual } => Some(Violation::DimensionMismatch {
            what: "frame".to_string(),
            expected,
            actual,
        }),
        Error::NonContiguousIndex { expected, found } => {
            Some(Violation::NonContiguousIndex { expected, found })
        }
        Error::ValueOutOfRange { x, y, value, .. } => {
            Some(Violation::DepthOutOfRange { x, y, value })
        }
        _ => None,
    }
}
