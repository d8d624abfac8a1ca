//! vrstereo-pipeline - Video-to-stereo conversion jobs
//!
//! Ties the stereo library to the outside world:
//!
//! - [`config`]: the job configuration and its validation
//! - [`oracle`]: the depth estimator seam and bundled estimators
//! - [`video`]: frame extraction / assembly seams and the `ffmpeg` adapter
//! - [`schedule`]: the ordered, cancellable per-frame thread pool
//! - [`workspace`]: per-job scratch directories
//! - [`preview`]: the animated GIF preview
//! - [`job`]: the job runner
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vrstereo_pipeline::{DirectoryDepthOracle, FfmpegVideo, JobConfig, JobRunner};
//!
//! let video = Arc::new(FfmpegVideo::default());
//! let runner = JobRunner::new(
//!     JobConfig::default(),
//!     Arc::new(DirectoryDepthOracle::new("depth")),
//!     video.clone(),
//!     video,
//! );
//! let outputs = runner.run("clip.mp4".as_ref())?;
//! ```

pub mod config;
mod error;
pub mod job;
pub mod oracle;
pub mod preview;
pub mod schedule;
pub mod video;
pub mod workspace;

pub use config::{JobConfig, MAX_PREVIEW_FRAMES};
pub use error::{JobError, JobResult, OracleError, Stage, Violation};
pub use job::{
    FrameOutput, FrameProcessor, HoleTotals, JobOutputs, JobRunner, Processed, SequenceDirs,
    output_path,
};
pub use oracle::{
    CommandDepthOracle, DepthOracle, DirectoryDepthOracle, OracleGate, Reentrancy, normalize_raw,
};
pub use preview::{PREVIEW_DELAY_CS, PREVIEW_MAX_WIDTH, write_preview};
pub use schedule::{CancelToken, FramePool, ReorderBuffer};
pub use video::{
    DEFAULT_FPS, Extracted, FfmpegVideo, FrameAssembler, FrameExtractor, Layout, compose_pair,
    composed_frame, paired_len, parse_frame_rate,
};
pub use workspace::{JobWorkspace, new_job_id};
