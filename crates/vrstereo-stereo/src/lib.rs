//! vrstereo-stereo - Stereo view synthesis for vrstereo
//!
//! Turns a frame and its depth map into a left/right eye pair, and packs
//! eye pairs onto VR180 top/bottom canvases.
//!
//! - [`disparity`]: depth to smoothed horizontal disparity
//! - [`eye`]: one eye view by disparity remapping
//! - [`synth`]: the full per-frame synthesis
//! - [`pack`]: fit-and-center packing onto `2H x H` canvases
//!
//! # Example
//!
//! ```ignore
//! use vrstereo_stereo::{StereoParams, synthesize};
//!
//! let pair = synthesize(&frame, &depth, &StereoParams::default())?;
//! ```

pub mod disparity;
mod error;
pub mod eye;
pub mod pack;
pub mod synth;

pub use disparity::{SCREEN_DEPTH, build_disparity, raw_disparity, validate_baseline};
pub use error::{StereoError, StereoResult};
pub use eye::{Eye, EyeView, render_eye};
pub use pack::{CanvasLayout, DEFAULT_CANVAS_HEIGHT, Vr180Packer, check_pairing};
pub use synth::{
    DEFAULT_BASELINE, DEFAULT_CURVATURE, DEFAULT_INPAINT_RADIUS, HoleStats, StereoPair,
    StereoParams, synthesize,
};
