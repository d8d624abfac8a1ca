//! vrstereo - 2D video to stereo conversion
//!
//! Synthesizes a left and a right eye view from each video frame and its
//! depth estimate, and packs the eye pairs into side-by-side, top-bottom
//! and VR180 (2:1 top-bottom) videos.
//!
//! # Overview
//!
//! - Curved-screen pre-warp, depth-to-disparity, eye rendering, hole
//!   filling ([`stereo`])
//! - VR180 canvas packing ([`stereo::Vr180Packer`])
//! - PNG / GIF frame I/O ([`io`])
//! - Jobs: depth oracle seam, ffmpeg adapter, parallel ordered frame pool
//!   ([`pipeline`])
//!
//! # Example
//!
//! ```
//! use vrstereo::{DepthMap, Frame, color};
//! use vrstereo::stereo::{StereoParams, synthesize};
//!
//! let frame = Frame::new_filled(0, 64, 36, color::compose_rgb(90, 120, 200)).unwrap();
//! let depth = DepthMap::constant(64, 36, 0.5).unwrap();
//! let pair = synthesize(&frame, &depth, &StereoParams::default()).unwrap();
//! assert_eq!(pair.left().dimensions(), (64, 36));
//! assert_eq!(pair.left().count_holes(), 0);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use vrstereo_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use vrstereo_filter as filter;
pub use vrstereo_io as io;
pub use vrstereo_pipeline as pipeline;
pub use vrstereo_region as region;
pub use vrstereo_stereo as stereo;
pub use vrstereo_transform as transform;
