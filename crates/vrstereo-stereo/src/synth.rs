//! Per-frame stereo synthesis
//!
//! One source frame and its depth map become a left/right eye pair:
//!
//! 1. Curved-screen pre-warp of the frame
//! 2. Depth to smoothed disparity
//! 3. Left and right eye rendering from the warped frame
//! 4. Hole filling of each eye
//!
//! The function is pure; frames may be synthesized on any number of
//! threads at once.

use crate::disparity::{build_disparity, validate_baseline};
use crate::eye::{Eye, EyeView, render_eye};
use crate::{StereoError, StereoResult};
use vrstereo_core::{DepthMap, Frame};
use vrstereo_region::inpaint_telea;
use vrstereo_transform::{curvature_warp, validate_curvature};

/// Default stereo baseline in pixels
pub const DEFAULT_BASELINE: f32 = 6.0;

/// Default screen curvature
pub const DEFAULT_CURVATURE: f32 = 0.35;

/// Default inpainting radius in pixels
pub const DEFAULT_INPAINT_RADIUS: u32 = 3;

/// Parameters of a synthesis run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoParams {
    /// Disparity scale in pixels; 0 produces identical eyes
    pub baseline: f32,
    /// Screen curvature in `[0, 0.6]`
    pub curvature: f32,
    /// Hole-filling radius; 0 leaves holes in place
    pub inpaint_radius: u32,
}

impl Default for StereoParams {
    fn default() -> Self {
        StereoParams {
            baseline: DEFAULT_BASELINE,
            curvature: DEFAULT_CURVATURE,
            inpaint_radius: DEFAULT_INPAINT_RADIUS,
        }
    }
}

impl StereoParams {
    /// Check every parameter
    ///
    /// # Errors
    ///
    /// Returns [`StereoError::InvalidParameter`] naming the first bad
    /// parameter.
    pub fn validate(&self) -> StereoResult<()> {
        validate_baseline(self.baseline)?;
        validate_curvature(self.curvature).map_err(|e| StereoError::InvalidParameter {
            param: "curvature",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Hole counts for one eye
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoleStats {
    /// Holes left by rendering
    pub found: usize,
    /// Holes still present after filling
    pub unfilled: usize,
}

/// Left and right eye images for one frame index
#[derive(Debug, Clone)]
pub struct StereoPair {
    left: Frame,
    right: Frame,
    left_holes: HoleStats,
    right_holes: HoleStats,
}

impl StereoPair {
    /// Frame index shared by both eyes
    pub fn index(&self) -> u32 {
        self.left.index()
    }

    /// Left eye image
    pub fn left(&self) -> &Frame {
        &self.left
    }

    /// Right eye image
    pub fn right(&self) -> &Frame {
        &self.right
    }

    /// Hole statistics of one eye
    pub fn holes(&self, eye: Eye) -> HoleStats {
        match eye {
            Eye::Left => self.left_holes,
            Eye::Right => self.right_holes,
        }
    }

    /// Take the eye images
    pub fn into_frames(self) -> (Frame, Frame) {
        (self.left, self.right)
    }
}

fn fill(view: EyeView, radius: u32) -> StereoResult<(Frame, HoleStats)> {
    let found = view.holes.count();
    let frame = inpaint_telea(&view.frame, &view.holes, radius)?;
    let unfilled = if found == 0 { 0 } else { frame.count_holes() };
    Ok((frame, HoleStats { found, unfilled }))
}

/// Synthesize the stereo pair of one frame
///
/// # Arguments
///
/// * `frame` - Source frame
/// * `depth` - Normalized depth of `frame`, same size
/// * `params` - Synthesis parameters
///
/// # Errors
///
/// - [`StereoError::InvalidParameter`] for a bad baseline or curvature
/// - [`StereoError::DimensionMismatch`] if `depth` and `frame` differ in
///   size
pub fn synthesize(frame: &Frame, depth: &DepthMap, params: &StereoParams) -> StereoResult<StereoPair> {
    params.validate()?;
    if depth.dimensions() != frame.dimensions() {
        return Err(StereoError::DimensionMismatch {
            what: "depth map",
            expected: frame.dimensions(),
            actual: depth.dimensions(),
        });
    }

    let warped = curvature_warp(frame, params.curvature)?;
    let disparity = build_disparity(depth, params.baseline)?;

    let (left, left_holes) = fill(render_eye(&warped, &disparity, Eye::Left)?, params.inpaint_radius)?;
    let (right, right_holes) = fill(
        render_eye(&warped, &disparity, Eye::Right)?,
        params.inpaint_radius,
    )?;

    Ok(StereoPair {
        left,
        right,
        left_holes,
        right_holes,
    })
}
