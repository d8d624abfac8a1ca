//! Eye view rendering
//!
//! Each eye is the warped frame resampled horizontally by the disparity
//! field: the left eye looks at `x - d(x, y)`, the right eye at
//! `x + d(x, y)`. Source positions outside the frame, and positions whose
//! nearest tap is already a hole, become holes in the output.

use crate::{StereoError, StereoResult};
use vrstereo_core::{DisparityField, Frame, HoleMask};
use vrstereo_transform::{OutsidePolicy, remap_offsets};

/// Which eye to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Multiplier applied to the disparity to get this eye's shift
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

/// A rendered eye image and the holes it contains
#[derive(Debug, Clone)]
pub struct EyeView {
    pub frame: Frame,
    pub holes: HoleMask,
}

/// Render one eye from a warped frame and a disparity field
///
/// # Errors
///
/// Returns [`StereoError::DimensionMismatch`] if the field and frame sizes
/// differ.
pub fn render_eye(warped: &Frame, disparity: &DisparityField, eye: Eye) -> StereoResult<EyeView> {
    if disparity.dimensions() != warped.dimensions() {
        return Err(StereoError::DimensionMismatch {
            what: "disparity field",
            expected: warped.dimensions(),
            actual: disparity.dimensions(),
        });
    }
    let frame = remap_offsets(warped, disparity.plane(), eye.sign(), OutsidePolicy::Hole)?;
    let holes = HoleMask::from_validity(&frame);
    Ok(EyeView { frame, holes })
}
