//! Depth to disparity
//!
//! Depth 0.5 is the screen plane: nearer pixels (depth > 0.5) get a
//! positive shift and farther pixels a negative one.
//!
//! ```text
//! disparity = baseline * (depth - 0.5)
//! ```
//!
//! The raw field is then smoothed with a 5x5 Gaussian to soften depth
//! edges before the eyes are rendered.

use crate::{StereoError, StereoResult};
use vrstereo_core::{DepthMap, DisparityField, Plane};
use vrstereo_filter::{DISPARITY_BLUR_SIZE, gaussian_blur};

/// Depth value that maps to zero disparity
pub const SCREEN_DEPTH: f32 = 0.5;

/// Check a stereo baseline
///
/// # Errors
///
/// Returns [`StereoError::InvalidParameter`] unless `baseline` is finite
/// and non-negative.
pub fn validate_baseline(baseline: f32) -> StereoResult<()> {
    if !baseline.is_finite() || baseline < 0.0 {
        return Err(StereoError::InvalidParameter {
            param: "baseline",
            reason: format!("{} is not a finite value >= 0", baseline),
        });
    }
    Ok(())
}

/// Unsmoothed disparity, `baseline * (depth - 0.5)` per pixel
pub fn raw_disparity(depth: &DepthMap, baseline: f32) -> StereoResult<DisparityField> {
    validate_baseline(baseline)?;
    let plane = depth.plane().map(|d| baseline * (d - SCREEN_DEPTH));
    Ok(DisparityField::from_plane(plane)?)
}

/// Smoothed disparity field used for eye rendering
///
/// # Arguments
///
/// * `depth` - Normalized depth map
/// * `baseline` - Maximum disparity magnitude scale, in pixels
///
/// # Notes
///
/// A uniform depth of 0.5 yields an all-zero field; blurring preserves it
/// exactly.
pub fn build_disparity(depth: &DepthMap, baseline: f32) -> StereoResult<DisparityField> {
    let raw = raw_disparity(depth, baseline)?;
    if baseline == 0.0 {
        return Ok(raw);
    }
    let smoothed: Plane = gaussian_blur(raw.plane(), DISPARITY_BLUR_SIZE, 0.0)?;
    Ok(DisparityField::from_plane(smoothed)?)
}
