//! Curved-screen pre-warp
//!
//! Bends a frame horizontally as if it were projected on a cylindrical
//! screen. Over normalized `x` in `[-1, 1]` (one sample per column):
//!
//! ```text
//! bend(x) = x + c * (x^3 - x)
//! ```
//!
//! rescaled so that `max |bend| = 1`, then mapped back to the pixel
//! coordinate `(bend + 1) / 2 * (w - 1)`. Rows are unchanged. Resampling is
//! bicubic with a mirrored border, so the result has no holes.

use crate::remap::{OutsidePolicy, remap_columns};
use crate::sample::EdgeMode;
use crate::{TransformError, TransformResult};
use vrstereo_core::Frame;

/// Largest accepted curvature
pub const MAX_CURVATURE: f32 = 0.6;

/// Curvatures at or below this are treated as a flat screen
pub const FLAT_EPSILON: f32 = 1e-6;

/// Check a curvature value
///
/// # Errors
///
/// Returns [`TransformError::InvalidParameters`] unless `c` is finite and in
/// `[0, MAX_CURVATURE]`.
pub fn validate_curvature(c: f32) -> TransformResult<()> {
    if !c.is_finite() || !(0.0..=MAX_CURVATURE).contains(&c) {
        return Err(TransformError::InvalidParameters(format!(
            "curvature {} outside [0, {}]",
            c, MAX_CURVATURE
        )));
    }
    Ok(())
}

/// True if `bend` is strictly increasing on `[-1, 1]` for this `c`
///
/// `bend'(x) = 1 + c(3x^2 - 1)` is smallest at `x = 0` (when `c > 0`) or at
/// `x = ±1` (when `c < 0`), giving the open interval `-1/2 < c < 1`.
pub fn curvature_is_monotonic(c: f32) -> bool {
    c.is_finite() && c > -0.5 && c < 1.0
}

/// Source column for every destination column
///
/// Returns the identity mapping `0, 1, ..., w-1` when `c <= FLAT_EPSILON`.
pub fn curvature_columns(width: u32, c: f32) -> Vec<f32> {
    let n = width as usize;
    let last = width.saturating_sub(1) as f32;
    if c <= FLAT_EPSILON || n < 2 {
        return (0..n).map(|x| x as f32).collect();
    }

    let bend: Vec<f32> = (0..n)
        .map(|i| {
            let x = -1.0 + 2.0 * i as f32 / last;
            x + c * (x * x * x - x)
        })
        .collect();
    let peak = bend.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    bend.iter()
        .map(|&b| {
            let b = if peak > 0.0 { b / peak } else { b };
            (b + 1.0) * 0.5 * last
        })
        .collect()
}

/// Apply the curved-screen warp to a frame
///
/// # Arguments
///
/// * `frame` - Input frame
/// * `c` - Curvature in `[0, 0.6]`; `0` is a flat screen
///
/// # Errors
///
/// Returns [`TransformError::InvalidParameters`] for an out-of-range `c`.
///
/// # Notes
///
/// For `c <= 1e-6` the result is a pixel-exact copy of the input.
pub fn curvature_warp(frame: &Frame, c: f32) -> TransformResult<Frame> {
    validate_curvature(c)?;
    if c <= FLAT_EPSILON {
        return Ok(frame.deep_clone());
    }
    let columns = curvature_columns(frame.width(), c);
    remap_columns(frame, &columns, OutsidePolicy::Extend(EdgeMode::Reflect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrstereo_core::color;

    #[test]
    fn test_validate() {
        assert!(validate_curvature(0.0).is_ok());
        assert!(validate_curvature(0.6).is_ok());
        assert!(validate_curvature(0.61).is_err());
        assert!(validate_curvature(-0.1).is_err());
        assert!(validate_curvature(f32::NAN).is_err());
    }

    #[test]
    fn test_monotonic_range() {
        for c in [0.0, 0.35, 0.6, 0.99] {
            assert!(curvature_is_monotonic(c));
        }
        assert!(!curvature_is_monotonic(1.0));
        assert!(!curvature_is_monotonic(-0.5));
    }

    #[test]
    fn test_columns_endpoints_and_order() {
        let cols = curvature_columns(101, 0.35);
        assert!(cols[0].abs() < 1e-4);
        assert!((cols[100] - 100.0).abs() < 1e-3);
        assert!((cols[50] - 50.0).abs() < 1e-3);
        assert!(cols.windows(2).all(|p| p[1] > p[0]));
        // Center is magnified: columns near the middle move slower
        assert!(cols[51] - cols[50] < 1.0);
    }

    #[test]
    fn test_flat_is_identity() {
        let mut m = Frame::new_filled(2, 7, 3, color::compose_rgb(0, 0, 0))
            .unwrap()
            .to_mut();
        m.set_rgb(3, 1, 200, 100, 50).unwrap();
        let f: Frame = m.into();
        let out = curvature_warp(&f, 0.0).unwrap();
        assert_eq!(out, f);
        let out = curvature_warp(&f, 1e-7).unwrap();
        assert_eq!(out.data(), f.data());
    }

    #[test]
    fn test_warp_has_no_holes() {
        let data = (0..64)
            .map(|i| color::compose_rgb((i * 4) as u8, 0, 0))
            .collect();
        let f = Frame::from_pixels(0, 16, 4, data).unwrap();
        let out = curvature_warp(&f, 0.6).unwrap();
        assert_eq!(out.dimensions(), (16, 4));
        assert_eq!(out.count_holes(), 0);
    }
}
