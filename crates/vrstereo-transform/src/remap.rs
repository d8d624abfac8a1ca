//! Horizontal remapping
//!
//! Every destination pixel (x, y) takes the bicubic sample of the source at
//! `(map(x, y), y)`. Rows are independent and the vertical coordinate is
//! never changed, which is all that curvature and eye-view synthesis need.

use crate::sample::{EdgeMode, sample_cubic_row};
use crate::{TransformError, TransformResult};
use vrstereo_core::{Frame, FrameMut, Plane, color};

/// What happens when a source coordinate falls outside `[0, width - 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutsidePolicy {
    /// Sample anyway, mapping taps back with the edge mode
    Extend(EdgeMode),
    /// Produce a hole; taps of in-range samples replicate the edge
    Hole,
}

/// Remap with one source column per destination column, shared by all rows
///
/// # Errors
///
/// Returns [`TransformError::InvalidParameters`] if `columns.len()` differs
/// from the frame width.
pub fn remap_columns(src: &Frame, columns: &[f32], policy: OutsidePolicy) -> TransformResult<Frame> {
    let (w, h) = src.dimensions();
    if columns.len() != w as usize {
        return Err(TransformError::InvalidParameters(format!(
            "column map has {} entries for width {}",
            columns.len(),
            w
        )));
    }
    let mut out = FrameMut::new_filled(src.index(), w, h, color::HOLE_PIXEL)?;
    for y in 0..h {
        let row = src.row(y);
        for (px, &sx) in out.row_mut(y).iter_mut().zip(columns) {
            *px = sample_at(row, sx, policy);
        }
    }
    Ok(out.into())
}

/// Remap with a per-pixel horizontal offset: source x = `x + sign * offset(x, y)`
///
/// # Errors
///
/// Returns [`vrstereo_core::Error::DimensionMismatch`] (wrapped) if the
/// offset plane and frame differ in size.
pub fn remap_offsets(
    src: &Frame,
    offsets: &Plane,
    sign: f32,
    policy: OutsidePolicy,
) -> TransformResult<Frame> {
    if offsets.dimensions() != src.dimensions() {
        return Err(vrstereo_core::Error::DimensionMismatch {
            expected: src.dimensions(),
            actual: offsets.dimensions(),
        }
        .into());
    }
    let (w, h) = src.dimensions();
    let mut out = FrameMut::new_filled(src.index(), w, h, color::HOLE_PIXEL)?;
    for y in 0..h {
        let row = src.row(y);
        let shifts = offsets.row(y);
        for (x, (px, &d)) in out.row_mut(y).iter_mut().zip(shifts).enumerate() {
            *px = sample_at(row, x as f32 + sign * d, policy);
        }
    }
    Ok(out.into())
}

#[inline]
fn sample_at(row: &[u32], sx: f32, policy: OutsidePolicy) -> u32 {
    let last = (row.len() - 1) as f32;
    match policy {
        OutsidePolicy::Extend(mode) => sample_cubic_row(row, sx, mode),
        OutsidePolicy::Hole => {
            if !(0.0..=last).contains(&sx) {
                color::HOLE_PIXEL
            } else {
                sample_cubic_row(row, sx, EdgeMode::Replicate)
            }
        }
    }
}
