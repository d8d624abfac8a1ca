//! Frame composition
//!
//! Side-by-side and top-bottom concatenation of equal-sized frames, and
//! blank canvases to blit onto.

use crate::TransformResult;
use vrstereo_core::{Error, Frame, FrameMut};

/// Place `right` to the right of `left`
///
/// The result carries the index of `left`.
///
/// # Errors
///
/// Returns a wrapped [`Error::DimensionMismatch`] if the heights differ.
pub fn hconcat(left: &Frame, right: &Frame) -> TransformResult<Frame> {
    if left.height() != right.height() {
        return Err(Error::DimensionMismatch {
            expected: left.dimensions(),
            actual: right.dimensions(),
        }
        .into());
    }
    let (lw, h) = left.dimensions();
    let mut out = FrameMut::new_filled(left.index(), lw + right.width(), h, 0)?;
    out.blit(left, 0, 0);
    out.blit(right, lw, 0);
    Ok(out.into())
}

/// Place `bottom` below `top`
///
/// The result carries the index of `top`.
///
/// # Errors
///
/// Returns a wrapped [`Error::DimensionMismatch`] if the widths differ.
pub fn vconcat(top: &Frame, bottom: &Frame) -> TransformResult<Frame> {
    if top.width() != bottom.width() {
        return Err(Error::DimensionMismatch {
            expected: top.dimensions(),
            actual: bottom.dimensions(),
        }
        .into());
    }
    let (w, th) = top.dimensions();
    let mut out = FrameMut::new_filled(top.index(), w, th + bottom.height(), 0)?;
    out.blit(top, 0, 0);
    out.blit(bottom, 0, th);
    Ok(out.into())
}

/// A mutable canvas filled with `pixel`
pub fn canvas(index: u32, width: u32, height: u32, pixel: u32) -> TransformResult<FrameMut> {
    Ok(FrameMut::new_filled(index, width, height, pixel)?)
}
