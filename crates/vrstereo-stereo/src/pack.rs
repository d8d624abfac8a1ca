//! VR180 canvas packing
//!
//! Each left/right pair is scaled to fit a `W x H/2` box with `W = 2H`,
//! preserving aspect, and centered on a black `W x H` canvas: left eye in
//! the top half, right eye in the bottom half.
//!
//! The fit factor is `min(W / eye_w, (H/2) / eye_h)`. The geometry is
//! computed in integer arithmetic so that the scaled size is exactly
//! `floor(eye * scale)` on both axes.

use crate::{StereoError, StereoResult};
use vrstereo_core::{Frame, color};
use vrstereo_transform::{ScaleMethod, canvas, scale_to_size};

/// Canvas height used when none is configured
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1440;

/// Placement of the eye images on a canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasLayout {
    /// Canvas width, always `2 * canvas_height`
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Scaled eye width
    pub eye_width: u32,
    /// Scaled eye height
    pub eye_height: u32,
    /// Left edge of both eye images
    pub x_offset: u32,
    /// Top edge of the left eye
    pub top_y: u32,
    /// Top edge of the right eye
    pub bottom_y: u32,
}

/// Packs eye pairs onto `2H x H` canvases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vr180Packer {
    height: u32,
}

impl Vr180Packer {
    /// Create a packer for canvases of height `height`
    ///
    /// # Errors
    ///
    /// Returns [`StereoError::InvalidParameter`] unless `height` is even and
    /// greater than zero.
    pub fn new(height: u32) -> StereoResult<Self> {
        if height == 0 || height % 2 != 0 {
            return Err(StereoError::InvalidParameter {
                param: "vr180_canvas_height",
                reason: format!("{} must be even and > 0", height),
            });
        }
        if height > u32::MAX / 2 {
            return Err(StereoError::InvalidParameter {
                param: "vr180_canvas_height",
                reason: format!("{} is too large", height),
            });
        }
        Ok(Vr180Packer { height })
    }

    /// Canvas height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Canvas width, `2 * height`
    pub fn width(&self) -> u32 {
        self.height * 2
    }

    /// Compute the placement of an `eye_width x eye_height` image
    ///
    /// # Errors
    ///
    /// Returns [`vrstereo_core::Error::InvalidDimension`] (wrapped) if either
    /// eye side is zero.
    pub fn layout(&self, eye_width: u32, eye_height: u32) -> StereoResult<CanvasLayout> {
        if eye_width == 0 || eye_height == 0 {
            return Err(vrstereo_core::Error::InvalidDimension {
                width: eye_width,
                height: eye_height,
            }
            .into());
        }
        let (cw, half) = (self.width() as u64, (self.height / 2) as u64);
        let (ew, eh) = (eye_width as u64, eye_height as u64);

        // W / ew <= (H/2) / eh  <=>  W * eh <= (H/2) * ew
        let (nw, nh) = if cw * eh <= half * ew {
            (cw, eh * cw / ew)
        } else {
            (ew * half / eh, half)
        };
        let (nw, nh) = (nw.clamp(1, cw) as u32, nh.clamp(1, half) as u32);
        let half = half as u32;
        let top_y = (half - nh) / 2;

        Ok(CanvasLayout {
            canvas_width: self.width(),
            canvas_height: self.height,
            eye_width: nw,
            eye_height: nh,
            x_offset: (self.width() - nw) / 2,
            top_y,
            bottom_y: half + top_y,
        })
    }

    /// Pack one pair onto a canvas carrying the index of `left`
    ///
    /// # Errors
    ///
    /// - [`StereoError::DimensionMismatch`] if the eyes differ in size
    /// - [`StereoError::IndexMismatch`] if the eyes carry different indices
    pub fn pack_pair(&self, left: &Frame, right: &Frame) -> StereoResult<Frame> {
        if left.dimensions() != right.dimensions() {
            return Err(StereoError::DimensionMismatch {
                what: "right eye",
                expected: left.dimensions(),
                actual: right.dimensions(),
            });
        }
        if left.index() != right.index() {
            return Err(StereoError::IndexMismatch {
                position: left.index() as usize,
                left: left.index(),
                right: right.index(),
            });
        }
        let lay = self.layout(left.width(), left.height())?;
        let l = scale_to_size(left, lay.eye_width, lay.eye_height, ScaleMethod::Auto)?;
        let r = scale_to_size(right, lay.eye_width, lay.eye_height, ScaleMethod::Auto)?;

        let mut out = canvas(left.index(), lay.canvas_width, lay.canvas_height, color::BLACK)?;
        out.blit(&l, lay.x_offset, lay.top_y);
        out.blit(&r, lay.x_offset, lay.bottom_y);
        Ok(out.into())
    }

    /// Pack two equal-length eye sequences, one canvas per position
    ///
    /// # Errors
    ///
    /// - [`StereoError::EmptySequence`] if either sequence is empty
    /// - [`StereoError::CountMismatch`] if the lengths differ
    /// - any error of [`Vr180Packer::pack_pair`]
    pub fn pack_sequence(&self, left: &[Frame], right: &[Frame]) -> StereoResult<Vec<Frame>> {
        check_pairing(left, right)?;
        left.iter()
            .zip(right)
            .enumerate()
            .map(|(i, (l, r))| {
                if l.index() != r.index() {
                    return Err(StereoError::IndexMismatch {
                        position: i,
                        left: l.index(),
                        right: r.index(),
                    });
                }
                self.pack_pair(l, r)
            })
            .collect()
    }
}

/// Check that two eye sequences can be paired position by position
///
/// # Errors
///
/// Returns [`StereoError::EmptySequence`] or [`StereoError::CountMismatch`].
pub fn check_pairing(left: &[Frame], right: &[Frame]) -> StereoResult<()> {
    if left.len() != right.len() {
        return Err(StereoError::CountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    if left.is_empty() {
        return Err(StereoError::EmptySequence);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates() {
        assert!(Vr180Packer::new(0).is_err());
        assert!(Vr180Packer::new(721).is_err());
        let p = Vr180Packer::new(1440).unwrap();
        assert_eq!((p.width(), p.height()), (2880, 1440));
    }

    #[test]
    fn test_layout_wide_eye() {
        // 16:9 eye into a 2880 x 720 box: width-limited
        let lay = Vr180Packer::new(1440).unwrap().layout(1280, 720).unwrap();
        assert_eq!((lay.eye_width, lay.eye_height), (1280, 720));
        assert_eq!(lay.x_offset, 800);
        assert_eq!((lay.top_y, lay.bottom_y), (0, 720));
    }

    #[test]
    fn test_layout_height_limited() {
        let lay = Vr180Packer::new(100).unwrap().layout(40, 30).unwrap();
        // scale = min(200/40, 50/30) = 5/3 -> 66 x 50
        assert_eq!((lay.eye_width, lay.eye_height), (66, 50));
        assert_eq!(lay.x_offset, 67);
        assert_eq!((lay.top_y, lay.bottom_y), (0, 50));
    }

    #[test]
    fn test_layout_width_limited() {
        let lay = Vr180Packer::new(100).unwrap().layout(400, 50).unwrap();
        // scale = min(200/400, 50/50) = 1/2 -> 200 x 25
        assert_eq!((lay.eye_width, lay.eye_height), (200, 25));
        assert_eq!(lay.x_offset, 0);
        assert_eq!((lay.top_y, lay.bottom_y), (12, 62));
    }

    #[test]
    fn test_layout_rejects_empty_eye() {
        assert!(Vr180Packer::new(10).unwrap().layout(0, 4).is_err());
    }

    #[test]
    fn test_pairing() {
        let f = Frame::new_filled(0, 2, 2, color::BLACK).unwrap();
        assert!(matches!(
            check_pairing(&[f.clone(), f.clone()], &[f.clone()]),
            Err(StereoError::CountMismatch { left: 2, right: 1 })
        ));
        assert!(matches!(check_pairing(&[], &[]), Err(StereoError::EmptySequence)));
        assert!(check_pairing(&[f.clone()], &[f]).is_ok());
    }

    #[test]
    fn test_index_mismatch() {
        let p = Vr180Packer::new(8).unwrap();
        let a = Frame::new_filled(0, 4, 2, color::BLACK).unwrap();
        let b = Frame::new_filled(1, 4, 2, color::BLACK).unwrap();
        assert!(matches!(
            p.pack_sequence(&[a], &[b]),
            Err(StereoError::IndexMismatch { position: 0, left: 0, right: 1 })
        ));
    }
}
