//! Depth and disparity planes
//!
//! [`DepthMap`] holds normalized per-pixel depth in `[0, 1]` (larger is
//! nearer). [`DisparityField`] holds a signed horizontal pixel shift per
//! pixel. Both are thin typed wrappers around [`Plane`] so that the two can
//! never be confused at an API boundary.

use crate::error::{Error, Result};
use crate::plane::Plane;

/// Epsilon added to the min-max range during normalization
pub const NORMALIZE_EPSILON: f32 = 1e-8;

/// Normalized depth map, values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    plane: Plane,
}

impl DepthMap {
    /// Wrap a plane whose values are already normalized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] at the first value that is
    /// non-finite or outside `[0, 1]`.
    pub fn from_plane(plane: Plane) -> Result<Self> {
        let w = plane.width();
        for (i, &v) in plane.data().iter().enumerate() {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(Error::ValueOutOfRange {
                    x: (i % w as usize) as u32,
                    y: (i / w as usize) as u32,
                    value: v,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(DepthMap { plane })
    }

    /// Create a depth map with every value set to `value`.
    pub fn constant(width: u32, height: u32, value: f32) -> Result<Self> {
        Self::from_plane(Plane::new_with_value(width, height, value)?)
    }

    /// Normalize an arbitrary raw depth estimate into `[0, 1]`.
    ///
    /// Each value becomes `(d - min) / (max - min + 1e-8)`; with `invert`
    /// the result is flipped to `1 - d`. The normalization is per call, so
    /// consecutive frames are scaled independently of each other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the raw plane contains a
    /// non-finite value.
    pub fn normalize_min_max(raw: &Plane, invert: bool) -> Result<Self> {
        if raw.data().iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter(
                "raw depth contains non-finite values".into(),
            ));
        }
        let (lo, hi) = raw.min_max();
        let range = hi - lo + NORMALIZE_EPSILON;
        let plane = raw.map(|d| {
            let n = ((d - lo) / range).clamp(0.0, 1.0);
            if invert { 1.0 - n } else { n }
        });
        Ok(DepthMap { plane })
    }

    /// Get the width
    #[inline]
    pub fn width(&self) -> u32 {
        self.plane.width()
    }

    /// Get the height
    #[inline]
    pub fn height(&self) -> u32 {
        self.plane.height()
    }

    /// Get the dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.plane.dimensions()
    }

    /// Borrow the underlying plane
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Get a depth value
    pub fn get(&self, x: u32, y: u32) -> Result<f32> {
        self.plane.get_pixel(x, y)
    }
}

/// Signed horizontal pixel shift per pixel
#[derive(Debug, Clone, PartialEq)]
pub struct DisparityField {
    plane: Plane,
}

impl DisparityField {
    /// Wrap a plane of shifts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if any shift is non-finite.
    pub fn from_plane(plane: Plane) -> Result<Self> {
        if plane.data().iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter(
                "disparity contains non-finite values".into(),
            ));
        }
        Ok(DisparityField { plane })
    }

    /// A field with zero shift everywhere.
    pub fn zeros(width: u32, height: u32) -> Result<Self> {
        Ok(DisparityField {
            plane: Plane::new(width, height)?,
        })
    }

    /// Get the width
    #[inline]
    pub fn width(&self) -> u32 {
        self.plane.width()
    }

    /// Get the height
    #[inline]
    pub fn height(&self) -> u32 {
        self.plane.height()
    }

    /// Get the dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.plane.dimensions()
    }

    /// Borrow the underlying plane
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Shift at (x, y) without bounds checking
    #[inline]
    pub fn shift_unchecked(&self, x: u32, y: u32) -> f32 {
        self.plane.get_pixel_unchecked(x, y)
    }

    /// Largest absolute shift in the field
    pub fn max_abs(&self) -> f32 {
        self.plane
            .data()
            .iter()
            .fold(0.0f32, |acc, &v| acc.max(v.abs()))
    }
}
