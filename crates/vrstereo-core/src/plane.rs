//! Plane - Dense floating-point image
//!
//! `Plane` is a 2D array of `f32` values. It is the storage behind
//! [`crate::DepthMap`] and [`crate::DisparityField`] and the working type of
//! the smoothing filters.
//!
//! # Examples
//!
//! ```
//! use vrstereo_core::Plane;
//!
//! let mut plane = Plane::new(100, 100).unwrap();
//! plane.set_pixel(10, 20, 0.5).unwrap();
//! assert_eq!(plane.get_pixel(10, 20).unwrap(), 0.5);
//! ```

use crate::error::{Error, Result};

/// Floating-point plane
///
/// # Memory Layout
///
/// Data is stored in row-major order with no padding. The value at (x, y)
/// is at index `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Values (row-major, no padding)
    data: Vec<f32>,
}

impl Plane {
    /// Create a new plane with all values set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_with_value(width, height, 0.0)
    }

    /// Create a new plane with all values set to `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new_with_value(width: u32, height: u32, value: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let size = (width as usize) * (height as usize);
        Ok(Plane {
            width,
            height,
            data: vec![value; size],
        })
    }

    /// Create a plane from existing data
    ///
    /// # Arguments
    ///
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `data` - Row-major values, length must be `width * height`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` for a zero side and
    /// `Error::BufferLength` if the data length doesn't match.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(Error::BufferLength {
                len: data.len(),
                width,
                height,
                expected,
            });
        }
        Ok(Plane {
            width,
            height,
            data,
        })
    }

    /// Get the width
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get a value
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<f32> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }
        Ok(self.get_pixel_unchecked(x, y))
    }

    /// Get a value without bounds checking
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Set a value
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: f32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }
        self.set_pixel_unchecked(x, y, value);
        Ok(())
    }

    /// Set a value without bounds checking
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, value: f32) {
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.data[idx] = value;
    }

    /// Get a row of values
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let start = (y as usize) * (self.width as usize);
        &self.data[start..start + self.width as usize]
    }

    /// Get a mutable row of values
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [f32] {
        let w = self.width as usize;
        let start = (y as usize) * w;
        &mut self.data[start..start + w]
    }

    /// Get raw access to the data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Get mutable access to the data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the plane, returning its values
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Minimum and maximum over all values
    ///
    /// NaN values are skipped; a plane of only NaN reports `(+inf, -inf)`.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Apply `f` to every value, producing a new plane
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Plane {
        Plane {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Check if two planes have the same width and height
    pub fn sizes_equal(&self, other: &Plane) -> bool {
        self.dimensions() == other.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_creation() {
        let p = Plane::new(10, 4).unwrap();
        assert_eq!(p.dimensions(), (10, 4));
        assert!(p.data().iter().all(|&v| v == 0.0));
        assert!(Plane::new(0, 4).is_err());
    }

    #[test]
    fn test_from_data_length() {
        assert!(Plane::from_data(2, 2, vec![0.0; 3]).is_err());
        let p = Plane::from_data(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(p.get_pixel(1, 1).unwrap(), 4.0);
        assert_eq!(p.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_bounds() {
        let mut p = Plane::new(2, 2).unwrap();
        assert!(p.get_pixel(2, 0).is_err());
        assert!(p.set_pixel(0, 2, 1.0).is_err());
    }

    #[test]
    fn test_min_max_and_map() {
        let p = Plane::from_data(3, 1, vec![-1.0, 5.0, 2.0]).unwrap();
        assert_eq!(p.min_max(), (-1.0, 5.0));
        let q = p.map(|v| v * 2.0);
        assert_eq!(q.data(), &[-2.0, 10.0, 4.0]);
    }
}
