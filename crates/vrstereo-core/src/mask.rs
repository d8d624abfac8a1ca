//! HoleMask - binary mask of unsampled pixels

use crate::color;
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Binary mask, `true` where an eye image has no real sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl HoleMask {
    /// A mask with no holes.
    pub fn none(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(HoleMask {
            width,
            height,
            bits: vec![false; (width as usize) * (height as usize)],
        })
    }

    /// Derive the mask from a frame's validity channel.
    ///
    /// Color plays no part: a black pixel with full validity is not a hole.
    pub fn from_validity(frame: &Frame) -> Self {
        HoleMask {
            width: frame.width(),
            height: frame.height(),
            bits: frame.data().iter().map(|&p| !color::is_valid(p)).collect(),
        }
    }

    /// Get the dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True if (x, y) is a hole. Out-of-range coordinates are not holes.
    #[inline]
    pub fn is_hole(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.bits[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Mark or clear (x, y).
    pub fn set(&mut self, x: u32, y: u32, hole: bool) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + x as usize,
                len: self.bits.len(),
            });
        }
        self.bits[(y as usize) * (self.width as usize) + x as usize] = hole;
        Ok(())
    }

    /// Number of holes
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// True if there are no holes
    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Raw row-major bits
    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_validity_ignores_color() {
        let mut m = Frame::new_filled(0, 3, 1, color::compose_rgb(0, 0, 0))
            .unwrap()
            .to_mut();
        m.set_pixel(1, 0, color::HOLE_PIXEL).unwrap();
        let mask = HoleMask::from_validity(&m.into());
        assert!(!mask.is_hole(0, 0));
        assert!(mask.is_hole(1, 0));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn test_set_and_clear() {
        let mut mask = HoleMask::none(2, 2).unwrap();
        assert!(mask.is_empty());
        mask.set(1, 1, true).unwrap();
        assert_eq!(mask.count(), 1);
        mask.set(1, 1, false).unwrap();
        assert!(mask.is_empty());
        assert!(mask.set(2, 0, true).is_err());
    }
}
