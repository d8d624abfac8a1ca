//! Frame - The indexed image container
//!
//! A `Frame` is one picture of a sequence: an ordered index, width, height
//! and a dense buffer of 32-bit `0xRRGGBBAA` pixels. The alpha byte is a
//! validity channel (see [`crate::color`]), which lets remapping stages mark
//! sampling holes without confusing them with black content.
//!
//! # Ownership model
//!
//! `Frame` uses `Arc` for cheap cloning (shared, immutable ownership).
//! To build or modify pixel data, work on a [`FrameMut`] obtained from
//! [`Frame::try_into_mut`] or [`Frame::to_mut`], then convert back with
//! `Into<Frame>`.

mod access;

use crate::color;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Internal frame data
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameData {
    /// Position in the sequence
    index: u32,
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Pixels, row-major, no padding
    data: Vec<u32>,
}

/// Immutable, shareable frame
///
/// # Examples
///
/// ```
/// use vrstereo_core::{Frame, color};
///
/// let frame = Frame::new_filled(0, 64, 32, color::compose_rgb(10, 20, 30)).unwrap();
/// assert_eq!(frame.dimensions(), (64, 32));
/// assert_eq!(frame.get_rgb(5, 5), Some((10, 20, 30)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    inner: Arc<FrameData>,
}

/// Exclusively owned, mutable frame
#[derive(Debug)]
pub struct FrameMut {
    inner: FrameData,
}

fn check_dimensions(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension { width, height });
    }
    Ok((width as usize) * (height as usize))
}

impl Frame {
    /// Create a new frame with every pixel set to [`color::HOLE_PIXEL`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        Self::new_filled(index, width, height, color::HOLE_PIXEL)
    }

    /// Create a new frame with every pixel set to `pixel`.
    pub fn new_filled(index: u32, width: u32, height: u32, pixel: u32) -> Result<Self> {
        let size = check_dimensions(width, height)?;
        Ok(Frame {
            inner: Arc::new(FrameData {
                index,
                width,
                height,
                data: vec![pixel; size],
            }),
        })
    }

    /// Create a fully valid frame from packed RGB8 bytes (`r, g, b, r, g, b, ...`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `bytes.len() != width * height * 3`.
    pub fn from_rgb_bytes(index: u32, width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let size = check_dimensions(width, height)?;
        if bytes.len() != size * 3 {
            return Err(Error::BufferLength {
                len: bytes.len(),
                width,
                height,
                expected: size * 3,
            });
        }
        let data = bytes
            .chunks_exact(3)
            .map(|c| color::compose_rgb(c[0], c[1], c[2]))
            .collect();
        Ok(Frame {
            inner: Arc::new(FrameData {
                index,
                width,
                height,
                data,
            }),
        })
    }

    /// Create a frame from packed `0xRRGGBBAA` words.
    pub fn from_pixels(index: u32, width: u32, height: u32, data: Vec<u32>) -> Result<Self> {
        let size = check_dimensions(width, height)?;
        if data.len() != size {
            return Err(Error::BufferLength {
                len: data.len(),
                width,
                height,
                expected: size,
            });
        }
        Ok(Frame {
            inner: Arc::new(FrameData {
                index,
                width,
                height,
                data,
            }),
        })
    }

    /// Get the sequence index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.inner.index
    }

    /// Get the frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the frame dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Get raw access to the pixel words.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get one row of pixel words.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u32] {
        let start = (y as usize) * (self.inner.width as usize);
        &self.inner.data[start..start + self.inner.width as usize]
    }

    /// Check if two frames have the same width and height.
    pub fn sizes_equal(&self, other: &Frame) -> bool {
        self.dimensions() == other.dimensions()
    }

    /// Number of pixels whose validity channel marks a hole.
    pub fn count_holes(&self) -> usize {
        self.inner
            .data
            .iter()
            .filter(|&&p| !color::is_valid(p))
            .count()
    }

    /// Pack the RGB channels into `r, g, b, ...` bytes, dropping validity.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.inner.data.len() * 3);
        for &p in &self.inner.data {
            let (r, g, b) = color::extract_rgb(p);
            out.extend_from_slice(&[r, g, b]);
        }
        out
    }

    /// Same pixels under a different sequence index.
    ///
    /// Shares the pixel buffer when this is the only handle, copies otherwise.
    pub fn with_index(self, index: u32) -> Frame {
        let mut m = self.try_into_mut().unwrap_or_else(|f| f.to_mut());
        m.inner.index = index;
        m.into()
    }

    /// Create an independent copy of this frame.
    ///
    /// Unlike `clone()` which shares data via Arc, this allocates a new buffer.
    pub fn deep_clone(&self) -> Self {
        Frame {
            inner: Arc::new((*self.inner).clone()),
        }
    }

    /// Try to get mutable access to the pixel data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<FrameMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => Ok(FrameMut { inner }),
            Err(arc) => Err(Frame { inner: arc }),
        }
    }

    /// Create a mutable copy of this frame.
    pub fn to_mut(&self) -> FrameMut {
        FrameMut {
            inner: (*self.inner).clone(),
        }
    }
}

impl FrameMut {
    /// Create a new mutable frame with every pixel set to `pixel`.
    pub fn new_filled(index: u32, width: u32, height: u32, pixel: u32) -> Result<Self> {
        let size = check_dimensions(width, height)?;
        Ok(FrameMut {
            inner: FrameData {
                index,
                width,
                height,
                data: vec![pixel; size],
            },
        })
    }

    /// Get the sequence index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.inner.index
    }

    /// Get the frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the frame dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.inner.width, self.inner.height)
    }

    /// Get raw access to the pixel words.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable access to the pixel words.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.inner.data
    }

    /// Get one mutable row of pixel words.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let w = self.inner.width as usize;
        let start = (y as usize) * w;
        &mut self.inner.data[start..start + w]
    }

    /// Set every pixel to `pixel`.
    pub fn fill(&mut self, pixel: u32) {
        self.inner.data.fill(pixel);
    }

    /// Copy `src` into this frame with its top-left corner at (`x`, `y`).
    ///
    /// Parts of `src` falling outside this frame are clipped.
    pub fn blit(&mut self, src: &Frame, x: u32, y: u32) {
        let (dw, dh) = self.dimensions();
        if x >= dw || y >= dh {
            return;
        }
        let cw = src.width().min(dw - x) as usize;
        let ch = src.height().min(dh - y);
        for sy in 0..ch {
            let srow = &src.row(sy)[..cw];
            let drow = self.row_mut(y + sy);
            drow[x as usize..x as usize + cw].copy_from_slice(srow);
        }
    }
}

impl From<FrameMut> for Frame {
    fn from(m: FrameMut) -> Self {
        Frame {
            inner: Arc::new(m.inner),
        }
    }
}
