//! vrstereo Core - Basic data structures for stereo frame synthesis
//!
//! This crate provides the fundamental data structures used throughout
//! the vrstereo workspace:
//!
//! - [`Frame`] / [`FrameMut`] - Indexed RGB frame with a validity channel
//!   (immutable / mutable)
//! - [`Plane`] - Dense `f32` plane
//! - [`DepthMap`] - Normalized per-frame depth, larger = nearer
//! - [`DisparityField`] - Signed horizontal pixel shift per pixel
//! - [`HoleMask`] - Binary mask of sampling holes
//! - [`FrameArena`] - Index-addressed, contiguous frame sequence

pub mod arena;
pub mod depth;
pub mod error;
pub mod frame;
pub mod mask;
pub mod plane;

pub use arena::FrameArena;
pub use depth::{DepthMap, DisparityField};
pub use error::{Error, Result};
pub use frame::{Frame, FrameMut};
pub use mask::HoleMask;
pub use plane::Plane;

/// Channel helpers for 32-bit frame pixels.
///
/// # Pixel format
///
/// Pixels are stored as `0xRRGGBBAA` (red in MSB). The alpha byte is the
/// validity channel: [`VALID`] marks a real sample, [`HOLE`] marks a pixel
/// that no source sample landed on.
pub mod color {
    /// Shift amounts for extracting color channels
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;
    pub const ALPHA_SHIFT: u32 = 0;

    /// Alpha value of a valid pixel
    pub const VALID: u8 = 255;
    /// Alpha value of a hole
    pub const HOLE: u8 = 0;

    /// Extract red component from a 32-bit pixel.
    #[inline]
    pub fn red(pixel: u32) -> u8 {
        ((pixel >> RED_SHIFT) & 0xff) as u8
    }

    /// Extract green component from a 32-bit pixel.
    #[inline]
    pub fn green(pixel: u32) -> u8 {
        ((pixel >> GREEN_SHIFT) & 0xff) as u8
    }

    /// Extract blue component from a 32-bit pixel.
    #[inline]
    pub fn blue(pixel: u32) -> u8 {
        ((pixel >> BLUE_SHIFT) & 0xff) as u8
    }

    /// Extract alpha (validity) component from a 32-bit pixel.
    #[inline]
    pub fn alpha(pixel: u32) -> u8 {
        ((pixel >> ALPHA_SHIFT) & 0xff) as u8
    }

    /// Compose a valid 32-bit RGB pixel (alpha = [`VALID`]).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | ((VALID as u32) << ALPHA_SHIFT)
    }

    /// Compose a 32-bit RGBA pixel.
    #[inline]
    pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | ((a as u32) << ALPHA_SHIFT)
    }

    /// Extract RGB values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgb(pixel: u32) -> (u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel))
    }

    /// Extract RGBA values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgba(pixel: u32) -> (u8, u8, u8, u8) {
        (red(pixel), green(pixel), blue(pixel), alpha(pixel))
    }

    /// True if the pixel carries a real sample.
    #[inline]
    pub fn is_valid(pixel: u32) -> bool {
        alpha(pixel) != HOLE
    }

    /// The hole pixel: black with zero validity.
    pub const HOLE_PIXEL: u32 = 0;

    /// Valid black, used for canvas padding.
    pub const BLACK: u32 = (VALID as u32) << ALPHA_SHIFT;

}
