//! Synthetic frames and depth maps
//!
//! Deterministic inputs for regression tests. Every frame is fully valid.

use crate::error::{TestError, TestResult};
use vrstereo_core::{DepthMap, Frame, Plane, color};

fn fixture<T, E: std::fmt::Display>(name: &str, r: Result<T, E>) -> TestResult<T> {
    r.map_err(|e| TestError::Fixture {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Frame of a single color
pub fn solid_frame(index: u32, width: u32, height: u32, rgb: (u8, u8, u8)) -> TestResult<Frame> {
    fixture(
        "solid",
        Frame::new_filled(index, width, height, color::compose_rgb(rgb.0, rgb.1, rgb.2)),
    )
}

/// Frame whose red channel ramps left to right and green top to bottom
pub fn gradient_frame(index: u32, width: u32, height: u32) -> TestResult<Frame> {
    let wd = width.saturating_sub(1).max(1);
    let hd = height.saturating_sub(1).max(1);
    let mut bytes = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / wd).min(255) as u8;
            let g = (y * 255 / hd).min(255) as u8;
            bytes.extend_from_slice(&[r, g, 128]);
        }
    }
    fixture("gradient", Frame::from_rgb_bytes(index, width, height, &bytes))
}

/// Black and white checkerboard with square cells of side `cell`
pub fn checker_frame(index: u32, width: u32, height: u32, cell: u32) -> TestResult<Frame> {
    let cell = cell.max(1);
    let mut bytes = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = if ((x / cell) + (y / cell)) % 2 == 0 { 255 } else { 0 };
            bytes.extend_from_slice(&[v, v, v]);
        }
    }
    fixture("checker", Frame::from_rgb_bytes(index, width, height, &bytes))
}

/// Frame where every pixel holds a distinct pseudo-random color
///
/// The color is a hash of (x, y, seed), so the same arguments always give
/// the same frame.
pub fn textured_frame(index: u32, width: u32, height: u32, seed: u32) -> TestResult<Frame> {
    let mut bytes = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let mut h = x
                .wrapping_mul(0x9e37_79b1)
                .wrapping_add(y.wrapping_mul(0x85eb_ca6b))
                .wrapping_add(seed.wrapping_mul(0xc2b2_ae35));
            h ^= h >> 15;
            h = h.wrapping_mul(0x2c1b_3c6d);
            h ^= h >> 12;
            bytes.extend_from_slice(&[(h >> 24) as u8, (h >> 16) as u8, (h >> 8) as u8]);
        }
    }
    fixture("textured", Frame::from_rgb_bytes(index, width, height, &bytes))
}

/// Depth map with every value equal to `value`
pub fn constant_depth(width: u32, height: u32, value: f32) -> TestResult<DepthMap> {
    fixture("constant_depth", DepthMap::constant(width, height, value))
}

/// Depth map ramping linearly from 0 at x = 0 to 1 at x = width - 1
pub fn horizontal_ramp_depth(width: u32, height: u32) -> TestResult<DepthMap> {
    let denom = width.saturating_sub(1).max(1) as f32;
    let mut data = Vec::with_capacity((width * height) as usize);
    for _ in 0..height {
        for x in 0..width {
            data.push(x as f32 / denom);
        }
    }
    let plane = fixture("ramp_depth", Plane::from_data(width, height, data))?;
    fixture("ramp_depth", DepthMap::from_plane(plane))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_depth_ends() {
        let d = horizontal_ramp_depth(11, 2).unwrap();
        assert_eq!(d.get(0, 1).unwrap(), 0.0);
        assert_eq!(d.get(10, 1).unwrap(), 1.0);
        assert!((d.get(5, 0).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_textured_is_deterministic() {
        let a = textured_frame(0, 8, 8, 3).unwrap();
        let b = textured_frame(0, 8, 8, 3).unwrap();
        let c = textured_frame(0, 8, 8, 4).unwrap();
        assert_eq!(a.data(), b.data());
        assert_ne!(a.data(), c.data());
        assert_eq!(a.count_holes(), 0);
    }

    #[test]
    fn test_gradient_corners() {
        let f = gradient_frame(0, 5, 5).unwrap();
        assert_eq!(f.get_rgb(0, 0), Some((0, 0, 128)));
        assert_eq!(f.get_rgb(4, 4), Some((255, 255, 128)));
    }
}
