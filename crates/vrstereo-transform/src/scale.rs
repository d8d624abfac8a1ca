//! Frame scaling
//!
//! - Area mapping for shrinking: each destination pixel averages the source
//!   rectangle it covers, with fractional edge coverage.
//! - Bilinear interpolation for enlarging, pixel centers aligned.
//!
//! Holes do not contribute to averages; a destination pixel whose whole
//! footprint is holes stays a hole.

use crate::sample::sample_bilinear;
use crate::{TransformError, TransformResult};
use vrstereo_core::{Frame, FrameMut, color};

/// Scaling method to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMethod {
    /// Bilinear interpolation (good for enlarging)
    Linear,
    /// Area mapping (best for shrinking, anti-aliased)
    AreaMap,
    /// Area mapping when shrinking on both axes, bilinear otherwise
    #[default]
    Auto,
}

/// Scale a frame to exactly `width` x `height`
///
/// # Errors
///
/// Returns [`TransformError::InvalidScale`] if either target side is 0.
pub fn scale_to_size(
    frame: &Frame,
    width: u32,
    height: u32,
    method: ScaleMethod,
) -> TransformResult<Frame> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidScale(format!(
            "target size {}x{}",
            width, height
        )));
    }
    let (w, h) = frame.dimensions();
    if (w, h) == (width, height) {
        return Ok(frame.deep_clone());
    }
    let method = match method {
        ScaleMethod::Auto if width <= w && height <= h => ScaleMethod::AreaMap,
        ScaleMethod::Auto => ScaleMethod::Linear,
        m => m,
    };
    match method {
        ScaleMethod::AreaMap => scale_area_map(frame, width, height),
        _ => scale_linear(frame, width, height),
    }
}

/// Scale a frame by a common factor, preserving aspect
///
/// The target size is `floor(w * factor) x floor(h * factor)`.
pub fn scale(frame: &Frame, factor: f32, method: ScaleMethod) -> TransformResult<Frame> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(TransformError::InvalidScale(format!("factor {}", factor)));
    }
    let nw = (frame.width() as f64 * factor as f64).floor() as u32;
    let nh = (frame.height() as f64 * factor as f64).floor() as u32;
    scale_to_size(frame, nw, nh, method)
}

fn scale_linear(frame: &Frame, width: u32, height: u32) -> TransformResult<Frame> {
    let (w, h) = frame.dimensions();
    let sx = w as f32 / width as f32;
    let sy = h as f32 / height as f32;
    let mut out = FrameMut::new_filled(frame.index(), width, height, color::HOLE_PIXEL)?;
    for y in 0..height {
        let fy = (y as f32 + 0.5) * sy - 0.5;
        for (x, px) in out.row_mut(y).iter_mut().enumerate() {
            let fx = (x as f32 + 0.5) * sx - 0.5;
            *px = sample_bilinear(frame, fx, fy);
        }
    }
    Ok(out.into())
}

/// Source spans covered by each destination index: `(src, weight)` pairs
fn area_spans(src: u32, dst: u32) -> Vec<Vec<(u32, f32)>> {
    let ratio = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * ratio;
            let end = ((d + 1) as f64 * ratio).min(src as f64);
            let mut span = Vec::new();
            let mut s = start.floor() as u32;
            while (s as f64) < end && s < src {
                let lo = start.max(s as f64);
                let hi = end.min((s + 1) as f64);
                if hi > lo {
                    span.push((s, (hi - lo) as f32));
                }
                s += 1;
            }
            span
        })
        .collect()
}

fn scale_area_map(frame: &Frame, width: u32, height: u32) -> TransformResult<Frame> {
    let xs = area_spans(frame.width(), width);
    let ys = area_spans(frame.height(), height);
    let mut out = FrameMut::new_filled(frame.index(), width, height, color::HOLE_PIXEL)?;

    for (y, yspan) in ys.iter().enumerate() {
        let row_out = out.row_mut(y as u32);
        for (px, xspan) in row_out.iter_mut().zip(&xs) {
            let (mut r, mut g, mut b, mut wsum) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
            for &(sy, wy) in yspan {
                let row = frame.row(sy);
                for &(sx, wx) in xspan {
                    let p = row[sx as usize];
                    if !color::is_valid(p) {
                        continue;
                    }
                    let wgt = wx * wy;
                    let (pr, pg, pb) = color::extract_rgb(p);
                    r += wgt * pr as f32;
                    g += wgt * pg as f32;
                    b += wgt * pb as f32;
                    wsum += wgt;
                }
            }
            *px = if wsum > 0.0 {
                let ch = |v: f32| (v / wsum).round().clamp(0.0, 255.0) as u8;
                color::compose_rgb(ch(r), ch(g), ch(b))
            } else {
                color::HOLE_PIXEL
            };
        }
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_spans_cover_source() {
        let spans = area_spans(10, 4);
        let total: f32 = spans.iter().flatten().map(|&(_, w)| w).sum();
        assert!((total - 10.0).abs() < 1e-4);
        assert_eq!(spans[0][0], (0, 1.0));
        assert_eq!(spans[0].last().map(|s| s.0), Some(2));
    }

    #[test]
    fn test_halve_averages() {
        let data = vec![
            color::compose_rgb(0, 0, 0),
            color::compose_rgb(100, 0, 0),
            color::compose_rgb(200, 0, 0),
            color::compose_rgb(100, 0, 0),
        ];
        let f = Frame::from_pixels(0, 2, 2, data).unwrap();
        let s = scale_to_size(&f, 1, 1, ScaleMethod::Auto).unwrap();
        assert_eq!(s.get_rgb(0, 0), Some((100, 0, 0)));
    }

    #[test]
    fn test_area_skips_holes() {
        let mut m = Frame::new_filled(0, 2, 1, color::compose_rgb(80, 80, 80))
            .unwrap()
            .to_mut();
        m.set_pixel(1, 0, color::HOLE_PIXEL).unwrap();
        let s = scale_to_size(&m.into(), 1, 1, ScaleMethod::AreaMap).unwrap();
        assert_eq!(s.get_rgb(0, 0), Some((80, 80, 80)));
        assert!(s.is_valid(0, 0));
    }

    #[test]
    fn test_enlarge_solid() {
        let f = Frame::new_filled(0, 3, 2, color::compose_rgb(7, 8, 9)).unwrap();
        let s = scale(&f, 2.5, ScaleMethod::Auto).unwrap();
        assert_eq!(s.dimensions(), (7, 5));
        assert!(s.data().iter().all(|&p| p == color::compose_rgb(7, 8, 9)));
    }

    #[test]
    fn test_invalid_targets() {
        let f = Frame::new_filled(0, 3, 2, color::BLACK).unwrap();
        assert!(scale_to_size(&f, 0, 2, ScaleMethod::Auto).is_err());
        assert!(scale(&f, -1.0, ScaleMethod::Auto).is_err());
    }
}
