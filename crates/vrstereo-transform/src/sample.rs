//! Sub-pixel sampling
//!
//! Bicubic and bilinear interpolation of frame pixels at fractional
//! coordinates, with explicit handling of out-of-frame taps and of taps
//! that are themselves holes.
//!
//! # Bicubic kernel
//!
//! The Keys cubic convolution kernel with `a = -0.75`:
//!
//! ```text
//! W(t) = (a+2)|t|^3 - (a+3)|t|^2 + 1          for |t| <= 1
//! W(t) = a|t|^3 - 5a|t|^2 + 8a|t| - 4a         for 1 < |t| < 2
//! ```
//!
//! At integer positions the weights are exactly `[0, 1, 0, 0]`, so sampling
//! on the pixel grid reproduces the input bit for bit.
//!
//! # Holes
//!
//! Invalid taps are dropped and the remaining weights renormalized. If the
//! tap nearest to the sample position is invalid, the result is a hole.

use vrstereo_core::{Frame, color};

/// Keys kernel parameter
pub const CUBIC_A: f32 = -0.75;

/// How taps that fall outside the frame are mapped back inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeMode {
    /// Mirror including the edge pixel: `cba|abcd|dcb`
    #[default]
    Reflect,
    /// Repeat the edge pixel: `aaa|abcd|ddd`
    Replicate,
}

/// Map an integer coordinate into `[0, n)` according to `mode`
///
/// # Panics
///
/// Panics if `n == 0`.
#[inline]
pub fn edge_coord(i: i64, n: u32, mode: EdgeMode) -> u32 {
    let n = n as i64;
    match mode {
        EdgeMode::Replicate => i.clamp(0, n - 1) as u32,
        EdgeMode::Reflect => {
            let period = 2 * n;
            let m = i.rem_euclid(period);
            (if m < n { m } else { period - 1 - m }) as u32
        }
    }
}

/// Keys cubic weights for the four taps at offsets -1, 0, 1, 2
///
/// `t` is the fractional offset in `[0, 1)` from tap 0.
#[inline]
pub fn cubic_weights(t: f32) -> [f32; 4] {
    let a = CUBIC_A;
    let near = |x: f32| ((a + 2.0) * x - (a + 3.0)) * x * x + 1.0;
    let far = |x: f32| ((a * x - 5.0 * a) * x + 8.0 * a) * x - 4.0 * a;
    [far(1.0 + t), near(t), near(1.0 - t), far(2.0 - t)]
}

#[inline]
fn round_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Weighted sum of up to 16 taps, skipping holes
///
/// Returns `None` when no valid tap carries weight.
fn blend(taps: &[(u32, f32)]) -> Option<u32> {
    let (mut r, mut g, mut b, mut wsum) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for &(p, w) in taps {
        if !color::is_valid(p) {
            continue;
        }
        let (pr, pg, pb) = color::extract_rgb(p);
        r += w * pr as f32;
        g += w * pg as f32;
        b += w * pb as f32;
        wsum += w;
    }
    if wsum.abs() < 1e-4 {
        return None;
    }
    if (wsum - 1.0).abs() > 1e-6 {
        r /= wsum;
        g /= wsum;
        b /= wsum;
    }
    Some(color::compose_rgb(
        round_channel(r),
        round_channel(g),
        round_channel(b),
    ))
}

/// Bicubic sample of `row` at horizontal position `x`
///
/// The row is treated as a 1-pixel-high image; vertical position is exact.
pub fn sample_cubic_row(row: &[u32], x: f32, mode: EdgeMode) -> u32 {
    let n = row.len() as u32;
    let x0 = x.floor();
    let t = x - x0;
    let x0 = x0 as i64;

    let nearest = row[edge_coord(x.round() as i64, n, mode) as usize];
    if !color::is_valid(nearest) {
        return color::HOLE_PIXEL;
    }
    if t == 0.0 {
        return nearest;
    }

    let w = cubic_weights(t);
    let taps: [(u32, f32); 4] =
        std::array::from_fn(|k| (row[edge_coord(x0 - 1 + k as i64, n, mode) as usize], w[k]));
    blend(&taps).unwrap_or(nearest)
}

/// Bilinear sample of `frame` at (`x`, `y`), edges replicated
pub fn sample_bilinear(frame: &Frame, x: f32, y: f32) -> u32 {
    let (w, h) = frame.dimensions();
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let nearest = frame.get_pixel_unchecked(
        if fx < 0.5 { x0 } else { x1 },
        if fy < 0.5 { y0 } else { y1 },
    );
    if !color::is_valid(nearest) {
        return color::HOLE_PIXEL;
    }

    let taps = [
        (frame.get_pixel_unchecked(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (frame.get_pixel_unchecked(x1, y0), fx * (1.0 - fy)),
        (frame.get_pixel_unchecked(x0, y1), (1.0 - fx) * fy),
        (frame.get_pixel_unchecked(x1, y1), fx * fy),
    ];
    blend(&taps).unwrap_or(nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_coord_reflect() {
        // cba|abc|cba for n = 3
        let got: Vec<u32> = (-3..6).map(|i| edge_coord(i, 3, EdgeMode::Reflect)).collect();
        assert_eq!(got, vec![2, 1, 0, 0, 1, 2, 2, 1, 0]);
        assert_eq!(edge_coord(-5, 1, EdgeMode::Reflect), 0);
    }

    #[test]
    fn test_edge_coord_replicate() {
        assert_eq!(edge_coord(-4, 5, EdgeMode::Replicate), 0);
        assert_eq!(edge_coord(9, 5, EdgeMode::Replicate), 4);
        assert_eq!(edge_coord(3, 5, EdgeMode::Replicate), 3);
    }

    #[test]
    fn test_cubic_weights_integer() {
        assert_eq!(cubic_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cubic_weights_sum_to_one() {
        for k in 1..10 {
            let w = cubic_weights(k as f32 / 10.0);
            assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
        let w = cubic_weights(0.5);
        assert!((w[1] - w[2]).abs() < 1e-6);
        assert!((w[0] - w[3]).abs() < 1e-6);
    }

    #[test]
    fn test_sample_row_constant() {
        let row = vec![color::compose_rgb(40, 50, 60); 8];
        for k in 0..20 {
            let x = -1.5 + k as f32 * 0.5;
            assert_eq!(
                sample_cubic_row(&row, x, EdgeMode::Reflect),
                color::compose_rgb(40, 50, 60)
            );
        }
    }

    #[test]
    fn test_sample_row_nearest_hole() {
        let mut row = vec![color::compose_rgb(10, 10, 10); 5];
        row[2] = color::HOLE_PIXEL;
        assert_eq!(
            sample_cubic_row(&row, 2.2, EdgeMode::Replicate),
            color::HOLE_PIXEL
        );
        // Hole tap nearby but not nearest: renormalized, still valid
        assert_eq!(
            sample_cubic_row(&row, 3.2, EdgeMode::Replicate),
            color::compose_rgb(10, 10, 10)
        );
    }

    #[test]
    fn test_sample_row_midpoint() {
        let row: Vec<u32> = (0..6).map(|i| color::compose_rgb(i * 40, 0, 0)).collect();
        // Linear ramps are reproduced exactly by the Keys kernel
        let p = sample_cubic_row(&row, 2.5, EdgeMode::Replicate);
        assert_eq!(color::red(p), 100);
    }

    #[test]
    fn test_sample_bilinear_center() {
        let mut m = Frame::new_filled(0, 2, 2, color::compose_rgb(0, 0, 0))
            .unwrap()
            .to_mut();
        m.set_rgb(1, 1, 200, 200, 200).unwrap();
        let f: Frame = m.into();
        let p = sample_bilinear(&f, 0.5, 0.5);
        assert_eq!(color::extract_rgb(p), (50, 50, 50));
    }
}
