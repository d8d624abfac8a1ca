//! Plane convolution
//!
//! Direct convolution of `f32` planes with a [`Kernel`], and the separable
//! Gaussian used to smooth disparity fields.

use crate::kernel::Kernel;
use crate::FilterResult;
use vrstereo_core::Plane;

/// Kernel size of the disparity smoothing Gaussian
pub const DISPARITY_BLUR_SIZE: u32 = 5;

/// Map an out-of-range coordinate back into `[0, n)` by mirroring without
/// repeating the edge: `dcb|abcd|cba`
#[inline]
pub fn border_coord(i: i32, n: i32) -> i32 {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    if m < n { m } else { period - m }
}

/// Convolve a plane with a kernel, reflect-101 borders
pub fn plane_convolve(plane: &Plane, kernel: &Kernel) -> FilterResult<Plane> {
    let w = plane.width() as i32;
    let h = plane.height() as i32;
    let kw = kernel.width() as i32;
    let kh = kernel.height() as i32;
    let cx = kernel.center_x() as i32;
    let cy = kernel.center_y() as i32;

    let mut out = Plane::new(w as u32, h as u32)?;
    let kdata = kernel.data();

    for y in 0..h {
        for x in 0..w {
            let mut sum = 0.0f32;
            for ky in 0..kh {
                let sy = border_coord(y + ky - cy, h);
                for kx in 0..kw {
                    let sx = border_coord(x + kx - cx, w);
                    let val = plane.get_pixel_unchecked(sx as u32, sy as u32);
                    sum += val * kdata[(ky * kw + kx) as usize];
                }
            }
            out.set_pixel_unchecked(x as u32, y as u32, sum);
        }
    }

    Ok(out)
}

/// Convolve with a horizontal kernel, then a vertical one
pub fn plane_convolve_sep(plane: &Plane, kernel_x: &Kernel, kernel_y: &Kernel) -> FilterResult<Plane> {
    let tmp = plane_convolve(plane, kernel_x)?;
    plane_convolve(&tmp, kernel_y)
}

/// Separable Gaussian blur with reflect-101 borders
///
/// # Arguments
///
/// * `plane` - Input plane
/// * `size` - Odd kernel size, used on both axes
/// * `sigma` - Standard deviation; `<= 0` derives it from `size`
pub fn gaussian_blur(plane: &Plane, size: u32, sigma: f32) -> FilterResult<Plane> {
    let kx = Kernel::gaussian_1d(size, sigma)?;
    let ky = kx.transpose();
    plane_convolve_sep(plane, &kx, &ky)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_coord_reflect101() {
        // dcb|abcd|cba for n = 4
        let got: Vec<i32> = (-3..7).map(|i| border_coord(i, 4)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);
        assert_eq!(border_coord(-2, 1), 0);
    }

    #[test]
    fn test_constant_plane_unchanged() {
        let p = Plane::new_with_value(7, 5, 2.5).unwrap();
        let out = gaussian_blur(&p, 5, 0.0).unwrap();
        for &v in out.data() {
            assert!((v - 2.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_zero_plane_stays_zero() {
        let p = Plane::new(6, 6).unwrap();
        let out = gaussian_blur(&p, 5, 0.0).unwrap();
        assert!(out.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_impulse_spreads_symmetrically() {
        let mut p = Plane::new(9, 9).unwrap();
        p.set_pixel(4, 4, 1.0).unwrap();
        let out = gaussian_blur(&p, 5, 0.0).unwrap();
        let total: f32 = out.data().iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        let l = out.get_pixel(3, 4).unwrap();
        let r = out.get_pixel(5, 4).unwrap();
        let u = out.get_pixel(4, 3).unwrap();
        assert!((l - r).abs() < 1e-7 && (l - u).abs() < 1e-7);
        assert_eq!(out.get_pixel(4, 7).unwrap(), 0.0);
    }

    #[test]
    fn test_ramp_edge_uses_binomial_weights() {
        // Reflect-101 at x = 0 folds taps -2, -1 onto 2, 1
        let data: Vec<f32> = (0..10).map(|x| x as f32).collect();
        let p = Plane::from_data(10, 1, data).unwrap();
        let out = gaussian_blur(&p, 5, 0.0).unwrap();
        let expected = 0.125 * 2.0 + 0.5 * 1.0;
        assert!((out.get_pixel(0, 0).unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_linear_ramp_preserved_in_interior() {
        let data: Vec<f32> = (0..10).map(|x| x as f32).collect();
        let p = Plane::from_data(10, 1, data).unwrap();
        let out = gaussian_blur(&p, 5, 0.0).unwrap();
        for x in 2..8 {
            assert!((out.get_pixel(x, 0).unwrap() - x as f32).abs() < 1e-4);
        }
    }
}
