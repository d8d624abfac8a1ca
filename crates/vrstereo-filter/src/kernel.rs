//! Convolution kernels

use crate::{FilterError, FilterResult};

/// Fixed binomial Gaussians for sizes 1, 3, 5 and 7, used when no sigma is
/// given. These match the tables of the common image libraries, which do not
/// sample the continuous Gaussian for small kernels.
const SMALL_GAUSSIANS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
    ],
];

/// A 2D convolution kernel
///
/// The center is at `(width / 2, height / 2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Width of the kernel
    width: u32,
    /// Height of the kernel
    height: u32,
    /// X coordinate of the center
    cx: u32,
    /// Y coordinate of the center
    cy: u32,
    /// Kernel data (row-major order)
    data: Vec<f32>,
}

impl Kernel {
    /// Create a zero kernel with the given dimensions.
    pub fn new(width: u32, height: u32) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel size {}x{}",
                width, height
            )));
        }
        Ok(Kernel {
            width,
            height,
            cx: width / 2,
            cy: height / 2,
            data: vec![0.0; (width * height) as usize],
        })
    }

    /// Create a kernel from a slice of values in row-major order.
    pub fn from_slice(width: u32, height: u32, data: &[f32]) -> FilterResult<Self> {
        let mut k = Self::new(width, height)?;
        if data.len() != k.data.len() {
            return Err(FilterError::InvalidKernel(format!(
                "{} values for a {}x{} kernel",
                data.len(),
                width,
                height
            )));
        }
        k.data.copy_from_slice(data);
        Ok(k)
    }

    /// Sigma used for a Gaussian of odd `size` when none is given:
    /// `0.3 * ((size - 1) / 2 - 1) + 0.8`.
    pub fn default_sigma(size: u32) -> f32 {
        0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    /// Create a horizontal 1D Gaussian kernel (`size` x 1), normalized.
    ///
    /// # Arguments
    ///
    /// * `size` - Odd kernel length
    /// * `sigma` - Standard deviation; `<= 0` selects the fixed binomial
    ///   table for sizes up to 7, and [`Kernel::default_sigma`] above that
    pub fn gaussian_1d(size: u32, sigma: f32) -> FilterResult<Self> {
        if size % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "Gaussian size {} must be odd",
                size
            )));
        }
        if !sigma.is_finite() {
            return Err(FilterError::InvalidParameters(format!("sigma {}", sigma)));
        }
        if sigma <= 0.0 {
            if let Some(table) = SMALL_GAUSSIANS.get((size / 2) as usize) {
                return Self::from_slice(size, 1, table);
            }
        }
        let sigma = if sigma <= 0.0 {
            Self::default_sigma(size)
        } else {
            sigma
        };
        let half = (size / 2) as i32;
        let denom = 2.0 * sigma * sigma;
        let mut data: Vec<f32> = (-half..=half)
            .map(|i| (-((i * i) as f32) / denom).exp())
            .collect();
        let sum: f32 = data.iter().sum();
        data.iter_mut().for_each(|v| *v /= sum);
        Self::from_slice(size, 1, &data)
    }

    /// Swap rows and columns; the center moves with the data.
    pub fn transpose(&self) -> Self {
        let mut data = vec![0.0; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                data[(x * self.height + y) as usize] = self.data[(y * self.width + x) as usize];
            }
        }
        Kernel {
            width: self.height,
            height: self.width,
            cx: self.cy,
            cy: self.cx,
            data,
        }
    }

    /// Get the kernel width
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the kernel height
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the center x coordinate
    #[inline]
    pub fn center_x(&self) -> u32 {
        self.cx
    }

    /// Get the center y coordinate
    #[inline]
    pub fn center_y(&self) -> u32 {
        self.cy
    }

    /// Get kernel data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sum of all values
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}
