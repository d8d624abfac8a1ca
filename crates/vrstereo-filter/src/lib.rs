//! vrstereo-filter - Filtering operations for vrstereo
//!
//! - [`Kernel`]: 2D convolution kernels, including normalized Gaussians
//! - [`plane_convolve`] / [`plane_convolve_sep`]: direct convolution of
//!   float planes with reflect-101 borders
//! - [`gaussian_blur`]: the separable smoothing used on disparity fields

pub mod convolve;
mod error;
pub mod kernel;

pub use convolve::{
    DISPARITY_BLUR_SIZE, border_coord, gaussian_blur, plane_convolve, plane_convolve_sep,
};
pub use error::{FilterError, FilterResult};
pub use kernel::Kernel;
