//! vrstereo-region - Region operations for vrstereo
//!
//! - [`inpaint`]: fills holes in eye images by fast-marching inpainting

mod error;
pub mod inpaint;

pub use error::{RegionError, RegionResult};
pub use inpaint::inpaint_telea;
