//! vrstereo-transform - Geometric transformations for vrstereo
//!
//! This crate provides:
//!
//! - Sub-pixel sampling (Keys bicubic, bilinear) with hole-aware blending
//! - Horizontal remapping by column map or per-pixel offset
//! - The curved-screen pre-warp
//! - Scaling (area mapping, bilinear)
//! - Side-by-side / top-bottom composition

mod error;
pub mod compose;
pub mod curvature;
pub mod remap;
pub mod sample;
pub mod scale;

pub use compose::{canvas, hconcat, vconcat};
pub use curvature::{
    FLAT_EPSILON, MAX_CURVATURE, curvature_columns, curvature_is_monotonic, curvature_warp,
    validate_curvature,
};
pub use error::{TransformError, TransformResult};
pub use remap::{OutsidePolicy, remap_columns, remap_offsets};
pub use sample::{EdgeMode, cubic_weights, edge_coord, sample_bilinear, sample_cubic_row};
pub use scale::{ScaleMethod, scale, scale_to_size};
