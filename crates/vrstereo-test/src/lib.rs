//! vrstereo-test - Regression test framework for vrstereo
//!
//! Provides [`RegParams`], which collects every check of a regression test
//! and reports all failures at the end, plus deterministic synthetic
//! fixtures in [`fixtures`].
//!
//! # Usage
//!
//! ```ignore
//! use vrstereo_test::RegParams;
//!
//! let mut rp = RegParams::new("curvature");
//! rp.compare_values(64.0, warped.width() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "display" to write inspection PNGs into
//!   `tests/regout` at the workspace root

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // vrstereo-test is at crates/vrstereo-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
