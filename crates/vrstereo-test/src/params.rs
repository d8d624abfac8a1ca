//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::regout_dir;
use std::fs;
use vrstereo_core::{Frame, Plane};

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Check values only (default)
    #[default]
    Compare,
    /// Also write inspection images to the regout directory
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the test name, the running check index, the mode and every
/// failure seen so far. A test runs all of its checks and asserts on
/// [`RegParams::cleanup`] at the end, so one run reports every failure.
pub struct RegParams {
    /// Name of the test (e.g., "curvature")
    pub test_name: String,
    /// Current check index (incremented before each check)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "curvature")
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        if mode == RegTestMode::Display {
            let _ = fs::create_dir_all(regout_dir());
        }

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current check index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// # Returns
    ///
    /// `true` if values match within `delta`, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta || diff.is_nan() {
            self.fail(format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            ));
            false
        } else {
            true
        }
    }

    /// Record a boolean condition
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if !condition {
            self.fail(format!(
                "Failure in {}_reg: check for index {} - {}",
                self.test_name, self.index, what
            ));
        }
        condition
    }

    /// Compare two frames for exact equality of every pixel word
    ///
    /// Validity is part of the comparison; sequence indices are not.
    pub fn compare_frames(&mut self, frame1: &Frame, frame2: &Frame) -> bool {
        self.compare_frames_within(frame1, frame2, 0)
    }

    /// Compare two frames allowing each color channel to differ by `delta`
    ///
    /// Validity must match exactly.
    pub fn compare_frames_within(&mut self, frame1: &Frame, frame2: &Frame, delta: u8) -> bool {
        self.index += 1;

        if !frame1.sizes_equal(frame2) {
            self.fail(format!(
                "Failure in {}_reg: frame comparison for index {} - dimension mismatch \
                 {:?} vs {:?}",
                self.test_name,
                self.index,
                frame1.dimensions(),
                frame2.dimensions()
            ));
            return false;
        }

        let width = frame1.width();
        for (i, (&p1, &p2)) in frame1.data().iter().zip(frame2.data()).enumerate() {
            let (r1, g1, b1, a1) = vrstereo_core::color::extract_rgba(p1);
            let (r2, g2, b2, a2) = vrstereo_core::color::extract_rgba(p2);
            let close = r1.abs_diff(r2) <= delta
                && g1.abs_diff(g2) <= delta
                && b1.abs_diff(b2) <= delta
                && a1 == a2;
            if !close {
                let x = i as u32 % width;
                let y = i as u32 / width;
                self.fail(format!(
                    "Failure in {}_reg: frame comparison for index {} - pixel mismatch at \
                     ({}, {}): {:#010x} vs {:#010x}",
                    self.test_name, self.index, x, y, p1, p2
                ));
                return false;
            }
        }

        true
    }

    /// Write a frame as PNG into the regout directory (display mode only)
    ///
    /// # Errors
    ///
    /// Returns [`TestError::ImageWrite`] if encoding fails.
    pub fn write_frame(&mut self, frame: &Frame, label: &str) -> TestResult<()> {
        if !self.display() {
            return Ok(());
        }
        let path = format!("{}/{}.{}.png", regout_dir(), self.test_name, label);
        vrstereo_io::write_png(frame, &path).map_err(|e| TestError::ImageWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;
        eprintln!("Wrote: {}", path);
        Ok(())
    }

    /// Write a `[0, 1]` plane as 8-bit grayscale PNG (display mode only)
    pub fn write_plane(&mut self, plane: &Plane, label: &str) -> TestResult<()> {
        if !self.display() {
            return Ok(());
        }
        let path = format!("{}/{}.{}.png", regout_dir(), self.test_name, label);
        vrstereo_io::write_gray_png(plane, &path).map_err(|e| TestError::ImageWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;
        eprintln!("Wrote: {}", path);
        Ok(())
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all checks passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all checks have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
