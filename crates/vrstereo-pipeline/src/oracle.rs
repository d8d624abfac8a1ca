//! Depth oracle seam
//!
//! A [`DepthOracle`] turns a frame into a normalized [`DepthMap`]. Oracles
//! declare whether they may be called from several threads at once; the
//! [`OracleGate`] serializes the ones that may not, and checks that every
//! returned map matches its frame.

use crate::{JobError, JobResult, OracleError, Stage, Violation};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use vrstereo_core::{DepthMap, Frame, Plane};
use vrstereo_io::frame_file_name;

/// Whether an oracle tolerates concurrent calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reentrancy {
    /// Any number of concurrent `estimate` calls are fine
    Reentrant,
    /// Calls must not overlap
    #[default]
    Serialized,
}

/// Per-frame depth estimator
pub trait DepthOracle: Send + Sync {
    /// Estimate normalized depth for `frame`, same size as the frame
    fn estimate(&self, frame: &Frame) -> Result<DepthMap, OracleError>;

    /// Concurrency capability of this oracle
    fn reentrancy(&self) -> Reentrancy {
        Reentrancy::Serialized
    }

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Normalize a raw estimate the way every bundled oracle does
///
/// Per-frame min-max normalization; consecutive frames are scaled
/// independently.
pub fn normalize_raw(raw: &Plane, invert: bool) -> Result<DepthMap, OracleError> {
    DepthMap::normalize_min_max(raw, invert).map_err(|e| OracleError::Output(e.to_string()))
}

/// Funnels calls into an oracle according to its [`Reentrancy`]
pub struct OracleGate {
    oracle: Arc<dyn DepthOracle>,
    lock: Mutex<()>,
}

impl OracleGate {
    pub fn new(oracle: Arc<dyn DepthOracle>) -> Self {
        OracleGate {
            oracle,
            lock: Mutex::new(()),
        }
    }

    /// Name of the wrapped oracle
    pub fn name(&self) -> &str {
        self.oracle.name()
    }

    /// Estimate depth for `frame`
    ///
    /// # Errors
    ///
    /// - [`JobError::Collaborator`] if the oracle fails
    /// - [`JobError::Contract`] with [`Violation::DimensionMismatch`] if the
    ///   map does not match the frame
    pub fn estimate(&self, frame: &Frame) -> JobResult<DepthMap> {
        let depth = match self.oracle.reentrancy() {
            Reentrancy::Reentrant => self.oracle.estimate(frame),
            Reentrancy::Serialized => {
                let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
                self.oracle.estimate(frame)
            }
        }
        .map_err(JobError::from_oracle)?;

        if depth.dimensions() != frame.dimensions() {
            return Err(JobError::contract(
                Stage::Depth,
                Violation::DimensionMismatch {
                    what: format!("depth map of frame {}", frame.index()),
                    expected: frame.dimensions(),
                    actual: depth.dimensions(),
                },
            ));
        }
        Ok(depth)
    }
}

static EXCHANGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Input/output file pair of one estimator call, removed on drop
struct ExchangeFiles {
    input: PathBuf,
    output: PathBuf,
}

impl ExchangeFiles {
    /// Paths no other call, in this process or another, will use
    fn new(scratch: &Path, index: u32) -> Self {
        let call = EXCHANGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tag = format!("{}_{}_{}", std::process::id(), call, frame_file_name(index));
        ExchangeFiles {
            input: scratch.join(format!("in_{}", tag)),
            output: scratch.join(format!("depth_{}", tag)),
        }
    }
}

impl Drop for ExchangeFiles {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove exchange file"),
            }
        }
    }
}

/// Runs an external estimator once per frame
///
/// The program is invoked as `<program> <args...> <input.png> <output.png>`
/// and must write an 8- or 16-bit grayscale PNG of the input's size.
/// Every call gets its own pair of exchange files, so concurrent calls
/// never read each other's results; both files are removed whether the
/// call succeeds or not.
#[derive(Debug, Clone)]
pub struct CommandDepthOracle {
    program: PathBuf,
    args: Vec<String>,
    scratch: PathBuf,
    invert: bool,
    reentrancy: Reentrancy,
}

impl CommandDepthOracle {
    /// Create an oracle writing its exchange files under `scratch`
    pub fn new(program: impl Into<PathBuf>, scratch: impl Into<PathBuf>) -> Self {
        CommandDepthOracle {
            program: program.into(),
            args: Vec::new(),
            scratch: scratch.into(),
            invert: false,
            reentrancy: Reentrancy::Serialized,
        }
    }

    /// Extra arguments placed before the file paths
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Flip the normalized output (`1 - d`) for estimators where larger is farther
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Declare the program safe to run concurrently
    pub fn with_reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.reentrancy = reentrancy;
        self
    }
}

impl DepthOracle for CommandDepthOracle {
    fn estimate(&self, frame: &Frame) -> Result<DepthMap, OracleError> {
        std::fs::create_dir_all(&self.scratch).map_err(|e| OracleError::Input(e.to_string()))?;
        let files = ExchangeFiles::new(&self.scratch, frame.index());
        vrstereo_io::write_png(frame, &files.input)
            .map_err(|e| OracleError::Input(e.to_string()))?;

        debug!(program = %self.program.display(), frame = frame.index(), "running depth estimator");
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg(&files.input)
            .arg(&files.output)
            .output()
            .map_err(|e| OracleError::Failed(format!("{}: {}", self.program.display(), e)))?;
        if !out.status.success() {
            return Err(OracleError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let raw = vrstereo_io::read_gray_png(&files.output)
            .map_err(|e| OracleError::Output(e.to_string()))?;
        drop(files);
        normalize_raw(&raw, self.invert)
    }

    fn reentrancy(&self) -> Reentrancy {
        self.reentrancy
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Reads precomputed depth images `<dir>/<index:06>.png`
#[derive(Debug, Clone)]
pub struct DirectoryDepthOracle {
    dir: PathBuf,
    invert: bool,
}

impl DirectoryDepthOracle {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryDepthOracle {
            dir: dir.into(),
            invert: false,
        }
    }

    /// Flip the normalized values (`1 - d`)
    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }
}

impl DepthOracle for DirectoryDepthOracle {
    fn estimate(&self, frame: &Frame) -> Result<DepthMap, OracleError> {
        let path = self.dir.join(frame_file_name(frame.index()));
        if !path.is_file() {
            return Err(OracleError::Input(format!("{} not found", path.display())));
        }
        let raw = vrstereo_io::read_gray_png(&path).map_err(|e| OracleError::Output(e.to_string()))?;
        normalize_raw(&raw, self.invert)
    }

    fn reentrancy(&self) -> Reentrancy {
        Reentrancy::Reentrant
    }

    fn name(&self) -> &str {
        "directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrstereo_core::color;

    struct Fixed {
        size: (u32, u32),
    }

    impl DepthOracle for Fixed {
        fn estimate(&self, _frame: &Frame) -> Result<DepthMap, OracleError> {
            DepthMap::constant(self.size.0, self.size.1, 0.5)
                .map_err(|e| OracleError::Failed(e.to_string()))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_gate_checks_dimensions() {
        let frame = Frame::new_filled(2, 8, 4, color::BLACK).unwrap();
        let gate = OracleGate::new(Arc::new(Fixed { size: (8, 4) }));
        assert!(gate.estimate(&frame).is_ok());
        let gate = OracleGate::new(Arc::new(Fixed { size: (7, 4) }));
        let err = gate.estimate(&frame).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Depth));
        assert!(matches!(
            err.violation(),
            Some(Violation::DimensionMismatch { actual: (7, 4), .. })
        ));
    }

    #[test]
    fn test_default_reentrancy_is_serialized() {
        assert_eq!(Fixed { size: (1, 1) }.reentrancy(), Reentrancy::Serialized);
    }

    #[test]
    fn test_normalize_raw() {
        let raw = Plane::from_data(3, 1, vec![10.0, 20.0, 30.0]).unwrap();
        let d = normalize_raw(&raw, false).unwrap();
        assert!(d.get(0, 0).unwrap().abs() < 1e-6);
        assert!((d.get(2, 0).unwrap() - 1.0).abs() < 1e-6);
        let d = normalize_raw(&raw, true).unwrap();
        assert!((d.get(0, 0).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_exchange_files_are_unique_and_removed() {
        let dir = std::env::temp_dir().join(format!("vrstereo-exchange-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let a = ExchangeFiles::new(&dir, 0);
        let b = ExchangeFiles::new(&dir, 0);
        assert_ne!(a.input, b.input);
        assert_ne!(a.output, b.output);
        std::fs::write(&a.input, b"x").unwrap();
        std::fs::write(&a.output, b"y").unwrap();
        drop(a);
        drop(b);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_command_missing_program_leaves_nothing() {
        let dir = std::env::temp_dir().join(format!("vrstereo-cmd-missing-{}", std::process::id()));
        let oracle = CommandDepthOracle::new("/nonexistent/depth-estimator", &dir);
        let frame = Frame::new_filled(0, 2, 2, color::BLACK).unwrap();
        assert!(matches!(oracle.estimate(&frame), Err(OracleError::Failed(_))));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_directory_missing_file() {
        let oracle = DirectoryDepthOracle::new("/nonexistent/vrstereo-depth");
        let frame = Frame::new_filled(0, 2, 2, color::BLACK).unwrap();
        assert!(matches!(oracle.estimate(&frame), Err(OracleError::Input(_))));
    }
}
