//! Per-job working directories
//!
//! Every job gets a fresh directory named after its job id, so jobs running
//! side by side never share files. The directory is removed when the
//! [`JobWorkspace`] is dropped unless it was asked to be kept.

use crate::JobResult;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh 8-hex-digit job id
pub fn new_job_id() -> String {
    let mut h = RandomState::new().build_hasher();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    h.write_u128(nanos);
    h.write_u32(std::process::id());
    h.write_u64(JOB_COUNTER.fetch_add(1, Ordering::Relaxed));
    format!("{:08x}", h.finish() as u32)
}

/// Scratch directory tree of one job
#[derive(Debug)]
pub struct JobWorkspace {
    id: String,
    root: PathBuf,
    keep: bool,
}

impl JobWorkspace {
    /// Create `<parent>/vrstereo_job_<id>` with its subdirectories
    ///
    /// `parent` defaults to the system temp directory.
    pub fn create(parent: Option<&Path>, keep: bool) -> JobResult<Self> {
        let parent = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
        std::fs::create_dir_all(&parent)?;
        loop {
            let id = new_job_id();
            let root = parent.join(format!("vrstereo_job_{}", id));
            match std::fs::create_dir(&root) {
                Ok(()) => {
                    let ws = JobWorkspace { id, root, keep };
                    for dir in [ws.frames_dir(), ws.left_dir(), ws.right_dir(), ws.canvas_dir()] {
                        std::fs::create_dir(dir)?;
                    }
                    debug!(root = %ws.root.display(), "created job workspace");
                    return Ok(ws);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Job id, also used in output file names
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracted source frames
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("frames")
    }

    /// Left eye frames
    pub fn left_dir(&self) -> PathBuf {
        self.root.join("left")
    }

    /// Right eye frames
    pub fn right_dir(&self) -> PathBuf {
        self.root.join("right")
    }

    /// VR180 canvases
    pub fn canvas_dir(&self) -> PathBuf {
        self.root.join("vr180")
    }

    /// Whether the tree survives the workspace
    pub fn is_kept(&self) -> bool {
        self.keep
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            warn!(root = %self.root.display(), error = %e, "failed to remove job workspace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids() {
        let a = new_job_id();
        let b = new_job_id();
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_workspaces_are_distinct_and_removed() {
        let parent = std::env::temp_dir().join(format!("vrstereo-ws-{}", std::process::id()));
        let a = JobWorkspace::create(Some(&parent), false).unwrap();
        let b = JobWorkspace::create(Some(&parent), false).unwrap();
        assert_ne!(a.root(), b.root());
        assert!(a.left_dir().is_dir() && a.frames_dir().is_dir() && a.canvas_dir().is_dir());
        let root = a.root().to_path_buf();
        drop(a);
        assert!(!root.exists());

        let kept = JobWorkspace::create(Some(&parent), true).unwrap();
        let root = kept.root().to_path_buf();
        drop(kept);
        assert!(root.is_dir());
        drop(b);
        let _ = std::fs::remove_dir_all(&parent);
    }
}
