//! Job configuration
//!
//! [`JobConfig`] can be loaded from a JSON file; missing fields take their
//! defaults. [`JobConfig::validate`] rejects out-of-domain values before a
//! job touches any file.

use crate::{JobError, JobResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vrstereo_stereo::{
    DEFAULT_BASELINE, DEFAULT_CANVAS_HEIGHT, DEFAULT_CURVATURE, DEFAULT_INPAINT_RADIUS,
    StereoParams,
};
use vrstereo_transform::{MAX_CURVATURE, curvature_is_monotonic};

/// Smallest accepted processing height
pub const MIN_TARGET_HEIGHT: u32 = 16;
/// Largest accepted processing height
pub const MAX_TARGET_HEIGHT: u32 = 4320;
/// Largest accepted inpainting radius
pub const MAX_INPAINT_RADIUS: u32 = 32;
/// Largest accepted VR180 canvas height
pub const MAX_CANVAS_HEIGHT: u32 = 8640;
/// Largest number of preview frames
pub const MAX_PREVIEW_FRAMES: usize = 40;

/// Parameters of one conversion job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Processing height in pixels; width follows the source aspect
    pub target_height: u32,
    /// Output frame rate; 0 keeps the source rate
    pub fps_override: f64,
    /// Disparity magnitude scale in pixels
    pub stereo_baseline: f32,
    /// Screen bend strength in `[0, 0.6]`
    pub curvature: f32,
    /// Hole filling radius; 0 disables filling
    pub inpaint_radius: u32,
    /// Also produce the 2:1 top/bottom VR180 stream
    pub enable_vr180: bool,
    /// Height of the VR180 canvas, even
    pub vr180_canvas_height: u32,
    /// Directory receiving the finished videos
    pub output_dir: PathBuf,
    /// Frames in the GIF preview; 0 disables the preview
    pub preview_frames: usize,
    /// Worker threads; `None` uses all cores
    pub workers: Option<usize>,
    /// Keep the per-job working directory after the job
    pub keep_workdir: bool,
    /// Parent of per-job working directories; `None` uses the system temp dir
    pub work_root: Option<PathBuf>,
}

impl Default for JobConfig {
    fn default() -> Self {
        JobConfig {
            target_height: 720,
            fps_override: 0.0,
            stereo_baseline: DEFAULT_BASELINE,
            curvature: DEFAULT_CURVATURE,
            inpaint_radius: DEFAULT_INPAINT_RADIUS,
            enable_vr180: true,
            vr180_canvas_height: DEFAULT_CANVAS_HEIGHT,
            output_dir: PathBuf::from("outputs"),
            preview_frames: 40,
            workers: None,
            keep_workdir: false,
            work_root: None,
        }
    }
}

impl JobConfig {
    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Io`] if the file cannot be read and
    /// [`JobError::ConfigFile`] if it is not valid JSON for this type.
    pub fn from_file<P: AsRef<Path>>(path: P) -> JobResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> JobResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> JobResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Validation`] naming the first rejected field.
    pub fn validate(&self) -> JobResult<()> {
        let h = self.target_height;
        if !(MIN_TARGET_HEIGHT..=MAX_TARGET_HEIGHT).contains(&h) || h % 2 != 0 {
            return Err(JobError::validation(
                "target_height",
                format!(
                    "{} must be even and in [{}, {}]",
                    h, MIN_TARGET_HEIGHT, MAX_TARGET_HEIGHT
                ),
            ));
        }
        if !self.fps_override.is_finite() || self.fps_override < 0.0 {
            return Err(JobError::validation(
                "fps_override",
                format!("{} must be a finite value >= 0", self.fps_override),
            ));
        }
        if !self.stereo_baseline.is_finite() || self.stereo_baseline < 0.0 {
            return Err(JobError::validation(
                "stereo_baseline",
                format!("{} must be a finite value >= 0", self.stereo_baseline),
            ));
        }
        if !self.curvature.is_finite() || !(0.0..=MAX_CURVATURE).contains(&self.curvature) {
            return Err(JobError::validation(
                "curvature",
                format!("{} outside [0, {}]", self.curvature, MAX_CURVATURE),
            ));
        }
        if self.inpaint_radius > MAX_INPAINT_RADIUS {
            return Err(JobError::validation(
                "inpaint_radius",
                format!("{} exceeds {}", self.inpaint_radius, MAX_INPAINT_RADIUS),
            ));
        }
        let ch = self.vr180_canvas_height;
        if ch == 0 || ch % 2 != 0 || ch > MAX_CANVAS_HEIGHT {
            return Err(JobError::validation(
                "vr180_canvas_height",
                format!("{} must be even and in [2, {}]", ch, MAX_CANVAS_HEIGHT),
            ));
        }
        if self.preview_frames > MAX_PREVIEW_FRAMES {
            return Err(JobError::validation(
                "preview_frames",
                format!("{} exceeds {}", self.preview_frames, MAX_PREVIEW_FRAMES),
            ));
        }
        if self.workers == Some(0) {
            return Err(JobError::validation("workers", "must be at least 1"));
        }
        Ok(())
    }

    /// Synthesis parameters of this job
    pub fn stereo_params(&self) -> StereoParams {
        StereoParams {
            baseline: self.stereo_baseline,
            curvature: self.curvature,
            inpaint_radius: self.inpaint_radius,
        }
    }

    /// The source frame rate override, if any
    pub fn fps(&self) -> Option<f64> {
        (self.fps_override > 0.0).then_some(self.fps_override)
    }

    /// True if the curvature bends the screen without folding it
    pub fn curvature_is_monotonic(&self) -> bool {
        curvature_is_monotonic(self.curvature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = JobConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.target_height, 720);
        assert_eq!(cfg.vr180_canvas_height, 1440);
        assert_eq!(cfg.preview_frames, 40);
        assert_eq!(cfg.fps(), None);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let bad = [
            JobConfig { curvature: 0.7, ..Default::default() },
            JobConfig { curvature: f32::NAN, ..Default::default() },
            JobConfig { stereo_baseline: -1.0, ..Default::default() },
            JobConfig { target_height: 721, ..Default::default() },
            JobConfig { target_height: 0, ..Default::default() },
            JobConfig { vr180_canvas_height: 1441, ..Default::default() },
            JobConfig { fps_override: -3.0, ..Default::default() },
            JobConfig { inpaint_radius: 100, ..Default::default() },
            JobConfig { workers: Some(0), ..Default::default() },
            JobConfig { preview_frames: 41, ..Default::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(JobError::Validation { .. })), "{:?}", cfg);
        }
    }

    #[test]
    fn test_error_names_field() {
        let cfg = JobConfig { curvature: 0.9, ..Default::default() };
        match cfg.validate() {
            Err(JobError::Validation { param, .. }) => assert_eq!(param, "curvature"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = JobConfig::from_json(r#"{ "curvature": 0.1, "enable_vr180": false }"#).unwrap();
        assert_eq!(cfg.curvature, 0.1);
        assert!(!cfg.enable_vr180);
        assert_eq!(cfg.target_height, 720);
        let back = JobConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_preview_frames_cap() {
        let cfg = JobConfig { preview_frames: MAX_PREVIEW_FRAMES, ..Default::default() };
        assert!(cfg.validate().is_ok());
        let cfg = JobConfig { preview_frames: 100, ..Default::default() };
        match cfg.validate() {
            Err(JobError::Validation { param, .. }) => assert_eq!(param, "preview_frames"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fps_override() {
        let cfg = JobConfig { fps_override: 30.0, ..Default::default() };
        assert_eq!(cfg.fps(), Some(30.0));
    }
}
