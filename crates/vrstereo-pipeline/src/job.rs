//! Conversion jobs
//!
//! A job runs the stages in order:
//!
//! 1. Validate the configuration
//! 2. Extract frames from the source video
//! 3. Per frame, in parallel: load the frame, estimate depth, synthesize
//!    the eye pair, optionally pack the VR180 canvas, and store the results
//!    as image sequences
//! 4. Encode the side-by-side, top-bottom and (optionally) VR180 videos
//! 5. Write the GIF preview
//!
//! Any fatal error aborts the whole job and removes the output files
//! created so far. There is no retry and no resume.

use crate::config::JobConfig;
use crate::oracle::{DepthOracle, OracleGate};
use crate::schedule::{CancelToken, FramePool};
use crate::video::{FrameAssembler, FrameExtractor, Layout};
use crate::workspace::JobWorkspace;
use crate::{JobError, JobResult, Stage, Violation, preview};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use vrstereo_core::Frame;
use vrstereo_io::{FrameSequence, frame_file_name, write_png};
use vrstereo_stereo::{Eye, HoleStats, StereoParams, Vr180Packer, synthesize};

/// Hole counts summed over all frames and both eyes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HoleTotals {
    pub found: usize,
    pub unfilled: usize,
}

impl HoleTotals {
    fn add(&mut self, s: HoleStats) {
        self.found += s.found;
        self.unfilled += s.unfilled;
    }
}

/// Everything one frame produces
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub left: Frame,
    pub right: Frame,
    pub canvas: Option<Frame>,
    pub holes: HoleTotals,
}

/// Directories receiving the per-frame results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDirs {
    pub left: PathBuf,
    pub right: PathBuf,
    pub canvas: PathBuf,
}

impl SequenceDirs {
    /// The eye and canvas directories of a job workspace
    pub fn in_workspace(ws: &JobWorkspace) -> Self {
        SequenceDirs {
            left: ws.left_dir(),
            right: ws.right_dir(),
            canvas: ws.canvas_dir(),
        }
    }
}

/// All frames of a job, stored as sequences on disk
#[derive(Debug, Clone)]
pub struct Processed {
    pub left: FrameSequence,
    pub right: FrameSequence,
    /// VR180 canvases, when packing is enabled
    pub canvases: Option<FrameSequence>,
    pub holes: HoleTotals,
}

impl Processed {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Per-frame depth, synthesis and packing
pub struct FrameProcessor {
    params: StereoParams,
    packer: Option<Vr180Packer>,
    gate: OracleGate,
}

impl FrameProcessor {
    /// Create a processor; `packer` of `None` skips VR180 packing
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Validation`] for bad synthesis parameters.
    pub fn new(
        params: StereoParams,
        packer: Option<Vr180Packer>,
        oracle: Arc<dyn DepthOracle>,
    ) -> JobResult<Self> {
        params
            .validate()
            .map_err(|e| JobError::from_stereo(Stage::Synthesize, e))?;
        Ok(FrameProcessor {
            params,
            packer,
            gate: OracleGate::new(oracle),
        })
    }

    /// Process one frame
    pub fn process(&self, frame: &Frame) -> JobResult<FrameOutput> {
        let depth = self.gate.estimate(frame)?;
        let (lo, hi) = depth.plane().min_max();
        if lo == hi {
            debug!(frame = frame.index(), depth = lo, "uniform depth, flat stereo");
        }

        let pair = synthesize(frame, &depth, &self.params)
            .map_err(|e| JobError::from_stereo(Stage::Synthesize, e))?;
        let mut holes = HoleTotals::default();
        holes.add(pair.holes(Eye::Left));
        holes.add(pair.holes(Eye::Right));

        let (left, right) = pair.into_frames();
        let canvas = match &self.packer {
            Some(p) => Some(
                p.pack_pair(&left, &right)
                    .map_err(|e| JobError::from_stereo(Stage::Pack, e))?,
            ),
            None => None,
        };
        Ok(FrameOutput {
            left,
            right,
            canvas,
            holes,
        })
    }

    /// Process every frame on `pool`, writing the results under `dirs`
    ///
    /// Each worker decodes its own frame and writes its eye images (and
    /// canvas) as `<index:06>.png`, so only frames in flight are held in
    /// memory.
    ///
    /// # Errors
    ///
    /// [`JobError::Contract`] at [`Stage::Extract`] for an empty sequence
    /// or a frame whose size differs from frame 0; otherwise the first
    /// per-frame error.
    pub fn process_all(
        &self,
        frames: &FrameSequence,
        pool: &FramePool,
        cancel: &CancelToken,
        dirs: &SequenceDirs,
    ) -> JobResult<Processed> {
        if frames.is_empty() {
            return Err(JobError::contract(Stage::Extract, Violation::EmptySequence));
        }
        let load = |index: u32| {
            frames
                .load(index)
                .map_err(|e| JobError::from_io(Stage::Extract, e))
        };
        let dims = load(0)?.dimensions();
        std::fs::create_dir_all(&dirs.left)?;
        std::fs::create_dir_all(&dirs.right)?;
        if self.packer.is_some() {
            std::fs::create_dir_all(&dirs.canvas)?;
        }

        let work = |index: u32| -> JobResult<HoleTotals> {
            let frame = load(index)?;
            if frame.dimensions() != dims {
                return Err(JobError::contract(
                    Stage::Extract,
                    Violation::DimensionMismatch {
                        what: format!("frame {}", index),
                        expected: dims,
                        actual: frame.dimensions(),
                    },
                ));
            }
            let result = self.process(&frame)?;
            drop(frame);
            let name = frame_file_name(index);
            write_png(&result.left, dirs.left.join(&name))
                .map_err(|e| JobError::from_io(Stage::Synthesize, e))?;
            write_png(&result.right, dirs.right.join(&name))
                .map_err(|e| JobError::from_io(Stage::Synthesize, e))?;
            if let Some(canvas) = &result.canvas {
                write_png(canvas, dirs.canvas.join(&name))
                    .map_err(|e| JobError::from_io(Stage::Pack, e))?;
            }
            Ok(result.holes)
        };

        let total = frames.len();
        let mut holes = HoleTotals::default();
        pool.run_ordered(total, cancel, work, |index, h| {
            holes.found += h.found;
            holes.unfilled += h.unfilled;
            if (index + 1) as usize % 50 == 0 || index as usize + 1 == total {
                info!("processed {}/{} frames", index + 1, total);
            }
            Ok(())
        })?;

        let open = |dir: &Path, stage: Stage| {
            FrameSequence::open(dir).map_err(|e| JobError::from_io(stage, e))
        };
        let canvases = if self.packer.is_some() {
            Some(open(&dirs.canvas, Stage::Pack)?)
        } else {
            None
        };
        Ok(Processed {
            left: open(&dirs.left, Stage::Synthesize)?,
            right: open(&dirs.right, Stage::Synthesize)?,
            canvases,
            holes,
        })
    }
}

/// Files produced by a successful job
#[derive(Debug, Clone)]
pub struct JobOutputs {
    pub job_id: String,
    pub frames: usize,
    pub fps: f64,
    pub sbs: PathBuf,
    pub tb: PathBuf,
    pub vr180: Option<PathBuf>,
    pub preview: Option<PathBuf>,
    pub holes: HoleTotals,
    /// Working directory, when kept
    pub workdir: Option<PathBuf>,
}

/// Output path `<dir>/<stem>_<job>_<suffix>.<ext>`
pub fn output_path(dir: &Path, stem: &str, job_id: &str, suffix: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}_{}_{}.{}", stem, job_id, suffix, ext))
}

/// Runs conversion jobs against injected collaborators
pub struct JobRunner {
    config: JobConfig,
    oracle: Arc<dyn DepthOracle>,
    extractor: Arc<dyn FrameExtractor>,
    assembler: Arc<dyn FrameAssembler>,
    cancel: CancelToken,
}

impl JobRunner {
    pub fn new(
        config: JobConfig,
        oracle: Arc<dyn DepthOracle>,
        extractor: Arc<dyn FrameExtractor>,
        assembler: Arc<dyn FrameAssembler>,
    ) -> Self {
        JobRunner {
            config,
            oracle,
            extractor,
            assembler,
            cancel: CancelToken::new(),
        }
    }

    /// Create a runner observing an existing cancellation token
    pub fn with_cancel(
        config: JobConfig,
        oracle: Arc<dyn DepthOracle>,
        extractor: Arc<dyn FrameExtractor>,
        assembler: Arc<dyn FrameAssembler>,
        cancel: CancelToken,
    ) -> Self {
        JobRunner {
            config,
            oracle,
            extractor,
            assembler,
            cancel,
        }
    }

    /// Configuration of this runner
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Token that cancels the running job
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Convert `source` into stereo videos
    ///
    /// # Errors
    ///
    /// Any [`JobError`]; output files written before the failure are
    /// removed.
    pub fn run(&self, source: &Path) -> JobResult<JobOutputs> {
        let cfg = &self.config;
        cfg.validate()?;
        if !cfg.curvature_is_monotonic() {
            warn!(curvature = cfg.curvature, "screen bend folds over");
        }
        let packer = if cfg.enable_vr180 {
            Some(
                Vr180Packer::new(cfg.vr180_canvas_height)
                    .map_err(|e| JobError::from_stereo(Stage::Pack, e))?,
            )
        } else {
            None
        };
        let processor = FrameProcessor::new(cfg.stereo_params(), packer, self.oracle.clone())?;
        let pool = FramePool::new(cfg.workers)?;

        let ws = JobWorkspace::create(cfg.work_root.as_deref(), cfg.keep_workdir)?;
        let started = Instant::now();
        info!(
            job = ws.id(),
            source = %source.display(),
            oracle = self.oracle.name(),
            workers = pool.workers(),
            "starting job"
        );

        let extracted = self
            .extractor
            .extract(source, cfg.target_height, cfg.fps(), &ws.frames_dir())?;
        self.cancel.check()?;
        info!(frames = extracted.frames.len(), fps = extracted.fps, "frames extracted");

        let processed = processor.process_all(
            &extracted.frames,
            &pool,
            &self.cancel,
            &SequenceDirs::in_workspace(&ws),
        )?;
        if processed.holes.unfilled > 0 {
            warn!(
                unfilled = processed.holes.unfilled,
                "some holes were left unfilled; raise inpaint_radius to fill them"
            );
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let mut created = Vec::new();
        let result = self.write_outputs(&ws, &stem, extracted.fps, &processed, &mut created);
        match result {
            Ok(mut outputs) => {
                outputs.frames = processed.len();
                outputs.holes = processed.holes;
                info!(
                    job = ws.id(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job finished"
                );
                Ok(outputs)
            }
            Err(e) => {
                for path in &created {
                    if path.exists() {
                        if let Err(err) = std::fs::remove_file(path) {
                            warn!(path = %path.display(), error = %err, "failed to remove output");
                        }
                    }
                }
                Err(e)
            }
        }
    }

    fn write_outputs(
        &self,
        ws: &JobWorkspace,
        stem: &str,
        fps: f64,
        processed: &Processed,
        created: &mut Vec<PathBuf>,
    ) -> JobResult<JobOutputs> {
        let cfg = &self.config;
        let dir = cfg.output_dir.as_path();
        std::fs::create_dir_all(dir)?;

        let sbs = output_path(dir, stem, ws.id(), Layout::SideBySide.suffix(), "mp4");
        created.push(sbs.clone());
        self.assembler
            .assemble(&processed.left, &processed.right, Layout::SideBySide, fps, &sbs)?;
        self.cancel.check()?;

        let tb = output_path(dir, stem, ws.id(), Layout::TopBottom.suffix(), "mp4");
        created.push(tb.clone());
        self.assembler
            .assemble(&processed.left, &processed.right, Layout::TopBottom, fps, &tb)?;
        self.cancel.check()?;

        let vr180 = match &processed.canvases {
            Some(canvases) => {
                let path = output_path(dir, stem, ws.id(), Layout::Packed.suffix(), "mp4");
                created.push(path.clone());
                self.assembler
                    .assemble(canvases, canvases, Layout::Packed, fps, &path)?;
                self.cancel.check()?;
                Some(path)
            }
            None => None,
        };

        let gif = output_path(dir, stem, ws.id(), "preview", "gif");
        created.push(gif.clone());
        let preview = preview::write_preview(
            &processed.left,
            &processed.right,
            cfg.preview_frames,
            &gif,
        )?
        .then_some(gif);

        Ok(JobOutputs {
            job_id: ws.id().to_string(),
            frames: 0,
            fps,
            sbs,
            tb,
            vr180,
            preview,
            holes: HoleTotals::default(),
            workdir: ws.is_kept().then(|| ws.root().to_path_buf()),
        })
    }
}
