//! Job runner regression test
//!
//! Runs whole jobs against fake collaborators: a synthetic extractor that
//! writes its frames to the job's scratch directory, a recording assembler
//! and depth oracles with known behavior.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vrstereo_core::{DepthMap, Frame};
use vrstereo_io::{FrameSequence, write_sequence};
use vrstereo_pipeline::{
    CancelToken, DepthOracle, Extracted, FrameAssembler, FrameExtractor, JobConfig, JobError,
    JobResult, Layout, OracleError, Reentrancy, Stage, Violation, composed_frame, paired_len,
};
use vrstereo_test::{RegParams, fixtures};

struct SyntheticSource {
    frames: u32,
    width: u32,
}

impl FrameExtractor for SyntheticSource {
    fn extract(
        &self,
        _source: &Path,
        target_height: u32,
        fps: Option<f64>,
        scratch: &Path,
    ) -> JobResult<Extracted> {
        let frames: Vec<Frame> = (0..self.frames)
            .map(|i| fixtures::textured_frame(i, self.width, target_height, 7).expect("textured"))
            .collect();
        write_sequence(scratch, &frames).expect("write frames");
        Ok(Extracted {
            frames: FrameSequence::open(scratch).expect("open frames"),
            fps: fps.unwrap_or(25.0),
        })
    }
}

/// Records what it was asked to encode and writes a placeholder file
///
/// With `fail_on` set it leaves a partial file behind and then fails, like
/// an encoder dying halfway.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(Layout, usize, (u32, u32), PathBuf)>>,
    fail_on: Option<Layout>,
}

impl FrameAssembler for Recorder {
    fn assemble(
        &self,
        left: &FrameSequence,
        right: &FrameSequence,
        layout: Layout,
        _fps: f64,
        output: &Path,
    ) -> JobResult<()> {
        let count = paired_len(left, right)?;
        let first = composed_frame(left, right, layout, 0)?;
        if self.fail_on == Some(layout) {
            std::fs::write(output, b"partial")?;
            return Err(JobError::collaborator(Stage::Assemble, "encoder crashed"));
        }
        std::fs::write(output, b"video")?;
        self.calls.lock().expect("lock").push((
            layout,
            count,
            first.dimensions(),
            output.to_path_buf(),
        ));
        Ok(())
    }
}

/// Ramp depth; counts calls and the largest number of overlapping calls
struct CountingOracle {
    reentrancy: Reentrancy,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    cancel_at: Option<(u32, CancelToken)>,
    wrong_size: bool,
}

impl CountingOracle {
    fn new(reentrancy: Reentrancy) -> Self {
        CountingOracle {
            reentrancy,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            cancel_at: None,
            wrong_size: false,
        }
    }
}

impl DepthOracle for CountingOracle {
    fn estimate(&self, frame: &Frame) -> Result<DepthMap, OracleError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(3));
        if let Some((at, token)) = &self.cancel_at {
            if frame.index() == *at {
                token.cancel();
            }
        }
        let w = if self.wrong_size { frame.width() - 1 } else { frame.width() };
        let depth = fixtures::horizontal_ramp_depth(w, frame.height())
            .map_err(|e| OracleError::Failed(e.to_string()));
        self.active.fetch_sub(1, Ordering::SeqCst);
        depth
    }

    fn reentrancy(&self) -> Reentrancy {
        self.reentrancy
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn scratch(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("vrstereo-job-{}-{}", tag, std::process::id()))
}

fn config(tag: &str, workers: usize) -> JobConfig {
    let root = scratch(tag);
    JobConfig {
        target_height: 24,
        vr180_canvas_height: 64,
        preview_frames: 4,
        workers: Some(workers),
        output_dir: root.join("out"),
        work_root: Some(root.join("work")),
        ..Default::default()
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, |rd| rd.filter_map(Result::ok).count())
}

#[test]
fn job_reg() {
    let mut rp = RegParams::new("job");

    // --- Test 1: full job with a serialized oracle on four workers ---
    let cfg = config("full", 4);
    let oracle = Arc::new(CountingOracle::new(Reentrancy::Serialized));
    let recorder = Arc::new(Recorder::default());
    let runner = vrstereo_pipeline::JobRunner::new(
        cfg.clone(),
        oracle.clone(),
        Arc::new(SyntheticSource { frames: 12, width: 32 }),
        recorder.clone(),
    );
    let out = runner.run(Path::new("/videos/clip.mp4")).expect("job");
    rp.compare_values(12.0, out.frames as f64, 0.0);
    rp.compare_values(12.0, oracle.calls.load(Ordering::SeqCst) as f64, 0.0);
    rp.compare_values(1.0, oracle.peak.load(Ordering::SeqCst) as f64, 0.0);
    rp.check(out.sbs.ends_with(format!("clip_{}_sbs.mp4", out.job_id)), "sbs name");
    rp.check(out.tb.ends_with(format!("clip_{}_tb.mp4", out.job_id)), "tb name");
    let vr = out.vr180.clone().expect("vr180");
    rp.check(vr.ends_with(format!("clip_{}_vr180_tb.mp4", out.job_id)), "vr180 name");
    let preview = out.preview.clone().expect("preview");
    let gif = vrstereo_io::read_gif(&preview).expect("gif");
    rp.compare_values(4.0, gif.len() as f64, 0.0);
    rp.compare_values(64.0, gif[0].width() as f64, 0.0);

    let calls = recorder.calls.lock().expect("lock").clone();
    rp.compare_values(3.0, calls.len() as f64, 0.0);
    let dims: Vec<(Layout, (u32, u32))> = calls.iter().map(|c| (c.0, c.2)).collect();
    rp.check(
        dims == vec![
            (Layout::SideBySide, (64, 24)),
            (Layout::TopBottom, (32, 48)),
            (Layout::Packed, (128, 64)),
        ],
        "layouts and frame sizes",
    );
    rp.check(calls.iter().all(|c| c.1 == 12), "every video has all frames");
    rp.check(out.workdir.is_none(), "workspace removed");
    rp.compare_values(0.0, count_files(&scratch("full").join("work")) as f64, 0.0);

    // --- Test 2: reentrant oracle may overlap; kept workspace holds the sequences ---
    let cfg = config("reentrant", 4);
    let oracle = Arc::new(CountingOracle::new(Reentrancy::Reentrant));
    let runner = vrstereo_pipeline::JobRunner::new(
        JobConfig { enable_vr180: false, preview_frames: 0, keep_workdir: true, ..cfg },
        oracle.clone(),
        Arc::new(SyntheticSource { frames: 8, width: 16 }),
        Arc::new(Recorder::default()),
    );
    let out = runner.run(Path::new("b.mp4")).expect("job");
    rp.check(out.vr180.is_none() && out.preview.is_none(), "optional outputs skipped");
    rp.compare_values(8.0, oracle.calls.load(Ordering::SeqCst) as f64, 0.0);
    let workdir = out.workdir.clone().expect("kept workdir");
    let left = FrameSequence::open(workdir.join("left")).expect("left sequence");
    let right = FrameSequence::open(workdir.join("right")).expect("right sequence");
    rp.compare_values(8.0, left.len() as f64, 0.0);
    rp.compare_values(8.0, right.len() as f64, 0.0);
    let eye = left.load(7).expect("left frame 7");
    rp.check(eye.dimensions() == (16, 24), "eye frames keep the source size");
    rp.compare_values(0.0, count_files(&workdir.join("vr180")) as f64, 0.0);

    // --- Test 3: a failing encoder removes earlier outputs ---
    let cfg = config("fail", 2);
    let out_dir = cfg.output_dir.clone();
    let runner = vrstereo_pipeline::JobRunner::new(
        cfg,
        Arc::new(CountingOracle::new(Reentrancy::Reentrant)),
        Arc::new(SyntheticSource { frames: 3, width: 16 }),
        Arc::new(Recorder {
            fail_on: Some(Layout::TopBottom),
            ..Default::default()
        }),
    );
    let err = runner.run(Path::new("c.mp4")).expect_err("must fail");
    rp.check(err.stage() == Some(Stage::Assemble), "failure names the stage");
    // Neither the finished sbs video nor the partial tb file survives
    rp.compare_values(0.0, count_files(&out_dir) as f64, 0.0);

    // --- Test 4: cancellation before the next frame ---
    let cfg = config("cancel", 1);
    let out_dir = cfg.output_dir.clone();
    let mut oracle = CountingOracle::new(Reentrancy::Serialized);
    let recorder = Arc::new(Recorder::default());
    let source = Arc::new(SyntheticSource { frames: 10, width: 16 });
    let token = CancelToken::new();
    oracle.cancel_at = Some((2, token.clone()));
    let oracle = Arc::new(oracle);
    let runner = vrstereo_pipeline::JobRunner::with_cancel(
        cfg,
        oracle.clone(),
        source,
        recorder.clone(),
        token,
    );
    let err = runner.run(Path::new("d.mp4")).expect_err("cancelled");
    rp.check(matches!(err, JobError::Cancelled), "cancelled job");
    rp.compare_values(3.0, oracle.calls.load(Ordering::SeqCst) as f64, 0.0);
    rp.check(recorder.calls.lock().expect("lock").is_empty(), "nothing encoded");
    rp.compare_values(0.0, count_files(&out_dir) as f64, 0.0);

    // --- Test 5: oracle returning the wrong size is a contract violation ---
    let mut bad = CountingOracle::new(Reentrancy::Reentrant);
    bad.wrong_size = true;
    let runner = vrstereo_pipeline::JobRunner::new(
        config("badsize", 2),
        Arc::new(bad),
        Arc::new(SyntheticSource { frames: 2, width: 16 }),
        Arc::new(Recorder::default()),
    );
    let err = runner.run(Path::new("e.mp4")).expect_err("bad depth");
    rp.check(err.stage() == Some(Stage::Depth), "depth stage");
    rp.check(
        matches!(err.violation(), Some(Violation::DimensionMismatch { .. })),
        "dimension mismatch",
    );

    // --- Test 6: validation happens before anything runs ---
    let oracle = Arc::new(CountingOracle::new(Reentrancy::Reentrant));
    let runner = vrstereo_pipeline::JobRunner::new(
        JobConfig { curvature: 0.8, ..config("invalid", 1) },
        oracle.clone(),
        Arc::new(SyntheticSource { frames: 2, width: 16 }),
        Arc::new(Recorder::default()),
    );
    let err = runner.run(Path::new("f.mp4")).expect_err("invalid");
    rp.check(
        matches!(err, JobError::Validation { ref param, .. } if param == "curvature"),
        "curvature rejected",
    );
    rp.compare_values(0.0, oracle.calls.load(Ordering::SeqCst) as f64, 0.0);

    // --- Test 7: the preview holds at most 40 frames ---
    let oracle = Arc::new(CountingOracle::new(Reentrancy::Reentrant));
    let runner = vrstereo_pipeline::JobRunner::new(
        JobConfig { preview_frames: 41, ..config("preview", 1) },
        oracle.clone(),
        Arc::new(SyntheticSource { frames: 2, width: 16 }),
        Arc::new(Recorder::default()),
    );
    let err = runner.run(Path::new("g.mp4")).expect_err("too many preview frames");
    rp.check(
        matches!(err, JobError::Validation { ref param, .. } if param == "preview_frames"),
        "preview_frames above 40 rejected",
    );
    rp.compare_values(0.0, oracle.calls.load(Ordering::SeqCst) as f64, 0.0);

    for tag in ["full", "reentrant", "fail", "cancel", "badsize", "invalid", "preview"] {
        let _ = std::fs::remove_dir_all(scratch(tag));
    }
    assert!(rp.cleanup(), "job regression test failed");
}
