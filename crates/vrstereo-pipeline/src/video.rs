//! Video extraction and assembly seams
//!
//! [`FrameExtractor`] turns a source video into an on-disk
//! [`FrameSequence`]; [`FrameAssembler`] encodes paired eye sequences into
//! a video. [`FfmpegVideo`] implements both by running `ffmpeg` and
//! `ffprobe` as subprocesses. Frames are decoded one at a time on both
//! sides, so memory does not grow with the length of the video.

use crate::{JobError, JobResult, Stage, Violation};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, info, warn};
use vrstereo_core::Frame;
use vrstereo_io::FrameSequence;
use vrstereo_transform::{hconcat, vconcat};

/// Frame rate assumed when the source does not report one
pub const DEFAULT_FPS: f64 = 24.0;

/// Frames pulled from a source video
#[derive(Debug, Clone)]
pub struct Extracted {
    pub frames: FrameSequence,
    pub fps: f64,
}

/// How a left/right pair is laid out in an output video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Left eye on the left, right eye on the right
    SideBySide,
    /// Left eye on top, right eye below
    TopBottom,
    /// Frames already hold both eyes (VR180 canvases); encoded as is
    Packed,
}

impl Layout {
    /// File name suffix of videos in this layout
    pub fn suffix(self) -> &'static str {
        match self {
            Layout::SideBySide => "sbs",
            Layout::TopBottom => "tb",
            Layout::Packed => "vr180_tb",
        }
    }
}

/// Source video to frames
pub trait FrameExtractor: Send + Sync {
    /// Extract every frame of `source` at `target_height`
    ///
    /// Frames are written under `scratch` if the implementation needs
    /// files. `fps` of `None` keeps the source rate.
    fn extract(
        &self,
        source: &Path,
        target_height: u32,
        fps: Option<f64>,
        scratch: &Path,
    ) -> JobResult<Extracted>;
}

/// Frames to video
pub trait FrameAssembler: Send + Sync {
    /// Encode paired sequences into `output`
    ///
    /// Nothing is left at `output` when this fails.
    fn assemble(
        &self,
        left: &FrameSequence,
        right: &FrameSequence,
        layout: Layout,
        fps: f64,
        output: &Path,
    ) -> JobResult<()>;
}

/// Number of pairs in two eye sequences
///
/// # Errors
///
/// [`JobError::Contract`] at [`Stage::Assemble`] for empty or unequal
/// sequences.
pub fn paired_len(left: &FrameSequence, right: &FrameSequence) -> JobResult<usize> {
    if left.len() != right.len() {
        return Err(JobError::contract(
            Stage::Assemble,
            Violation::CountMismatch {
                left: left.len(),
                right: right.len(),
            },
        ));
    }
    if left.is_empty() {
        return Err(JobError::contract(Stage::Assemble, Violation::EmptySequence));
    }
    Ok(left.len())
}

/// Combine one left/right pair into an output frame for `layout`
pub fn compose_pair(left: &Frame, right: &Frame, layout: Layout) -> JobResult<Frame> {
    let out = match layout {
        Layout::SideBySide => hconcat(left, right),
        Layout::TopBottom => vconcat(left, right),
        Layout::Packed => Ok(left.clone()),
    };
    out.map_err(|e| JobError::from_transform(Stage::Assemble, e))
}

/// Load pair `index` from disk and combine it for `layout`
///
/// [`Layout::Packed`] reads only the left sequence.
pub fn composed_frame(
    left: &FrameSequence,
    right: &FrameSequence,
    layout: Layout,
    index: u32,
) -> JobResult<Frame> {
    let load = |seq: &FrameSequence| {
        seq.load(index)
            .map_err(|e| JobError::from_io(Stage::Assemble, e))
    };
    let l = load(left)?;
    if layout == Layout::Packed {
        return Ok(l);
    }
    compose_pair(&l, &load(right)?, layout)
}

/// Parse an ffprobe rate such as `30000/1001` or `25`
pub fn parse_frame_rate(text: &str) -> Option<f64> {
    let text = text.trim();
    let rate = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// `ffmpeg` / `ffprobe` subprocess adapter
#[derive(Debug, Clone)]
pub struct FfmpegVideo {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegVideo {
    fn default() -> Self {
        FfmpegVideo {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegVideo {
    /// Use specific executables
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        FfmpegVideo {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Frame rate of the first video stream, if ffprobe can tell
    pub fn probe_fps(&self, source: &Path) -> Option<f64> {
        let out = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=r_frame_rate",
                "-of",
                "csv=p=0",
            ])
            .arg(source)
            .output()
            .ok()?;
        if !out.status.success() {
            return None;
        }
        parse_frame_rate(&String::from_utf8_lossy(&out.stdout))
    }

    fn spawn_failed(&self, stage: Stage, err: io::Error) -> JobError {
        JobError::collaborator(stage, format!("{}: {}", self.ffmpeg.display(), err))
    }

    fn run(&self, stage: Stage, cmd: &mut Command) -> JobResult<()> {
        debug!(?cmd, "running");
        let out = cmd.output().map_err(|e| self.spawn_failed(stage, e))?;
        if !out.status.success() {
            return Err(JobError::collaborator(
                stage,
                format!(
                    "ffmpeg exited with {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }
        Ok(())
    }
}

impl FrameExtractor for FfmpegVideo {
    fn extract(
        &self,
        source: &Path,
        target_height: u32,
        fps: Option<f64>,
        scratch: &Path,
    ) -> JobResult<Extracted> {
        if !source.is_file() {
            return Err(JobError::collaborator(
                Stage::Extract,
                format!("source video {} not found", source.display()),
            ));
        }
        std::fs::create_dir_all(scratch)?;

        let achieved = match fps {
            Some(f) => f,
            None => self.probe_fps(source).unwrap_or_else(|| {
                warn!(source = %source.display(), "frame rate unknown, assuming {}", DEFAULT_FPS);
                DEFAULT_FPS
            }),
        };
        let mut filter = format!("scale=-2:{}", target_height);
        if let Some(f) = fps {
            filter.push_str(&format!(",fps={}", f));
        }

        info!(source = %source.display(), %filter, "extracting frames");
        self.run(
            Stage::Extract,
            Command::new(&self.ffmpeg)
                .args(["-y", "-v", "error", "-i"])
                .arg(source)
                .args(["-vf", &filter, "-start_number", "0"])
                .arg(scratch.join("%06d.png")),
        )?;

        let frames =
            FrameSequence::open(scratch).map_err(|e| JobError::from_io(Stage::Extract, e))?;
        if frames.is_empty() {
            return Err(JobError::contract(Stage::Extract, Violation::EmptySequence));
        }
        let first = frames
            .load(0)
            .map_err(|e| JobError::from_io(Stage::Extract, e))?;
        if first.height() != target_height {
            return Err(JobError::contract(
                Stage::Extract,
                Violation::DimensionMismatch {
                    what: "extracted frame 0".to_string(),
                    expected: (first.width(), target_height),
                    actual: first.dimensions(),
                },
            ));
        }
        Ok(Extracted {
            frames,
            fps: achieved,
        })
    }
}

/// Removes a partially written output unless disarmed
struct PartialOutput<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialOutput<'a> {
    fn new(path: &'a Path) -> Self {
        PartialOutput { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove partial output"),
        }
    }
}

enum FeedError {
    /// ffmpeg stopped reading; its exit status says why
    Pipe(io::Error),
    Job(JobError),
}

/// Stream raw RGB frames into the encoder's stdin
fn feed(
    stdin: ChildStdin,
    count: usize,
    first: Frame,
    mut next: impl FnMut(u32) -> JobResult<Frame>,
) -> Result<(), FeedError> {
    let mut pipe = BufWriter::new(stdin);
    let dims = first.dimensions();
    pipe.write_all(&first.to_rgb_bytes())
        .map_err(FeedError::Pipe)?;
    drop(first);
    for index in 1..count as u32 {
        let frame = next(index).map_err(FeedError::Job)?;
        if frame.dimensions() != dims {
            return Err(FeedError::Job(JobError::contract(
                Stage::Assemble,
                Violation::DimensionMismatch {
                    what: format!("output frame {}", index),
                    expected: dims,
                    actual: frame.dimensions(),
                },
            )));
        }
        pipe.write_all(&frame.to_rgb_bytes())
            .map_err(FeedError::Pipe)?;
    }
    pipe.flush().map_err(FeedError::Pipe)
}

fn abort(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl FrameAssembler for FfmpegVideo {
    fn assemble(
        &self,
        left: &FrameSequence,
        right: &FrameSequence,
        layout: Layout,
        fps: f64,
        output: &Path,
    ) -> JobResult<()> {
        let count = paired_len(left, right)?;
        let first = composed_frame(left, right, layout, 0)?;
        let (w, h) = first.dimensions();

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let guard = PartialOutput::new(output);

        info!(output = %output.display(), layout = layout.suffix(), frames = count, "encoding");
        let size = format!("{}x{}", w, h);
        let rate = format!("{}", fps);
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-v", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &size, "-framerate", &rate, "-i", "-"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        debug!(?cmd, "running");
        let mut child = cmd
            .spawn()
            .map_err(|e| self.spawn_failed(Stage::Assemble, e))?;
        let Some(stdin) = child.stdin.take() else {
            abort(child);
            return Err(JobError::collaborator(Stage::Assemble, "ffmpeg stdin unavailable"));
        };

        let fed = feed(stdin, count, first, |i| composed_frame(left, right, layout, i));
        let broken = match fed {
            Ok(()) => None,
            Err(FeedError::Job(e)) => {
                abort(child);
                return Err(e);
            }
            Err(FeedError::Pipe(e)) => Some(e),
        };

        let out = child
            .wait_with_output()
            .map_err(|e| self.spawn_failed(Stage::Assemble, e))?;
        if !out.status.success() {
            return Err(JobError::collaborator(
                Stage::Assemble,
                format!(
                    "ffmpeg exited with {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }
        if let Some(e) = broken {
            return Err(JobError::collaborator(
                Stage::Assemble,
                format!("ffmpeg stopped reading frames: {}", e),
            ));
        }
        guard.disarm();
        Ok(())
    }
}
