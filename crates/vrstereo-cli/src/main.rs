//! vrstereo command-line front-end

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info, warn};
use vrstereo_core::DepthMap;
use vrstereo_io::FrameSequence;
use vrstereo_pipeline::{
    CommandDepthOracle, DepthOracle, DirectoryDepthOracle, FfmpegVideo, JobConfig, JobRunner,
    Reentrancy,
};
use vrstereo_stereo::{Eye, StereoParams, Vr180Packer, synthesize};

#[derive(Parser)]
#[command(name = "vrstereo")]
#[command(about = "Turn 2D video into side-by-side, top-bottom and VR180 stereo", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a video into stereo videos
    Convert(ConvertArgs),

    /// Synthesize the eye pair of a single image
    Frame {
        /// Source image (PNG)
        #[arg(short, long)]
        input: PathBuf,

        /// Depth image (grayscale PNG, larger is nearer)
        #[arg(short, long)]
        depth: PathBuf,

        /// Left eye output
        #[arg(long)]
        left: PathBuf,

        /// Right eye output
        #[arg(long)]
        right: PathBuf,

        /// Flip depth (for estimators where larger is farther)
        #[arg(long)]
        invert_depth: bool,

        #[command(flatten)]
        stereo: StereoArgs,
    },

    /// Pack left/right frame directories onto VR180 canvases
    Pack {
        /// Directory of left eye frames `<index:06>.png`
        #[arg(long)]
        left: PathBuf,

        /// Directory of right eye frames `<index:06>.png`
        #[arg(long)]
        right: PathBuf,

        /// Output directory for the canvases
        #[arg(short, long)]
        output: PathBuf,

        /// Canvas height (even)
        #[arg(long, default_value = "1440")]
        height: u32,
    },

    /// Print the default job configuration as JSON
    Config,
}

#[derive(Args)]
struct StereoArgs {
    /// Disparity scale in pixels
    #[arg(long)]
    baseline: Option<f32>,

    /// Screen curvature, 0 to 0.6
    #[arg(long)]
    curvature: Option<f32>,

    /// Hole filling radius in pixels, 0 disables
    #[arg(long)]
    inpaint_radius: Option<u32>,
}

#[derive(Args)]
struct ConvertArgs {
    /// Source video
    input: PathBuf,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Processing height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Output frame rate, 0 keeps the source rate
    #[arg(long)]
    fps: Option<f64>,

    #[command(flatten)]
    stereo: StereoArgs,

    /// Skip the VR180 output
    #[arg(long)]
    no_vr180: bool,

    /// VR180 canvas height
    #[arg(long)]
    canvas_height: Option<u32>,

    /// Frames in the GIF preview, 0 disables it
    #[arg(long)]
    preview_frames: Option<usize>,

    /// Worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Keep the job working directory
    #[arg(long)]
    keep_workdir: bool,

    /// Read depth from `<dir>/<index:06>.png`
    #[arg(long, conflicts_with = "depth_cmd")]
    depth_dir: Option<PathBuf>,

    /// Run `<program> [depth-arg...] <in.png> <out.png>` per frame
    #[arg(long)]
    depth_cmd: Option<PathBuf>,

    /// Extra argument for the depth program (repeatable)
    #[arg(long = "depth-arg", allow_hyphen_values = true)]
    depth_args: Vec<String>,

    /// The depth program may run several frames at once
    #[arg(long)]
    depth_parallel: bool,

    /// Flip depth (for estimators where larger is farther)
    #[arg(long)]
    invert_depth: bool,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,
}

impl StereoArgs {
    fn apply(&self, params: &mut StereoParams) {
        if let Some(b) = self.baseline {
            params.baseline = b;
        }
        if let Some(c) = self.curvature {
            params.curvature = c;
        }
        if let Some(r) = self.inpaint_radius {
            params.inpaint_radius = r;
        }
    }
}

fn job_config(args: &ConvertArgs) -> Result<JobConfig> {
    let mut cfg = match &args.config {
        Some(path) => JobConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => JobConfig::default(),
    };
    if let Some(dir) = &args.output_dir {
        cfg.output_dir = dir.clone();
    }
    if let Some(h) = args.height {
        cfg.target_height = h;
    }
    if let Some(f) = args.fps {
        cfg.fps_override = f;
    }
    let mut params = cfg.stereo_params();
    args.stereo.apply(&mut params);
    cfg.stereo_baseline = params.baseline;
    cfg.curvature = params.curvature;
    cfg.inpaint_radius = params.inpaint_radius;
    if args.no_vr180 {
        cfg.enable_vr180 = false;
    }
    if let Some(h) = args.canvas_height {
        cfg.vr180_canvas_height = h;
    }
    if let Some(n) = args.preview_frames {
        cfg.preview_frames = n;
    }
    if args.workers.is_some() {
        cfg.workers = args.workers;
    }
    if args.keep_workdir {
        cfg.keep_workdir = true;
    }
    Ok(cfg)
}

fn depth_oracle(args: &ConvertArgs, scratch: &Path) -> Result<Arc<dyn DepthOracle>> {
    if let Some(dir) = &args.depth_dir {
        return Ok(Arc::new(
            DirectoryDepthOracle::new(dir).with_invert(args.invert_depth),
        ));
    }
    if let Some(program) = &args.depth_cmd {
        let reentrancy = if args.depth_parallel {
            Reentrancy::Reentrant
        } else {
            Reentrancy::Serialized
        };
        return Ok(Arc::new(
            CommandDepthOracle::new(program, scratch)
                .with_args(args.depth_args.clone())
                .with_invert(args.invert_depth)
                .with_reentrancy(reentrancy),
        ));
    }
    bail!("no depth source: pass --depth-dir or --depth-cmd")
}

fn convert(args: ConvertArgs) -> Result<()> {
    let cfg = job_config(&args)?;
    let scratch = cfg
        .work_root
        .clone()
        .unwrap_or_else(std::env::temp_dir)
        .join(format!("vrstereo_depth_{}", std::process::id()));
    let oracle = depth_oracle(&args, &scratch)?;
    let video = Arc::new(FfmpegVideo::new(&args.ffmpeg, &args.ffprobe));

    let runner = JobRunner::new(cfg, oracle, video.clone(), video);
    let result = runner.run(&args.input);
    let _ = std::fs::remove_dir_all(&scratch);
    let out = result.with_context(|| format!("converting {}", args.input.display()))?;

    info!(job = %out.job_id, frames = out.frames, fps = out.fps, "done");
    println!("{}", out.sbs.display());
    println!("{}", out.tb.display());
    if let Some(p) = &out.vr180 {
        println!("{}", p.display());
    }
    if let Some(p) = &out.preview {
        println!("{}", p.display());
    }
    if let Some(p) = &out.workdir {
        info!(workdir = %p.display(), "working directory kept");
    }
    Ok(())
}

fn frame(
    input: &Path,
    depth: &Path,
    left: &Path,
    right: &Path,
    invert: bool,
    stereo: &StereoArgs,
) -> Result<()> {
    let src = vrstereo_io::read_png(input, 0).with_context(|| format!("reading {}", input.display()))?;
    let raw = vrstereo_io::read_gray_png(depth).with_context(|| format!("reading {}", depth.display()))?;
    let depth = DepthMap::normalize_min_max(&raw, invert)?;

    let mut params = StereoParams::default();
    stereo.apply(&mut params);
    let pair = synthesize(&src, &depth, &params)?;
    for eye in [Eye::Left, Eye::Right] {
        let h = pair.holes(eye);
        if h.unfilled > 0 {
            warn!(eye = eye.name(), found = h.found, unfilled = h.unfilled, "holes left unfilled");
        }
    }
    vrstereo_io::write_png(pair.left(), left)?;
    vrstereo_io::write_png(pair.right(), right)?;
    Ok(())
}

fn pack(left: &Path, right: &Path, output: &Path, height: u32) -> Result<()> {
    let packer = Vr180Packer::new(height)?;
    let l = FrameSequence::open(left).with_context(|| format!("reading {}", left.display()))?;
    let r = FrameSequence::open(right).with_context(|| format!("reading {}", right.display()))?;
    if l.is_empty() || l.len() != r.len() {
        bail!("cannot pair {} left frames with {} right frames", l.len(), r.len());
    }
    std::fs::create_dir_all(output)?;
    // One pair in memory at a time
    for index in 0..l.len() as u32 {
        let canvas = packer.pack_pair(&l.load(index)?, &r.load(index)?)?;
        vrstereo_io::write_png(&canvas, output.join(vrstereo_io::frame_file_name(index)))?;
    }
    info!(canvases = l.len(), width = packer.width(), height, "packed");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert(args) => convert(args),
        Commands::Frame {
            input,
            depth,
            left,
            right,
            invert_depth,
            stereo,
        } => frame(&input, &depth, &left, &right, invert_depth, &stereo),
        Commands::Pack {
            left,
            right,
            output,
            height,
        } => pack(&left, &right, &output, height),
        Commands::Config => {
            println!("{}", JobConfig::default().to_json()?);
            Ok(())
        }
    }
}
