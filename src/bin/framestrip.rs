use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use framestrip::{
    DecodeSession as _, ExportFrame, ExportNaming, FillColor, JobConfig, Pipeline, SourceSlot,
};

#[derive(Parser, Debug)]
#[command(name = "framestrip", version)]
struct Cli {
    /// Log per-frame progress and decoder details.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample one video into evenly spaced JPEG frames.
    Sample(SampleArgs),
    /// Sample two videos and merge them into side-by-side frames.
    Dual(DualArgs),
    /// Print source metadata as JSON (requires `ffprobe` on PATH).
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Output directory for frames and `frames.json`.
    #[arg(long)]
    out: PathBuf,

    /// Job configuration JSON; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to sample (presets: 30, 20, 40).
    #[arg(long)]
    frames: Option<u32>,

    /// Reposition frames on the canonical canvas at this scale.
    #[arg(long)]
    scale: Option<f64>,

    /// Horizontal nudge in pixels after centering.
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f64>,

    /// Vertical nudge in pixels after centering.
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f64>,

    /// Fill behind repositioned frames: black, white or #rrggbb.
    #[arg(long)]
    fill: Option<FillColor>,

    /// File naming for written frames.
    #[arg(long, value_enum, default_value_t = ExportNaming::Download)]
    naming: ExportNaming,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    job: JobArgs,
}

#[derive(Args, Debug)]
struct DualArgs {
    /// First video; merged frames take their timestamps from it.
    #[arg(long)]
    a: PathBuf,

    /// Second video.
    #[arg(long)]
    b: PathBuf,

    #[command(flatten)]
    job: JobArgs,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Sample(args) => cmd_sample(args),
        Command::Dual(args) => cmd_dual(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(args: &JobArgs) -> anyhow::Result<JobConfig> {
    let mut cfg = match &args.config {
        Some(path) => JobConfig::from_json_path(path)?,
        None => JobConfig::default(),
    };
    if let Some(frames) = args.frames {
        cfg.frame_count = frames;
    }

    let crop_requested = args.scale.is_some()
        || args.offset_x.is_some()
        || args.offset_y.is_some()
        || args.fill.is_some();
    if crop_requested {
        let mut crop = cfg.crop.unwrap_or_default();
        if let Some(scale) = args.scale {
            crop.scale = scale;
        }
        if let Some(x) = args.offset_x {
            crop.offset_x = x;
        }
        if let Some(y) = args.offset_y {
            crop.offset_y = y;
        }
        if let Some(fill) = args.fill {
            crop.fill = fill;
        }
        cfg.crop = Some(crop);
    }

    cfg.validate()?;
    Ok(cfg)
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.job)?;
    let pipeline = Pipeline::from_config(&cfg)?;

    let mut session = pipeline.open_source(&args.in_path)?;
    let mut last = None;
    let seq = pipeline
        .sample_single(&mut session, &mut |pct: u8| {
            if last != Some(pct) {
                eprintln!("{pct}%");
                last = Some(pct);
            }
        })
        .context("Failed to extract frames")?;

    write_outputs(&args.job.out, seq.frames(), args.job.naming)
}

fn cmd_dual(args: DualArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.job)?;
    let pipeline = Pipeline::from_config(&cfg)?;

    let mut first = pipeline.open_source(&args.a)?;
    let mut second = pipeline.open_source(&args.b)?;
    let outcome = pipeline
        .sample_dual(&mut first, &mut second, |slot, pct| {
            let label = match slot {
                SourceSlot::First => "a",
                SourceSlot::Second => "b",
            };
            eprintln!("{label}: {pct}%");
        })
        .context("Failed to extract frames")?;

    write_outputs(&args.job.out, outcome.merged.frames(), args.job.naming)
}

fn write_outputs<F: ExportFrame>(
    out: &Path,
    frames: &[F],
    naming: ExportNaming,
) -> anyhow::Result<()> {
    let written = framestrip::export_frames(out, frames, naming)?;
    let manifest = framestrip::write_manifest(out, frames, naming)?;
    eprintln!(
        "wrote {} frames to {} ({})",
        written.len(),
        out.display(),
        manifest.display()
    );
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let session = framestrip::FfmpegSession::open(&args.in_path)?;
    let json = serde_json::to_string_pretty(session.info()).context("serialize probe output")?;
    println!("{json}");
    Ok(())
}
