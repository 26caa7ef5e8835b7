//! Pose matching replay tool: score a recorded landmark stream against a template.

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::DynamicImage;
use log::{info, warn};
use pose_match::{
    camera::CameraFacing,
    config::{Config, EXAMPLE_CONFIG},
    landmarks::ImageSize,
    replay::{load_frames, load_landmarks, run_replay, ReplayOptions, ReplayTemplate},
    store::{DirectoryStore, MemoryStore, PoseStore},
};
use std::{fs, path::PathBuf, time::SystemTime};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Template skeleton (JSON array of landmarks)
    #[arg(short, long, required_unless_present = "write_config")]
    template: Option<PathBuf>,

    /// Template image; its size sets the comparison aspect ratio
    #[arg(long)]
    template_image: Option<PathBuf>,

    /// Template image size (e.g. 1080x1440) when no template image is given
    #[arg(long, conflicts_with = "template_image")]
    template_size: Option<ImageSize>,

    /// Pose name stored with captures
    #[arg(short, long, default_value = "pose")]
    name: String,

    /// Recorded live landmarks (JSON lines)
    #[arg(short, long, required_unless_present = "write_config")]
    frames: Option<PathBuf>,

    /// Camera resolution the recording was made at
    #[arg(long, default_value = "1280x720")]
    camera: ImageSize,

    /// Camera facing (front, rear)
    #[arg(long, default_value = "front")]
    facing: String,

    /// Disable automatic capture
    #[arg(long)]
    no_auto_capture: bool,

    /// Directory to save captures in; captures are kept in memory when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Owner namespace for saved captures
    #[arg(long, default_value = "local")]
    owner: String,

    /// Confirm every capture instead of discarding it
    #[arg(long)]
    auto_confirm: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Write an example configuration file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if let Some(path) = &args.write_config {
        fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let facing = match args.facing.as_str() {
        "front" => CameraFacing::Front,
        "rear" => CameraFacing::Rear,
        other => bail!("Unknown camera facing: {other}"),
    };

    // Load configuration if provided
    let mut config = if let Some(path) = &args.config {
        info!("Loading configuration from: {}", path.display());
        match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        match facing {
            CameraFacing::Front => Config::selfie(),
            CameraFacing::Rear => Config::rear(),
        }
    };
    config.capture.auto_capture &= !args.no_auto_capture;

    let (Some(template_path), Some(frames_path)) = (&args.template, &args.frames) else {
        bail!("--template and --frames are required");
    };

    let landmarks = load_landmarks(template_path)
        .with_context(|| format!("Failed to load template from {}", template_path.display()))?;
    let image = if let Some(path) = &args.template_image {
        image::open(path).with_context(|| format!("Failed to open {}", path.display()))?
    } else {
        let size = args.template_size.unwrap_or(args.camera);
        DynamicImage::new_rgba8(size.width, size.height)
    };
    let frames =
        load_frames(frames_path).with_context(|| format!("Failed to load frames from {}", frames_path.display()))?;

    let options = ReplayOptions {
        camera_size: args.camera,
        facing,
        auto_capture: config.capture.auto_capture,
        auto_confirm: args.auto_confirm,
        started_at: SystemTime::now(),
    };
    let template = ReplayTemplate {
        name: args.name.clone(),
        image,
        landmarks,
    };

    let mut store: Box<dyn PoseStore> = match &args.output {
        Some(dir) => Box::new(DirectoryStore::open(dir, &args.owner)?),
        None => Box::new(MemoryStore::new(args.owner.clone())),
    };

    let report = run_replay(config, template, &frames, &options, store.as_mut())?;
    for tick in &report.ticks {
        println!("{tick}");
    }

    println!(
        "{} frames, {} captures, {} saved, {} failed",
        report.ticks.len(),
        report.captures,
        report.saved.len(),
        report.failed_saves
    );
    for summary in store.list()? {
        println!(
            "  {} {} score {} ({:?})",
            summary.id, summary.metadata.pose_name, summary.metadata.score, summary.metadata.capture_type
        );
    }

    Ok(())
}
