use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::warn;

use fumarole_localization::io::{images, reports};
use fumarole_localization::{Config, FumaroleDetector, FumaroleType, logging, render};

#[derive(Parser)]
#[command(name = "fumarole-localization")]
#[command(about = "Detect and classify fumaroles in thermal images")]
struct Cli {
    /// Directory of thermal images
    #[arg(value_name = "IMAGE_DIR")]
    image_dir: PathBuf,

    /// Directory for the per-image detection CSV files
    #[arg(value_name = "OUTPUT_DIR", default_value = "detector_csv_output")]
    output_dir: PathBuf,

    /// Configuration file (TOML); the bundled sample is used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save intermediate pipeline images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Also write images with the detections drawn on top
    #[arg(long)]
    render: bool,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::sample()?,
    };
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    let config = load_config(args.config.as_deref())?;

    let mut detector = FumaroleDetector::from_config(&config)?.with_verbose(args.verbose);
    if let Some(debug_dir) = args.debug_out {
        detector = detector.with_debug(debug_dir)?;
    }

    let files = images::collect_image_files(&args.image_dir)?;
    if files.is_empty() {
        warn!("No supported images in {}", args.image_dir.display());
    }

    let detections = detector.detect_fumaroles(&files)?;
    reports::write_detections(&args.output_dir, &detections)?;

    if args.render {
        render::render_images(&args.output_dir.join("rendered"), &files, |image_id, image| {
            let image_detections = detections.get(image_id).map(Vec::as_slice).unwrap_or(&[]);
            render::draw_detections(image, image_detections)
        })?;
    }

    println!("\n=== Fumarole Detection Results ===");
    println!("Images processed: {} of {}", detections.len(), files.len());
    for kind in FumaroleType::ALL {
        let count: usize = detections
            .values()
            .map(|d| d.iter().filter(|x| x.kind == kind).count())
            .sum();
        if count > 0 {
            println!("  {}: {}", kind, count);
        }
    }
    println!("Detections written to {}", args.output_dir.display());

    Ok(())
}
