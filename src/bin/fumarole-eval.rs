use clap::Parser;
use std::path::PathBuf;

use fumarole_localization::io::{ground_truth, images, reports};
use fumarole_localization::{AlgorithmEvaluator, Config, FumaroleDetector, FumaroleType, logging, render};

#[derive(Parser)]
#[command(name = "fumarole-eval")]
#[command(about = "Evaluate fumarole detection against labelled ground truth")]
struct Cli {
    /// Directory of thermal images
    #[arg(value_name = "IMAGE_DIR")]
    image_dir: PathBuf,

    /// Directory of per-image ground truth, LabelImg XML or CSV
    #[arg(value_name = "GROUND_TRUTH_DIR")]
    ground_truth_dir: PathBuf,

    /// Directory for the evaluation reports
    #[arg(value_name = "OUTPUT_DIR", default_value = "evaluation_output")]
    output_dir: PathBuf,

    /// Configuration file (TOML); the bundled sample is used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only evaluate the image IDs listed in this file, one per line
    #[arg(long, value_name = "FILE")]
    id_list: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Also write images with detections (red) against ground truth (blue)
    #[arg(long)]
    render: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::sample()?,
    };
    let detector = FumaroleDetector::from_config(&config)?.with_verbose(args.verbose);
    let evaluator = AlgorithmEvaluator::from_config(&config)?;

    let mut files = images::collect_image_files(&args.image_dir)?;
    let truth = match &args.id_list {
        Some(list) => {
            let ids = images::read_id_list(list)?;
            files.retain(|id, _| ids.contains(id));
            ground_truth::load_ground_truth(&args.ground_truth_dir, &ids)?
        }
        None => {
            let ids: Vec<String> = files.keys().cloned().collect();
            ground_truth::load_ground_truth(&args.ground_truth_dir, &ids)?
        }
    };

    let detections = detector.detect_fumaroles(&files)?;
    let evaluation = evaluator.evaluate_detection_pipeline(&detections, &truth);
    reports::write_evaluation_reports(&args.output_dir, &evaluation)?;

    if args.render {
        render::render_images(&args.output_dir.join("rendered"), &files, |image_id, image| {
            render::draw_detections_vs_ground_truth(
                image,
                detections.get(image_id).map(Vec::as_slice).unwrap_or(&[]),
                truth.get(image_id).map(Vec::as_slice).unwrap_or(&[]),
            )
        })?;
    }

    let matrix = &evaluation.confusion_matrix;
    println!("\n=== Fumarole Detection Evaluation ===");
    println!("Images evaluated: {}", evaluation.evaluations.len());
    println!("Detected: {}", evaluation.total_number_detected);
    println!("Actual: {}", evaluation.total_number_of_actual_fumaroles);
    println!("Average IoU: {:.3}", evaluation.total_average_iou);
    println!("Classification accuracy: {:.3}", matrix.accuracy());
    for kind in FumaroleType::ALL {
        let (predicted, actual) = matrix.classification_score(kind.label());
        if predicted + actual > 0 {
            println!(
                "  {}: precision {:.3}, recall {:.3}",
                kind,
                matrix.precision(kind.label()),
                matrix.recall(kind.label())
            );
        }
    }
    println!("Reports written to {}", args.output_dir.display());

    Ok(())
}
