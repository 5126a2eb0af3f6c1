mod common;

use common::*;
use fumarole_localization::detection::contours::{ContourExtractor, ContourSettings};
use fumarole_localization::detection::steps::{ContourStep, HeatThresholdStep, LocalizerStep};
use fumarole_localization::detection::threshold::HeatThreshold;
use fumarole_localization::io::images;
use fumarole_localization::{Pipeline, PipelineData, StagePayload};

fn localization_pipeline() -> Pipeline {
    Pipeline::new()
        .add_step(Box::new(HeatThresholdStep {
            threshold: HeatThreshold::from_bins("128").unwrap(),
        }))
        .add_step(Box::new(ContourStep {
            extractor: ContourExtractor::new(ContourSettings { min_area: 10.0 }),
        }))
        .add_step(Box::new(LocalizerStep))
}

#[test]
fn test_step_names() {
    assert_eq!(
        localization_pipeline().step_names(),
        vec!["Heat Threshold", "Contour Detection", "Localization"]
    );
}

#[test]
fn test_stage_payloads_in_order() {
    let pipeline = localization_pipeline();

    let after_threshold = pipeline
        .run_partial(PipelineData::from_image("img", two_blob_image()), 1)
        .unwrap();
    assert!(matches!(after_threshold.payload, StagePayload::HeatBands(ref b) if b.len() == 1));

    let after_contours = pipeline
        .run_partial(PipelineData::from_image("img", two_blob_image()), 2)
        .unwrap();
    let StagePayload::RawContours(bands) = &after_contours.payload else {
        panic!("expected raw contours, got {}", after_contours.payload.kind());
    };
    assert_eq!(bands[0].len(), 2);

    let done = pipeline.run_image("img", two_blob_image()).unwrap();
    let StagePayload::Localizations(contours) = &done.payload else {
        panic!("expected localizations, got {}", done.payload.kind());
    };
    assert_eq!(contours.len(), 2);
    assert_eq!(done.image.width(), 100);
}

#[test]
fn test_step_rejects_wrong_payload() {
    let pipeline = Pipeline::new().add_step(Box::new(LocalizerStep));

    let err = pipeline.run_image("img", blank_image(10, 10)).unwrap_err();
    assert!(format!("{:#}", err).contains("Expected raw contours"));
}

#[test]
fn test_unreadable_images_are_skipped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_png(dir.path(), "good", &two_blob_image());
    std::fs::write(dir.path().join("corrupt.png"), b"not a png")?;
    std::fs::write(dir.path().join("notes.txt"), b"ignored")?;

    let files = images::collect_image_files(dir.path())?;
    assert_eq!(files.len(), 2);

    let localizations = localization_pipeline().run(&files)?;

    assert_eq!(localizations.len(), 1);
    assert_eq!(localizations["good"].len(), 2);

    Ok(())
}

#[test]
fn test_debug_output_per_stage() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    write_png(input.path(), "blobs", &two_blob_image());
    let debug = tempfile::tempdir()?;
    let debug_dir = debug.path().join("stages");

    let pipeline = localization_pipeline().with_debug(debug_dir.clone())?;
    let files = images::collect_image_files(input.path())?;
    pipeline.run(&files)?;

    for stage in [
        "00_input",
        "01_heat_threshold",
        "02_contour_detection",
        "03_localization",
    ] {
        assert!(
            debug_dir.join(stage).join("blobs.png").is_file(),
            "missing debug output for {}",
            stage
        );
    }

    Ok(())
}

#[test]
fn test_debug_dir_must_be_empty() -> anyhow::Result<()> {
    let debug = tempfile::tempdir()?;
    std::fs::write(debug.path().join("leftover.txt"), b"x")?;

    assert!(localization_pipeline()
        .with_debug(debug.path().to_path_buf())
        .is_err());

    Ok(())
}

#[test]
fn test_missing_image_dir() {
    assert!(images::collect_image_files(std::path::Path::new("/nonexistent/thermal")).is_err());
}

#[test]
fn test_id_list() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ids.txt");
    std::fs::write(&path, "img_1\n\n  img_2  \n")?;

    assert_eq!(images::read_id_list(&path)?, vec!["img_1", "img_2"]);

    Ok(())
}

#[test]
fn test_logging_init_twice() {
    fumarole_localization::logging::init(true);
    fumarole_localization::logging::init(false);
}
