mod common;

use common::*;
use fumarole_localization::io::images;
use fumarole_localization::render;
use image::Rgb;

#[test]
fn test_render_skips_unreadable_images() -> anyhow::Result<()> {
    let input = tempfile::tempdir()?;
    write_png(input.path(), "good", &two_blob_image());
    std::fs::write(input.path().join("broken.png"), b"garbage")?;
    let output = tempfile::tempdir()?;
    let render_dir = output.path().join("rendered");

    let files = images::collect_image_files(input.path())?;
    let written = render::render_images(&render_dir, &files, |_, image| {
        render::draw_detections(image, &[])
    })?;

    assert_eq!(written, 1);
    assert!(render_dir.join("good.png").is_file());
    assert!(!render_dir.join("broken.png").exists());

    Ok(())
}

#[test]
fn test_detection_boxes_are_drawn() {
    let image = blank_image(40, 40);
    let detections = [detection(FumaroleType::HeatedArea, 5, 5, 20, 20)];

    let drawing = render::draw_detections(&image, &detections);

    assert_eq!(*drawing.get_pixel(5, 5), render::color_for_type(FumaroleType::HeatedArea));
    assert_eq!(*drawing.get_pixel(15, 15), Rgb([0, 0, 0]));
}

#[test]
fn test_ground_truth_and_detections_colours() {
    let image = blank_image(40, 40);
    let truth = [annotation(FumaroleType::Hole, 2, 2, 10, 10)];
    let detections = [detection(FumaroleType::Hole, 20, 20, 10, 10)];

    let drawing = render::draw_detections_vs_ground_truth(&image, &detections, &truth);

    assert_eq!(*drawing.get_pixel(2, 2), render::GROUND_TRUTH_COLOR);
    assert_eq!(*drawing.get_pixel(20, 20), render::DETECTION_COLOR);
}
