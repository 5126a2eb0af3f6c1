mod common;

use common::*;
use fumarole_localization::DetectorSettings;
use fumarole_localization::detection::contours::ContourSettings;
use fumarole_localization::detection::threshold::HeatThreshold;

fn test_detector() -> FumaroleDetector {
    FumaroleDetector::from_config(&test_config()).expect("Detector should build from test config")
}

#[test]
fn test_two_close_holes_form_open_vent() {
    let detections = test_detector()
        .detect_image("two_blobs", two_blob_image())
        .unwrap();

    assert_eq!(detections.len(), 3);

    let holes: Vec<_> = detections
        .iter()
        .filter(|d| d.kind == FumaroleType::Hole)
        .collect();
    assert_eq!(holes.len(), 2);
    for hole in &holes {
        assert_eq!(hole.contour.area(), 49.0);
        assert_eq!(hole.bounding_box.width, 8);
    }

    let vent = &detections[2];
    assert_eq!(vent.kind, FumaroleType::OpenVent);
    assert_eq!(vent.bounding_box, bbox(15, 35, 28, 18));
    for hole in &holes {
        assert!(vent.bounding_box.contains(&hole.bounding_box));
    }
}

#[test]
fn test_large_region_is_heated_area() {
    let mut img = blank_image(100, 100);
    fill_rect(&mut img, 10, 10, 20, 20, 200);

    let detections = test_detector().detect_image("big", img).unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].kind, FumaroleType::HeatedArea);
    assert_eq!(detections[0].bounding_box, bbox(10, 10, 20, 20));
}

#[test]
fn test_close_heated_areas_form_hidden_vent() {
    let mut img = blank_image(120, 120);
    fill_rect(&mut img, 10, 10, 20, 20, 200);
    fill_rect(&mut img, 40, 10, 20, 20, 200);

    let detections = test_detector().detect_image("pair", img).unwrap();

    let kinds: Vec<_> = detections.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![FumaroleType::HeatedArea, FumaroleType::HeatedArea, FumaroleType::HiddenVent]
    );
    assert_eq!(detections[2].bounding_box, bbox(5, 5, 60, 30));
}

#[test]
fn test_empty_image_has_no_detections() {
    let detections = test_detector()
        .detect_image("empty", blank_image(64, 64))
        .unwrap();

    assert!(detections.is_empty());
}

#[test]
fn test_classify_by_area_boundary() {
    let detector = test_detector();

    // Areas 81 and 100 around the 100px² boundary
    assert_eq!(detector.classify(&square_contour(0, 0, 10)), FumaroleType::Hole);
    assert_eq!(detector.classify(&square_contour(0, 0, 11)), FumaroleType::HeatedArea);
}

#[test]
fn test_vents_are_appended_after_leaves() {
    let settings = DetectorSettings {
        min_area_heated_area: 100.0,
        open_vent_radius: 20.0,
        hidden_vent_radius: 40.0,
    };
    let detector = FumaroleDetector::new(
        settings,
        HeatThreshold::from_bins("128").unwrap(),
        ContourSettings { min_area: 10.0 },
    );

    let contours = vec![
        square_contour(0, 0, 5),
        square_contour(8, 0, 5),
        square_contour(200, 200, 20),
    ];
    let detections = detector.classify_localizations(&contours);

    assert_eq!(detections.len(), 4);
    assert_eq!(detections[0].kind, FumaroleType::Hole);
    assert_eq!(detections[1].kind, FumaroleType::Hole);
    assert_eq!(detections[2].kind, FumaroleType::HeatedArea);
    assert_eq!(detections[3].kind, FumaroleType::OpenVent);
}

#[test]
fn test_detect_fumaroles_over_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_png(dir.path(), "b_image", &two_blob_image());
    write_png(dir.path(), "a_image", &blank_image(32, 32));

    let files = fumarole_localization::io::images::collect_image_files(dir.path())?;
    let detections = test_detector().detect_fumaroles(&files)?;

    let ids: Vec<_> = detections.keys().cloned().collect();
    assert_eq!(ids, vec!["a_image".to_string(), "b_image".to_string()]);
    assert!(detections["a_image"].is_empty());
    assert_eq!(detections["b_image"].len(), 3);

    Ok(())
}

#[test]
fn test_hole_on_image_border_is_detected() {
    let mut img = blank_image(60, 60);
    fill_rect(&mut img, 0, 20, 8, 8, 255);

    let detections = test_detector().detect_image("border", img).unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].kind, FumaroleType::Hole);
    assert_eq!(detections[0].bounding_box, bbox(0, 20, 8, 8));
}
