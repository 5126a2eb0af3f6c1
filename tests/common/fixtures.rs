#![allow(dead_code)]

use fumarole_localization::{
    BoundingBox, Config, Contour, FumaroleDetection, FumaroleType, GroundTruthAnnotation,
};
use image::{GrayImage, Luma};
use imageproc::point::Point;
use std::path::{Path, PathBuf};

/// Single band from 128, holes below 100px², open vents within 20px,
/// hidden vents within 40px
pub const TEST_CONFIG: &str = r#"
[pipeline.heat_threshold]
bins = "128"

[pipeline.contour]
min_area = 10.0

[detection]
min_area_heated_area = 100.0
open_vent_radius_search = 20.0
hidden_vent_radius_search = 40

[evaluation.detection]
threshold_min = 5
threshold_max = 25
threshold_step = 10

[evaluation.iou]
threshold_step = 0.25
"#;

pub fn test_config() -> Config {
    Config::from_toml_str(TEST_CONFIG).expect("Test config should parse")
}

/// Black image of the given size
pub fn blank_image(width: u32, height: u32) -> GrayImage {
    GrayImage::new(width, height)
}

pub fn fill_rect(img: &mut GrayImage, x: u32, y: u32, width: u32, height: u32, value: u8) {
    for yy in y..y + height {
        for xx in x..x + width {
            img.put_pixel(xx, yy, Luma([value]));
        }
    }
}

/// 100x100 image with two 8x8 blobs at full intensity whose centres are
/// 10px apart
pub fn two_blob_image() -> GrayImage {
    let mut img = blank_image(100, 100);
    fill_rect(&mut img, 20, 40, 8, 8, 255);
    fill_rect(&mut img, 30, 40, 8, 8, 255);
    img
}

/// Write `img` as `<dir>/<name>.png` and return the path
pub fn write_png(dir: &Path, name: &str, img: &GrayImage) -> PathBuf {
    let path = dir.join(format!("{}.png", name));
    img.save(&path).expect("Failed to save test image");
    path
}

pub fn bbox(x: i32, y: i32, width: i32, height: i32) -> BoundingBox {
    BoundingBox::new(x, y, width, height)
}

/// Contour through the four corner pixels of a square
pub fn square_contour(x: i32, y: i32, size: i32) -> Contour {
    let last = size - 1;
    Contour::new(vec![
        Point::new(x, y),
        Point::new(x + last, y),
        Point::new(x + last, y + last),
        Point::new(x, y + last),
    ])
}

pub fn detection(kind: FumaroleType, x: i32, y: i32, width: i32, height: i32) -> FumaroleDetection {
    FumaroleDetection::synthesized(kind, bbox(x, y, width, height))
}

pub fn annotation(kind: FumaroleType, x: i32, y: i32, width: i32, height: i32) -> GroundTruthAnnotation {
    GroundTruthAnnotation::new(kind.label(), bbox(x, y, width, height))
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {} but got {}",
        expected,
        actual
    );
}
