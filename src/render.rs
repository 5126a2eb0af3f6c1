use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::io::images;
use crate::models::{BoundingBox, Contour, FumaroleDetection, FumaroleType, GroundTruthAnnotation};

/// Radius of the marker drawn around holes
pub const HOLE_MARKER_RADIUS: i32 = 5;
pub const DRAW_THICKNESS: i32 = 3;

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const GROUND_TRUTH_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const DETECTION_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub fn color_for_type(kind: FumaroleType) -> Rgb<u8> {
    match kind {
        FumaroleType::Hole => Rgb([255, 255, 0]),
        FumaroleType::OpenVent => Rgb([255, 0, 0]),
        FumaroleType::HiddenVent => Rgb([0, 255, 0]),
        FumaroleType::HeatedArea => Rgb([255, 128, 0]),
        FumaroleType::Unknown => Rgb([255, 255, 255]),
    }
}

/// Contour outlines on a black canvas
pub fn draw_contours(width: u32, height: u32, contours: &[Contour]) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);

    for point in contours.iter().flat_map(|c| c.points.iter()) {
        if point.x >= 0 && point.y >= 0 && (point.x as u32) < width && (point.y as u32) < height {
            canvas.put_pixel(point.x as u32, point.y as u32, CONTOUR_COLOR);
        }
    }

    canvas
}

fn draw_thick_rect(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for inset in 0..DRAW_THICKNESS {
        if let Some(rect) = bbox.expand(-inset).to_rect() {
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

fn to_rgb(image: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(image.clone()).to_rgb8()
}

/// Holes as circles around their centre, all other types as boxes
pub fn draw_detections(image: &GrayImage, detections: &[FumaroleDetection]) -> RgbImage {
    let mut canvas = to_rgb(image);

    for detection in detections {
        let color = color_for_type(detection.kind);
        if detection.kind == FumaroleType::Hole {
            let (cx, cy) = detection.center();
            for r in 0..DRAW_THICKNESS {
                draw_hollow_circle_mut(
                    &mut canvas,
                    (cx.round() as i32, cy.round() as i32),
                    HOLE_MARKER_RADIUS + r,
                    color,
                );
            }
        } else {
            draw_thick_rect(&mut canvas, &detection.bounding_box, color);
        }
    }

    canvas
}

/// Ground truth boxes in blue, detection boxes in red
pub fn draw_detections_vs_ground_truth(
    image: &GrayImage,
    detections: &[FumaroleDetection],
    truth: &[GroundTruthAnnotation],
) -> RgbImage {
    let mut canvas = to_rgb(image);

    for annotation in truth {
        if let Some(rect) = annotation.bounding_box.to_rect() {
            draw_hollow_rect_mut(&mut canvas, rect, GROUND_TRUTH_COLOR);
        }
    }
    for detection in detections {
        if let Some(rect) = detection.bounding_box.to_rect() {
            draw_hollow_rect_mut(&mut canvas, rect, DETECTION_COLOR);
        }
    }

    canvas
}

/// Draw every image of `files` with `draw` and save it as
/// `<output_dir>/<image_id>.png`.
///
/// Images that cannot be loaded are logged and skipped. Returns the number
/// of images written.
pub fn render_images<F>(
    output_dir: &Path,
    files: &BTreeMap<String, PathBuf>,
    draw: F,
) -> Result<usize>
where
    F: Fn(&str, &GrayImage) -> RgbImage,
{
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create render directory {}", output_dir.display()))?;

    let mut written = 0;
    for (image_id, path) in files {
        let image = match images::load_thermal_image(path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Not rendering {}: {}", image_id, e);
                continue;
            }
        };

        let out = output_dir.join(format!("{}.png", image_id));
        draw(image_id, &image)
            .save(&out)
            .with_context(|| format!("Failed to save {}", out.display()))?;
        written += 1;
    }

    info!("Rendered {} images to {}", written, output_dir.display());
    Ok(written)
}
