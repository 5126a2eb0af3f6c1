use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::evaluation::GroundTruthPerImage;
use crate::io::reports::DetectionRecord;
use crate::models::{BoundingBox, GroundTruthAnnotation};

/// `<annotation>` document written by LabelImg
#[derive(Debug, Deserialize)]
struct LabelImgAnnotation {
    #[serde(rename = "object", default)]
    objects: Vec<LabelImgObject>,
}

#[derive(Debug, Deserialize)]
struct LabelImgObject {
    name: String,
    bndbox: LabelImgBox,
}

#[derive(Debug, Deserialize)]
struct LabelImgBox {
    xmin: i32,
    ymin: i32,
    xmax: i32,
    ymax: i32,
}

/// Annotations of a LabelImg XML file; objects with an empty box are skipped
pub fn read_labelimg_annotations(path: &Path) -> Result<Vec<GroundTruthAnnotation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot open ground truth {}", path.display()))?;
    let document: LabelImgAnnotation = quick_xml::de::from_str(&text)
        .with_context(|| format!("Malformed LabelImg annotation {}", path.display()))?;

    let mut annotations = Vec::with_capacity(document.objects.len());
    for (i, object) in document.objects.into_iter().enumerate() {
        let b = object.bndbox;
        let bounding_box = BoundingBox::new(b.xmin, b.ymin, b.xmax - b.xmin, b.ymax - b.ymin);
        if bounding_box.is_empty() {
            warn!("{} object {}: empty bounding box", path.display(), i + 1);
            continue;
        }
        annotations.push(GroundTruthAnnotation::new(object.name, bounding_box));
    }

    Ok(annotations)
}

/// Annotations of one image file; rows that do not parse or describe an
/// empty box are skipped
pub fn read_annotations(path: &Path) -> Result<Vec<GroundTruthAnnotation>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Cannot open ground truth {}", path.display()))?;

    let mut annotations = Vec::new();
    for (row, record) in rdr.deserialize::<DetectionRecord>().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("{} row {}: {}", path.display(), row + 1, e);
                continue;
            }
        };

        let bounding_box = record.bounding_box();
        if bounding_box.is_empty() {
            warn!("{} row {}: empty bounding box", path.display(), row + 1);
            continue;
        }

        annotations.push(GroundTruthAnnotation::new(record.class_label, bounding_box));
    }

    Ok(annotations)
}

/// Annotation file of `image_id` in `dir`, LabelImg XML preferred over CSV
fn annotation_file(dir: &Path, image_id: &str) -> Option<PathBuf> {
    ["xml", "csv"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", image_id, ext)))
        .find(|path| path.is_file())
}

/// Ground truth for the given images from `<dir>/<image_id>.xml` (LabelImg)
/// or `<dir>/<image_id>.csv`.
///
/// Every ID gets an entry; images without a file have no annotations.
pub fn load_ground_truth(dir: &Path, image_ids: &[String]) -> Result<GroundTruthPerImage> {
    let mut truth = GroundTruthPerImage::new();

    for image_id in image_ids {
        let annotations = match annotation_file(dir, image_id) {
            Some(path) if path.extension().is_some_and(|ext| ext == "xml") => {
                read_labelimg_annotations(&path)?
            }
            Some(path) => read_annotations(&path)?,
            None => {
                debug!("No ground truth for {}", image_id);
                Vec::new()
            }
        };
        truth.insert(image_id.clone(), annotations);
    }

    Ok(truth)
}

/// Ground truth for every `.xml` and `.csv` file in `dir`
pub fn load_ground_truth_dir(dir: &Path) -> Result<GroundTruthPerImage> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Cannot read ground truth directory {}", dir.display()))?;

    let mut image_ids = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_annotation = path
            .extension()
            .map(|ext| ext == "xml" || ext == "csv")
            .unwrap_or(false);
        if !is_annotation {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            image_ids.push(stem.to_string());
        }
    }
    image_ids.sort();
    image_ids.dedup();

    load_ground_truth(dir, &image_ids)
}
