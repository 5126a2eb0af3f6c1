use image::GrayImage;
use imageproc::contours::{self as ip_contours, BorderType};
use imageproc::point::Point;
use tracing::debug;

use crate::config::{Config, ConfigError};
use crate::detection::threshold::HeatBands;
use crate::models::Contour;

pub const MIN_AREA_KEY: &str = "pipeline.contour.min_area";

#[derive(Debug, Clone, Copy)]
pub struct ContourSettings {
    /// Contours enclosing this area or less are dropped
    pub min_area: f64,
}

impl ContourSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            min_area: config.get_float(MIN_AREA_KEY)?,
        })
    }
}

/// Outer borders of the connected foreground regions, holes and
/// regions nested inside holes are skipped
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    // Trace on a copy with a 1px background frame so regions touching the
    // image edge still get an outer border
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut framed, mask, 1, 1);

    ip_contours::find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            // Shift back into mask coordinates
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            Contour::new(points)
        })
        .collect()
}

/// Remove contours too small to be a fumarole
pub fn filter_contour_noise(contours: Vec<Contour>, min_area: f64) -> Vec<Contour> {
    contours
        .into_iter()
        .filter(|c| !c.is_degenerate() && c.area() > min_area)
        .collect()
}

/// Finds hot regions in every thermal band
#[derive(Debug, Clone)]
pub struct ContourExtractor {
    settings: ContourSettings,
}

impl ContourExtractor {
    pub fn new(settings: ContourSettings) -> Self {
        Self { settings }
    }

    pub fn extract_band(&self, mask: &GrayImage) -> Vec<Contour> {
        let found = find_external_contours(mask);
        let total = found.len();
        let kept = filter_contour_noise(found, self.settings.min_area);
        debug!("Kept {} of {} contours", kept.len(), total);
        kept
    }

    /// Contours per band, in the band order of `bands` (coldest first)
    pub fn extract(&self, bands: &HeatBands) -> Vec<Vec<Contour>> {
        bands.masks.iter().map(|mask| self.extract_band(mask)).collect()
    }
}
