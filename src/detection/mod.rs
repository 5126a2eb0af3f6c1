pub mod clustering;
pub mod contours;
pub mod histogram;
pub mod localizer;
pub mod steps;
pub mod threshold;

use anyhow::Result;
use image::GrayImage;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{Config, ConfigError};
use crate::models::{Contour, FumaroleDetection, FumaroleType};
use crate::pipeline::{Pipeline, PipelineLocalizations, StagePayload};
use contours::{ContourExtractor, ContourSettings};
use steps::{ContourStep, HeatThresholdStep, HistogramStep, LocalizerStep};
use threshold::HeatThreshold;

/// Detections per image, keyed by image ID
pub type FumaroleDetectionsPerImage = BTreeMap<String, Vec<FumaroleDetection>>;

#[derive(Debug, Clone, Copy)]
pub struct DetectorSettings {
    /// Localizations at least this large are heated areas, smaller ones holes
    pub min_area_heated_area: f64,
    /// Radius for clustering holes into open vents
    pub open_vent_radius: f32,
    /// Radius for clustering heated areas into hidden vents
    pub hidden_vent_radius: f32,
}

impl DetectorSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            min_area_heated_area: config.get_float("detection.min_area_heated_area")?,
            open_vent_radius: config.get_float("detection.open_vent_radius_search")? as f32,
            hidden_vent_radius: config.get_float("detection.hidden_vent_radius_search")? as f32,
        })
    }
}

/// Runs the localization pipeline and turns localizations into typed detections
pub struct FumaroleDetector {
    settings: DetectorSettings,
    pipeline: Pipeline,
}

impl FumaroleDetector {
    pub fn new(
        settings: DetectorSettings,
        threshold: HeatThreshold,
        contour_settings: ContourSettings,
    ) -> Self {
        let pipeline = Pipeline::new()
            .add_step(Box::new(HistogramStep {
                ranges: threshold.ranges().to_vec(),
            }))
            .add_step(Box::new(HeatThresholdStep { threshold }))
            .add_step(Box::new(ContourStep {
                extractor: ContourExtractor::new(contour_settings),
            }))
            .add_step(Box::new(LocalizerStep));

        Self { settings, pipeline }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            DetectorSettings::from_config(config)?,
            HeatThreshold::from_config(config)?,
            ContourSettings::from_config(config)?,
        ))
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.pipeline = self.pipeline.with_verbose(verbose);
        self
    }

    /// Save every stage's output image under `output_dir`
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.pipeline = self.pipeline.with_debug(output_dir)?;
        Ok(self)
    }

    /// Detect fumaroles in every file, `files` maps image ID to path
    pub fn detect_fumaroles(
        &self,
        files: &BTreeMap<String, PathBuf>,
    ) -> Result<FumaroleDetectionsPerImage> {
        info!("Running detection on {} images", files.len());
        let localizations = self.pipeline.run(files)?;
        Ok(self.convert_localizations(&localizations))
    }

    /// Detect fumaroles in an already loaded image
    pub fn detect_image(&self, image_id: &str, image: GrayImage) -> Result<Vec<FumaroleDetection>> {
        let data = self.pipeline.run_image(image_id, image)?;
        match &data.payload {
            StagePayload::Localizations(contours) => Ok(self.classify_localizations(contours)),
            other => Err(anyhow::anyhow!(
                "Pipeline ended with {} instead of localizations",
                other.kind()
            )),
        }
    }

    pub fn convert_localizations(
        &self,
        localizations: &PipelineLocalizations,
    ) -> FumaroleDetectionsPerImage {
        localizations
            .iter()
            .map(|(image_id, contours)| (image_id.clone(), self.classify_localizations(contours)))
            .collect()
    }

    pub fn classify(&self, contour: &Contour) -> FumaroleType {
        if contour.area() >= self.settings.min_area_heated_area {
            FumaroleType::HeatedArea
        } else {
            FumaroleType::Hole
        }
    }

    /// Classify localizations as holes or heated areas and append the
    /// open and hidden vents clustered from them
    pub fn classify_localizations(&self, contours: &[Contour]) -> Vec<FumaroleDetection> {
        let mut detections: Vec<FumaroleDetection> = contours
            .iter()
            .map(|c| FumaroleDetection::from_contour(self.classify(c), c.clone()))
            .collect();

        let open_vents = self.detect_open_vents(&detections);
        let hidden_vents = self.detect_hidden_vents(&detections);
        debug!(
            "{} leaf detections, {} open vents, {} hidden vents",
            detections.len(),
            open_vents.len(),
            hidden_vents.len()
        );

        detections.extend(open_vents);
        detections.extend(hidden_vents);
        detections
    }

    pub fn detect_open_vents(&self, detections: &[FumaroleDetection]) -> Vec<FumaroleDetection> {
        let holes = of_type(detections, FumaroleType::Hole);
        clustering::cluster_detections(&holes, self.settings.open_vent_radius, FumaroleType::OpenVent)
    }

    pub fn detect_hidden_vents(&self, detections: &[FumaroleDetection]) -> Vec<FumaroleDetection> {
        let heated = of_type(detections, FumaroleType::HeatedArea);
        clustering::cluster_detections(
            &heated,
            self.settings.hidden_vent_radius,
            FumaroleType::HiddenVent,
        )
    }
}

fn of_type(detections: &[FumaroleDetection], kind: FumaroleType) -> Vec<FumaroleDetection> {
    detections.iter().filter(|d| d.kind == kind).cloned().collect()
}
