use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::detection::threshold::HeatBands;
use crate::io::images;
use crate::models::Contour;

/// Localizations per image, keyed by image ID
pub type PipelineLocalizations = BTreeMap<String, Vec<Contour>>;

/// Result a stage hands to the next one
#[derive(Debug, Clone)]
pub enum StagePayload {
    /// Nothing computed yet
    Empty,
    /// Number of intensity clusters found by histogram analysis
    ClusterCount(usize),
    /// Thermal band masks, coldest first
    HeatBands(HeatBands),
    /// Contours per band, coldest first
    RawContours(Vec<Vec<Contour>>),
    /// Final contours after cross-band reconciliation
    Localizations(Vec<Contour>),
}

impl StagePayload {
    pub fn kind(&self) -> &'static str {
        match self {
            StagePayload::Empty => "empty",
            StagePayload::ClusterCount(_) => "cluster count",
            StagePayload::HeatBands(_) => "heat bands",
            StagePayload::RawContours(_) => "raw contours",
            StagePayload::Localizations(_) => "localizations",
        }
    }
}

/// Data that flows through the pipeline for a single image
#[derive(Debug, Clone)]
pub struct PipelineData {
    pub image_id: String,

    /// Output image of the last stage (the input image before any stage ran)
    pub image: DynamicImage,

    pub payload: StagePayload,
}

impl PipelineData {
    pub fn from_image(image_id: impl Into<String>, image: GrayImage) -> Self {
        Self {
            image_id: image_id.into(),
            image: DynamicImage::ImageLuma8(image),
            payload: StagePayload::Empty,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    pub enabled: bool,
}

/// Context available to all pipeline steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub verbose: bool,
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn debug_dir(&self) -> Option<&Path> {
        self.debug
            .as_ref()
            .filter(|d| d.enabled)
            .map(|d| d.output_dir.as_path())
    }
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep {
    /// Transform the image and the payload of the previous stage
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step
    fn name(&self) -> &str;
}

/// Ordered list of stages run on every image of a batch
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.context.verbose = verbose;
        self
    }

    /// Enable debug mode with output directory.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn add_step(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn save_debug_output(&self, dir_name: &str, data: &PipelineData) -> Result<()> {
        let Some(root) = self.context.debug_dir() else {
            return Ok(());
        };

        let step_dir = root.join(dir_name);
        std::fs::create_dir_all(&step_dir)?;

        let output_path = step_dir.join(format!("{}.png", data.image_id));
        data.image
            .save(&output_path)
            .with_context(|| format!("Failed to save debug image {}", output_path.display()))?;

        debug!("Debug: saved {}/{}.png", dir_name, data.image_id);
        Ok(())
    }

    /// Run the first `num_steps` stages on one image
    pub fn run_partial(&self, data: PipelineData, num_steps: usize) -> Result<PipelineData> {
        self.save_debug_output("00_input", &data)?;

        let mut data = data;
        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            debug!("Running step: {} on {}", step.name(), data.image_id);

            data = step
                .process(data, &self.context)
                .with_context(|| format!("Step '{}' failed", step.name()))?;

            let dir_name = format!(
                "{:02}_{}",
                step_idx + 1,
                step.name().to_lowercase().replace(' ', "_")
            );
            self.save_debug_output(&dir_name, &data)?;

            debug!("  → {}", data.payload.kind());
        }

        Ok(data)
    }

    /// Run every stage on one image
    pub fn run_image(&self, image_id: &str, image: GrayImage) -> Result<PipelineData> {
        self.run_partial(PipelineData::from_image(image_id, image), self.steps.len())
    }

    /// Run the pipeline on every file, in image ID order.
    ///
    /// Images that cannot be loaded are logged and left out of the result.
    pub fn run(&self, files: &BTreeMap<String, PathBuf>) -> Result<PipelineLocalizations> {
        let mut localizations = PipelineLocalizations::new();

        for (image_id, path) in files {
            let image = match images::load_thermal_image(path) {
                Ok(image) => image,
                Err(e) => {
                    warn!("Skipping {}: {}", image_id, e);
                    continue;
                }
            };

            let data = self.run_image(image_id, image)?;
            match data.payload {
                StagePayload::Localizations(contours) => {
                    info!("{}: {} localizations", image_id, contours.len());
                    localizations.insert(image_id.clone(), contours);
                }
                other => {
                    return Err(anyhow::anyhow!(
                        "Pipeline ended with {} instead of localizations",
                        other.kind()
                    ));
                }
            }
        }

        Ok(localizations)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
