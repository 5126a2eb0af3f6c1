use anyhow::Result;
use image::DynamicImage;
use tracing::{debug, info};

use crate::detection::contours::ContourExtractor;
use crate::detection::threshold::{BandRange, HeatThreshold};
use crate::detection::{histogram, localizer};
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep, StagePayload};
use crate::render;

/// Count the significant intensity bands; the image passes through unchanged
pub struct HistogramStep {
    pub ranges: Vec<BandRange>,
}

impl PipelineStep for HistogramStep {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let gray = data.image.to_luma8();
        let frequencies = histogram::relative_band_frequencies(&gray, &self.ranges);
        let clusters = histogram::cluster_count(&frequencies);

        if context.verbose {
            for (range, frequency) in self.ranges.iter().zip(&frequencies) {
                debug!("  Band {}-{}: {:.3}", range.lower, range.upper, frequency);
            }
        }
        info!("{}: {} intensity clusters", data.image_id, clusters);

        Ok(PipelineData {
            image_id: data.image_id,
            image: data.image,
            payload: StagePayload::ClusterCount(clusters),
        })
    }

    fn name(&self) -> &str {
        "Histogram Analysis"
    }
}

/// Split the thermal image into band masks
pub struct HeatThresholdStep {
    pub threshold: HeatThreshold,
}

impl PipelineStep for HeatThresholdStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let gray = data.image.to_luma8();
        let bands = self.threshold.apply(&gray);

        Ok(PipelineData {
            image_id: data.image_id,
            image: DynamicImage::ImageRgba8(bands.to_rgba()),
            payload: StagePayload::HeatBands(bands),
        })
    }

    fn name(&self) -> &str {
        "Heat Threshold"
    }
}

/// Find the external contours of every band
pub struct ContourStep {
    pub extractor: ContourExtractor,
}

impl PipelineStep for ContourStep {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let StagePayload::HeatBands(bands) = &data.payload else {
            return Err(anyhow::anyhow!(
                "Expected heat bands, got {}",
                data.payload.kind()
            ));
        };

        let band_contours = self.extractor.extract(bands);

        if context.verbose {
            for (band, contours) in band_contours.iter().enumerate() {
                debug!("  Band {}: {} contours", band, contours.len());
                for (i, contour) in contours.iter().take(10).enumerate() {
                    debug!(
                        "    Contour {}: area={:.1}, points={}, bbox={:?}",
                        i + 1,
                        contour.area(),
                        contour.len(),
                        contour.bounding_box()
                    );
                }
            }
        }

        let all: Vec<_> = band_contours.iter().flatten().cloned().collect();
        let drawing = render::draw_contours(data.image.width(), data.image.height(), &all);

        Ok(PipelineData {
            image_id: data.image_id,
            image: DynamicImage::ImageRgb8(drawing),
            payload: StagePayload::RawContours(band_contours),
        })
    }

    fn name(&self) -> &str {
        "Contour Detection"
    }
}

/// Reconcile the contours of all bands into one set
pub struct LocalizerStep;

impl PipelineStep for LocalizerStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let StagePayload::RawContours(band_contours) = &data.payload else {
            return Err(anyhow::anyhow!(
                "Expected raw contours, got {}",
                data.payload.kind()
            ));
        };

        let localizations = localizer::localize(band_contours);
        let drawing =
            render::draw_contours(data.image.width(), data.image.height(), &localizations);

        Ok(PipelineData {
            image_id: data.image_id,
            image: DynamicImage::ImageRgb8(drawing),
            payload: StagePayload::Localizations(localizations),
        })
    }

    fn name(&self) -> &str {
        "Localization"
    }
}
