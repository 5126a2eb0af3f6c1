use image::{GrayImage, Luma, Rgba, RgbaImage};
use tracing::warn;

use crate::config::{Config, ConfigError};

pub const BINS_KEY: &str = "pipeline.heat_threshold.bins";

/// One band fits in each channel of an RGBA image
pub const MAX_RANGES: usize = 4;

/// Inclusive intensity range of a thermal band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    pub lower: u8,
    pub upper: u8,
}

impl BandRange {
    pub fn contains(&self, value: u8) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Splits a thermal image into intensity bands.
///
/// Bands are ordered coldest first. Band `i` covers `[t_i, t_{i+1} - 1]`
/// and the hottest band runs up to 255.
#[derive(Debug, Clone)]
pub struct HeatThreshold {
    ranges: Vec<BandRange>,
}

impl HeatThreshold {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::from_bins(config.get_str(BINS_KEY)?)
    }

    /// Parse a whitespace separated list of thresholds, e.g. `"150 200 230"`
    pub fn from_bins(bins: &str) -> Result<Self, ConfigError> {
        let thresholds = bins
            .split_whitespace()
            .map(|value| {
                value.parse::<u8>().map_err(|_| ConfigError::Malformed {
                    key: BINS_KEY.to_string(),
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<u8>, ConfigError>>()?;

        Self::new(&thresholds)
    }

    pub fn new(thresholds: &[u8]) -> Result<Self, ConfigError> {
        if thresholds.is_empty() {
            return Err(ConfigError::Invalid {
                key: BINS_KEY.to_string(),
                reason: "at least one threshold is required".to_string(),
            });
        }

        let mut thresholds = thresholds.to_vec();
        if thresholds.len() > MAX_RANGES {
            warn!(
                "Only a max of {} ranges is supported, ignoring {} excess",
                MAX_RANGES,
                thresholds.len() - MAX_RANGES
            );
            thresholds.truncate(MAX_RANGES);
        }

        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid {
                key: BINS_KEY.to_string(),
                reason: format!("thresholds must be strictly ascending, got {:?}", thresholds),
            });
        }

        let ranges = thresholds
            .iter()
            .enumerate()
            .map(|(i, &lower)| {
                let upper = thresholds.get(i + 1).map(|next| next - 1).unwrap_or(u8::MAX);
                BandRange { lower, upper }
            })
            .collect();

        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[BandRange] {
        &self.ranges
    }

    pub fn band_count(&self) -> usize {
        self.ranges.len()
    }

    /// One binary mask per band
    pub fn apply(&self, image: &GrayImage) -> HeatBands {
        let masks = self
            .ranges
            .iter()
            .map(|range| threshold_band(image, *range))
            .collect();

        HeatBands {
            ranges: self.ranges.clone(),
            masks,
        }
    }

    /// Single-range mode: every pixel at or above the lowest threshold is hot
    pub fn binary(&self, image: &GrayImage) -> GrayImage {
        let lower = self.ranges[0].lower;
        threshold_band(image, BandRange { lower, upper: u8::MAX })
    }
}

/// Pixels inside `range` become 255, all others 0
pub fn threshold_band(image: &GrayImage, range: BandRange) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if range.contains(image.get_pixel(x, y)[0]) {
            Luma([u8::MAX])
        } else {
            Luma([0])
        }
    })
}

/// Band masks produced by [`HeatThreshold::apply`], coldest first
#[derive(Debug, Clone)]
pub struct HeatBands {
    pub ranges: Vec<BandRange>,
    pub masks: Vec<GrayImage>,
}

impl HeatBands {
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Pack the masks into the channels of one image, band `i` in channel `i`.
    /// Alpha is opaque when it does not carry a band.
    pub fn to_rgba(&self) -> RgbaImage {
        let (width, height) = self
            .masks
            .first()
            .map(|m| m.dimensions())
            .unwrap_or((0, 0));
        let alpha_is_band = self.masks.len() == MAX_RANGES;

        RgbaImage::from_fn(width, height, |x, y| {
            let mut channels = [0u8, 0, 0, if alpha_is_band { 0 } else { u8::MAX }];
            for (c, mask) in self.masks.iter().enumerate() {
                channels[c] = mask.get_pixel(x, y)[0];
            }
            Rgba(channels)
        })
    }

    /// Inverse of [`HeatBands::to_rgba`]
    pub fn from_rgba(image: &RgbaImage, ranges: &[BandRange]) -> HeatBands {
        let masks = (0..ranges.len().min(MAX_RANGES))
            .map(|c| GrayImage::from_fn(image.width(), image.height(), |x, y| {
                Luma([image.get_pixel(x, y)[c]])
            }))
            .collect();

        HeatBands {
            ranges: ranges.iter().take(MAX_RANGES).copied().collect(),
            masks,
        }
    }
}
