use image::GrayImage;
use imageproc::stats::histogram;

use crate::detection::threshold::BandRange;

/// Bands holding more than this share of the busiest band are significant
pub const MIN_RELATIVE_FREQUENCY: f32 = 0.1;

/// Pixel count of every band relative to the busiest band, in band order.
/// All zeros when no pixel falls into any band.
pub fn relative_band_frequencies(image: &GrayImage, ranges: &[BandRange]) -> Vec<f32> {
    let counts = &histogram(image).channels[0];

    let frequencies: Vec<u32> = ranges
        .iter()
        .map(|r| counts[r.lower as usize..=r.upper as usize].iter().sum())
        .collect();

    let max = frequencies.iter().copied().max().unwrap_or(0).max(1);
    frequencies.iter().map(|&f| f as f32 / max as f32).collect()
}

/// Number of intensity clusters in the image: the background plus every
/// band whose relative frequency exceeds [`MIN_RELATIVE_FREQUENCY`]
pub fn cluster_count(relative_frequencies: &[f32]) -> usize {
    1 + relative_frequencies
        .iter()
        .filter(|&&f| f > MIN_RELATIVE_FREQUENCY)
        .count()
}
