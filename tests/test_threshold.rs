mod common;

use common::*;
use fumarole_localization::ConfigError;
use fumarole_localization::detection::threshold::{BandRange, HeatBands, HeatThreshold};
use image::Luma;

#[test]
fn test_bands_split_at_thresholds() {
    let threshold = HeatThreshold::from_bins("100 200").unwrap();

    assert_eq!(
        threshold.ranges(),
        &[
            BandRange { lower: 100, upper: 199 },
            BandRange { lower: 200, upper: 255 },
        ]
    );
}

#[test]
fn test_pixels_land_in_exactly_one_band() {
    let mut img = blank_image(4, 1);
    img.put_pixel(0, 0, Luma([50]));
    img.put_pixel(1, 0, Luma([150]));
    img.put_pixel(2, 0, Luma([200]));
    img.put_pixel(3, 0, Luma([255]));

    let bands = HeatThreshold::from_bins("100 200").unwrap().apply(&img);
    assert_eq!(bands.len(), 2);

    let cold = &bands.masks[0];
    let hot = &bands.masks[1];
    assert_eq!([cold[(0, 0)][0], cold[(1, 0)][0], cold[(2, 0)][0], cold[(3, 0)][0]], [0, 255, 0, 0]);
    assert_eq!([hot[(0, 0)][0], hot[(1, 0)][0], hot[(2, 0)][0], hot[(3, 0)][0]], [0, 0, 255, 255]);
}

#[test]
fn test_binary_mode_uses_lowest_threshold() {
    let mut img = blank_image(3, 1);
    img.put_pixel(0, 0, Luma([99]));
    img.put_pixel(1, 0, Luma([100]));
    img.put_pixel(2, 0, Luma([250]));

    let binary = HeatThreshold::from_bins("100 200").unwrap().binary(&img);
    assert_eq!([binary[(0, 0)][0], binary[(1, 0)][0], binary[(2, 0)][0]], [0, 255, 255]);
}

#[test]
fn test_non_numeric_bins_fail() {
    let err = HeatThreshold::from_bins("100 hot").unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { ref value, .. } if value == "hot"));

    let err = HeatThreshold::from_bins("100 300").unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { .. }));
}

#[test]
fn test_invalid_bins_fail() {
    assert!(matches!(HeatThreshold::from_bins("").unwrap_err(), ConfigError::Invalid { .. }));
    assert!(matches!(HeatThreshold::from_bins("200 100").unwrap_err(), ConfigError::Invalid { .. }));
}

#[test]
fn test_excess_bins_are_ignored() {
    let threshold = HeatThreshold::from_bins("50 100 150 200 250").unwrap();

    assert_eq!(threshold.band_count(), 4);
    assert_eq!(threshold.ranges()[3], BandRange { lower: 200, upper: 255 });
}

#[test]
fn test_rgba_channels_hold_bands() {
    let mut img = blank_image(2, 1);
    img.put_pixel(0, 0, Luma([150]));
    img.put_pixel(1, 0, Luma([230]));

    let threshold = HeatThreshold::from_bins("100 200").unwrap();
    let bands = threshold.apply(&img);
    let rgba = bands.to_rgba();

    assert_eq!(rgba[(0, 0)].0, [255, 0, 0, 255]);
    assert_eq!(rgba[(1, 0)].0, [0, 255, 0, 255]);

    let decomposed = HeatBands::from_rgba(&rgba, threshold.ranges());
    assert_eq!(decomposed.masks, bands.masks);
}

#[test]
fn test_threshold_from_config() {
    let threshold = HeatThreshold::from_config(&test_config()).unwrap();
    assert_eq!(threshold.ranges(), &[BandRange { lower: 128, upper: 255 }]);
}
