//! Quality Enhancer: deterministic exposure/contrast/sharpness normalization
//! so descriptors stay stable across capture conditions.
//!
//! Pipeline on the grayscale (luminance) plane: linear contrast boost →
//! unsharp mask → edge-preserving bilateral smoothing → contrast-limited
//! adaptive histogram equalization. The RGB preview gets the contrast and
//! sharpening steps only, since it exists for human review, not features.
//!
//! Every gain is fixed and the equalization is clip-limited, so a second
//! pass cannot runaway-amplify. No randomness anywhere.

use image::imageops;
use image::{GrayImage, RgbImage};

use crate::config::ProcessorConfig;
use crate::models::NoseRegion;
use crate::utils::filter::{bilateral, clahe, contrast_stretch};

/// Enhance a nose region in place, returning a region of identical shape
/// with adjusted pixel values
pub fn enhance(region: &NoseRegion, config: &ProcessorConfig) -> NoseRegion {
    let width = region.gray.width();
    let height = region.gray.height();

    let gain = effective_gain(region.gray.as_raw(), config.contrast_gain);

    // Luminance plane: the feature path
    let boosted = contrast_stretch(region.gray.as_raw(), gain);
    let boosted = GrayImage::from_raw(width, height, boosted)
        .unwrap_or_else(|| region.gray.clone());
    let sharpened = imageops::unsharpen(&boosted, config.unsharp_sigma, config.unsharp_threshold);
    let smoothed = bilateral(
        sharpened.as_raw(),
        width as usize,
        height as usize,
        config.bilateral_radius,
        config.bilateral_sigma_space,
        config.bilateral_sigma_range,
    );
    let equalized = clahe(
        &smoothed,
        width as usize,
        height as usize,
        config.clahe_tiles,
        config.clahe_clip,
    );
    let gray = GrayImage::from_raw(width, height, equalized)
        .unwrap_or_else(|| region.gray.clone());

    // Preview path: readable, not feature-bearing
    let preview = enhance_preview(&region.preview, gain, config);

    NoseRegion {
        gray,
        preview,
        source: region.source,
    }
}

/// Taper the configured contrast gain toward identity as the plane's
/// dynamic range approaches full scale. An already-equalized image gets
/// gain 1.0, so re-enhancing cannot runaway-amplify.
fn effective_gain(gray: &[u8], gain: f64) -> f64 {
    let min = gray.iter().min().copied().unwrap_or(0) as f64;
    let max = gray.iter().max().copied().unwrap_or(0) as f64;
    let headroom = ((255.0 - (max - min)) / 255.0).clamp(0.0, 1.0);
    1.0 + (gain - 1.0) * headroom
}

fn enhance_preview(preview: &RgbImage, gain: f64, config: &ProcessorConfig) -> RgbImage {
    let mut boosted = preview.clone();
    for pixel in boosted.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = ((*channel as f64 - 128.0) * gain + 128.0)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }
    imageops::unsharpen(&boosted, config.unsharp_sigma, config.unsharp_threshold)
}
