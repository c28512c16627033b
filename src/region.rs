//! Region Extractor: isolate the normalized nose region from a full-face
//! photograph, either from an operator-supplied crop rectangle or by a
//! deterministic contour-based fallback.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};
use log::debug;

use crate::config::ProcessorConfig;
use crate::error::{NoseprintError, Result};
use crate::models::{CropRect, NoseRegion, RegionSource};
use crate::utils::binarization::{adaptive_threshold_inv, otsu_threshold};
use crate::utils::components::largest_component;

/// Extract the nose region from a decoded source image.
///
/// With a crop: the rectangle is clamped to the image bounds and fails with
/// `InvalidRegion` only when the clamped area collapses to zero. Without a
/// crop: grayscale → blur → adaptive threshold → largest connected dark
/// component above a minimum-area floor, padded by a fixed margin; if
/// nothing qualifies, a centered square sized to one third of the shorter
/// image dimension. Either way the selected rectangle is resampled to the
/// configured square size with smooth (Catmull-Rom) interpolation.
///
/// Pure function of the image, crop, and configuration.
pub fn extract(
    image: &DynamicImage,
    crop: Option<CropRect>,
    config: &ProcessorConfig,
) -> Result<NoseRegion> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(NoseprintError::InvalidRegion(
            "source image has zero area".into(),
        ));
    }

    let (rect, source) = match crop {
        Some(rect) => {
            let clamped = rect.clamp_to(width, height).ok_or_else(|| {
                NoseprintError::InvalidRegion(format!(
                    "crop {rect:?} has no overlap with {width}x{height} image"
                ))
            })?;
            (clamped, RegionSource::Manual)
        }
        None => auto_detect(image, config),
    };

    debug!(
        "nose region {:?} at ({}, {}) {}x{} from {}x{} source",
        source, rect.0, rect.1, rect.2, rect.3, width, height
    );

    Ok(normalize(image, rect, source, config))
}

/// Crop and resample the selected rectangle into the fixed-size region
fn normalize(
    image: &DynamicImage,
    rect: (u32, u32, u32, u32),
    source: RegionSource,
    config: &ProcessorConfig,
) -> NoseRegion {
    let (x, y, w, h) = rect;
    let cropped = image.crop_imm(x, y, w, h);
    let resized = cropped.resize_exact(
        config.region_size,
        config.region_size,
        FilterType::CatmullRom,
    );

    NoseRegion {
        gray: resized.to_luma8(),
        preview: resized.to_rgb8(),
        source,
    }
}

/// Deterministic fallback detection when no crop was supplied
fn auto_detect(
    image: &DynamicImage,
    config: &ProcessorConfig,
) -> ((u32, u32, u32, u32), RegionSource) {
    let (width, height) = image.dimensions();

    // Work on a bounded detection frame so cost is independent of the
    // operator's camera resolution
    let longer = width.max(height);
    let scale = if longer > config.max_detect_dim {
        longer as f64 / config.max_detect_dim as f64
    } else {
        1.0
    };
    let frame_w = (width as f64 / scale).round().max(1.0) as u32;
    let frame_h = (height as f64 / scale).round().max(1.0) as u32;

    let gray = imageops::resize(&image.to_luma8(), frame_w, frame_h, FilterType::Triangle);
    let blurred = imageops::blur(&gray, config.detect_blur_sigma);

    let mask = adaptive_threshold_inv(
        blurred.as_raw(),
        frame_w as usize,
        frame_h as usize,
        config.adaptive_block,
        config.adaptive_c,
    );

    let min_area = (config.min_region_frac * frame_w as f64 * frame_h as f64) as usize;
    let mut candidate = largest_component(&mask, frame_w as usize, frame_h as usize)
        .filter(|c| c.area >= min_area.max(1));

    // Local thresholding can shred a large even-toned nose into fragments;
    // retry with a global Otsu split before giving up
    if candidate.is_none() {
        let threshold = otsu_threshold(blurred.as_raw());
        let global_mask: Vec<bool> = blurred.as_raw().iter().map(|&v| v < threshold).collect();
        candidate = largest_component(&global_mask, frame_w as usize, frame_h as usize)
            .filter(|c| c.area >= min_area.max(1));
    }

    match candidate {
        Some(component) => {
            // Pad the bounding box, then map back to source coordinates
            let pad = (config.auto_padding as f64 / scale).round() as i64;
            let x0 = ((component.min_x as i64 - pad).max(0) as f64 * scale) as u32;
            let y0 = ((component.min_y as i64 - pad).max(0) as f64 * scale) as u32;
            let x1 = (((component.max_x as i64 + 1 + pad) as f64 * scale) as u32).min(width);
            let y1 = (((component.max_y as i64 + 1 + pad) as f64 * scale) as u32).min(height);

            debug!(
                "auto-detected component area {} in {}x{} frame",
                component.area, frame_w, frame_h
            );
            ((x0, y0, x1 - x0, y1 - y0), RegionSource::AutoDetected)
        }
        None => {
            // Centered square, one third of the shorter dimension
            let side = (width.min(height) / 3).max(1);
            let x = (width - side) / 2;
            let y = (height - side) / 2;
            debug!("no component above area floor; using centered fallback");
            ((x, y, side, side), RegionSource::CenterFallback)
        }
    }
}
