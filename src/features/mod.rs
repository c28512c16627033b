//! Feature Extractor: turns an enhanced nose region into the fixed-layout
//! [`FeatureDescriptor`]. Section order is part of the versioned contract;
//! see [`FeatureDescriptor::components`](crate::models::FeatureDescriptor::components).

pub mod gradient;
pub mod keypoints;
pub mod moments;
pub mod texture;

use log::{debug, warn};

use crate::config::ProcessorConfig;
use crate::error::{NoseprintError, Result};
use crate::models::{FeatureDescriptor, IntensityStats, KeypointStats, NoseRegion};
use crate::utils::stats::{mean_u8, median_u8, sanitize, std_u8, variance_u8};

pub use gradient::{GradientFeatures, gradient_features};
pub use keypoints::{Keypoint, detect_blobs, detect_fast};
pub use moments::hu_moments;
pub use texture::lbp_histogram;

/// Descriptor plus side-channel measurements the descriptor does not carry
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// The canonical fixed-layout descriptor
    pub descriptor: FeatureDescriptor,
    /// Fraction of pixels above the edge threshold, before per-cell
    /// normalization. Feeds the quality score only.
    pub edge_density: f64,
}

/// Extract the canonical descriptor from an enhanced region.
///
/// Fails with `DegenerateImage` only when the region is uniform: zero
/// variance means there is nothing to extract. A region yielding zero
/// keypoints from both detectors is flagged low-quality downstream but is
/// not a failure; texture and gradient features may still discriminate.
/// Any non-finite component is replaced with 0 and recorded on the
/// descriptor's `sanitized` flag, never propagated.
pub fn extract_features(region: &NoseRegion, config: &ProcessorConfig) -> Result<Extraction> {
    let gray = &region.gray;
    let raw = gray.as_raw();

    if variance_u8(raw) == 0.0 {
        return Err(NoseprintError::DegenerateImage);
    }

    let fast = detect_fast(gray, config);
    let blobs = detect_blobs(gray, config);
    if fast.is_empty() && blobs.is_empty() {
        debug!("no keypoints from either detector; relying on texture/gradient features");
    }

    let mut sanitized = false;
    let keypoints = KeypointStats {
        fast_count: fast.len() as f64,
        fast_response_mean: sanitize(response_mean(&fast), &mut sanitized),
        fast_response_std: sanitize(response_std(&fast), &mut sanitized),
        blob_count: blobs.len() as f64,
        blob_response_mean: sanitize(response_mean(&blobs), &mut sanitized),
        blob_response_std: sanitize(response_std(&blobs), &mut sanitized),
    };

    let texture: Vec<f64> = lbp_histogram(gray)
        .into_iter()
        .map(|v| sanitize(v, &mut sanitized))
        .collect();

    let grad = gradient_features(gray, config);
    let edge_density = grad.edge_density;
    let gradients = crate::models::GradientStats {
        magnitude_mean: sanitize(grad.stats.magnitude_mean, &mut sanitized),
        magnitude_std: sanitize(grad.stats.magnitude_std, &mut sanitized),
        direction_mean: sanitize(grad.stats.direction_mean, &mut sanitized),
        direction_std: sanitize(grad.stats.direction_std, &mut sanitized),
    };
    let edge_cells: Vec<f64> = grad
        .edge_cells
        .into_iter()
        .map(|v| sanitize(v, &mut sanitized))
        .collect();

    let moments: Vec<f64> = hu_moments(gray)
        .into_iter()
        .map(|v| sanitize(v, &mut sanitized))
        .collect();

    let intensity = IntensityStats {
        mean: mean_u8(raw),
        std: std_u8(raw),
        median: median_u8(raw),
    };

    if sanitized {
        warn!("descriptor contained non-finite components; sanitized to zero");
    }

    Ok(Extraction {
        descriptor: FeatureDescriptor {
            extractor_version: config.extractor_version(),
            keypoints,
            texture,
            gradients,
            edge_cells,
            moments,
            intensity,
            sanitized,
        },
        edge_density,
    })
}

fn response_mean(keypoints: &[Keypoint]) -> f64 {
    if keypoints.is_empty() {
        return 0.0;
    }
    keypoints.iter().map(|k| k.response).sum::<f64>() / keypoints.len() as f64
}

fn response_std(keypoints: &[Keypoint]) -> f64 {
    if keypoints.is_empty() {
        return 0.0;
    }
    let mean = response_mean(keypoints);
    let var = keypoints
        .iter()
        .map(|k| {
            let d = k.response - mean;
            d * d
        })
        .sum::<f64>()
        / keypoints.len() as f64;
    var.sqrt()
}
