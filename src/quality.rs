//! Quality scoring: a [0, 1] estimate of how discriminative and reliable a
//! descriptor is. Four clamped, weighted factors (keypoint yield, local
//! sharpness, edge density, texture entropy). A low score is a warning for
//! the caller, never a rejection.

use log::debug;

use crate::config::{ProcessorConfig, TEXTURE_BINS};
use crate::models::{FeatureDescriptor, NoseRegion};
use crate::utils::filter::laplacian_variance;
use crate::utils::stats::{clamp01, entropy};

/// Keypoint yield saturates its 0.3 share at this many combined keypoints
const KEYPOINT_SATURATION: f64 = 200.0;
/// Laplacian variance saturating the 0.3 sharpness share
const SHARPNESS_SATURATION: f64 = 500.0;
/// Edge density saturating the 0.2 edge share
const EDGE_SATURATION: f64 = 0.1;

/// Score a descriptor against the enhanced region it came from.
///
/// Factor weights follow the shares 0.3 keypoints + 0.3 sharpness +
/// 0.2 edges + 0.2 texture entropy. A descriptor that needed NaN/Inf
/// sanitizing is halved: its components are no longer fully trustworthy.
pub fn quality_score(
    region: &NoseRegion,
    descriptor: &FeatureDescriptor,
    edge_density: f64,
    config: &ProcessorConfig,
) -> f64 {
    let keypoint_score = 0.3 * clamp01(descriptor.keypoints.total() / KEYPOINT_SATURATION);

    let sharpness = laplacian_variance(
        region.gray.as_raw(),
        region.gray.width() as usize,
        region.gray.height() as usize,
    );
    let sharpness_score = 0.3 * clamp01(sharpness / SHARPNESS_SATURATION);

    let edge_score = 0.2 * clamp01(edge_density / EDGE_SATURATION);

    let max_entropy = (TEXTURE_BINS as f64).ln();
    let texture_score = 0.2 * clamp01(entropy(&descriptor.texture) / max_entropy);

    let mut score = keypoint_score + sharpness_score + edge_score + texture_score;
    if descriptor.sanitized {
        score *= 0.5;
    }
    let score = clamp01(score);

    debug!(
        "quality {:.3} (keypoints {:.3}, sharpness {:.3}, edges {:.3}, texture {:.3})",
        score, keypoint_score, sharpness_score, edge_score, texture_score
    );
    if score < config.low_quality_floor {
        debug!("score below low-quality floor {}", config.low_quality_floor);
    }
    score
}
