//! Similarity Comparator: a bounded [0, 1] similarity between two
//! descriptors, used for near-duplicate detection when hashes differ.
//!
//! Four independent sub-comparisons with fixed weights summing to 1:
//! texture-histogram correlation (0.40), edge-density-cell correlation
//! (0.30), normalized difference over summary statistics (0.20), and
//! normalized difference over Hu moments (0.10). Each sub-score is clamped
//! to [0, 1] before weighting, so no malformed component can push the
//! aggregate out of range or dominate unboundedly. A missing or
//! length-mismatched sub-vector contributes zero to its term.

use crate::models::FeatureDescriptor;
use crate::utils::stats::{clamp01, pearson};

const WEIGHT_TEXTURE: f64 = 0.40;
const WEIGHT_EDGES: f64 = 0.30;
const WEIGHT_STATS: f64 = 0.20;
const WEIGHT_MOMENTS: f64 = 0.10;

/// Compare two descriptors. Symmetric, reflexive, always in [0, 1].
pub fn similarity(a: &FeatureDescriptor, b: &FeatureDescriptor) -> f64 {
    let texture = histogram_term(&a.texture, &b.texture);
    let edges = histogram_term(&a.edge_cells, &b.edge_cells);
    let stats = normalized_difference_term(&a.summary_stats(), &b.summary_stats());
    let moments = normalized_difference_term(&a.moments, &b.moments);

    clamp01(
        WEIGHT_TEXTURE * texture
            + WEIGHT_EDGES * edges
            + WEIGHT_STATS * stats
            + WEIGHT_MOMENTS * moments,
    )
}

/// Correlation of two histograms, clamped so anti-correlation scores zero
fn histogram_term(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    clamp01(pearson(a, b))
}

/// Mean per-component agreement `1 - |x - y| / max(|x|, |y|)`, clamped.
/// Equal components (including both zero) agree fully.
fn normalized_difference_term(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let denom = x.abs().max(y.abs());
            if denom < 1e-12 {
                1.0
            } else {
                clamp01(1.0 - (x - y).abs() / denom)
            }
        })
        .sum();
    clamp01(total / a.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EDGE_GRID, MOMENT_COUNT, TEXTURE_BINS};
    use crate::models::{GradientStats, IntensityStats, KeypointStats};

    fn descriptor(texture_peak: usize, magnitude: f64) -> FeatureDescriptor {
        let mut texture = vec![0.05; TEXTURE_BINS];
        texture[texture_peak] = 0.55;
        let mut edge_cells = vec![1.0 / 32.0; EDGE_GRID * EDGE_GRID];
        edge_cells[texture_peak % (EDGE_GRID * EDGE_GRID)] = 0.5;

        FeatureDescriptor {
            extractor_version: "np2-test".into(),
            keypoints: KeypointStats {
                fast_count: 150.0,
                fast_response_mean: 28.0,
                fast_response_std: 6.0,
                blob_count: 60.0,
                blob_response_mean: 11.0,
                blob_response_std: 2.5,
            },
            texture,
            gradients: GradientStats {
                magnitude_mean: magnitude,
                magnitude_std: magnitude / 2.0,
                direction_mean: 0.1,
                direction_std: 1.8,
            },
            edge_cells,
            moments: vec![2.0, 5.0, 9.0, 9.5, 19.0, 12.0, 19.5]
                .into_iter()
                .take(MOMENT_COUNT)
                .collect(),
            intensity: IntensityStats {
                mean: 128.0,
                std: 40.0,
                median: 127.0,
            },
            sanitized: false,
        }
    }

    #[test]
    fn test_reflexive() {
        let d = descriptor(2, 60.0);
        assert!((similarity(&d, &d) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let a = descriptor(2, 60.0);
        let b = descriptor(7, 95.0);
        assert_eq!(similarity(&a, &b), similarity(&b, &a));
    }

    #[test]
    fn test_bounded() {
        let a = descriptor(2, 60.0);
        let mut weird = descriptor(7, 1e9);
        weird.moments = vec![-1e12; MOMENT_COUNT];
        let s = similarity(&a, &weird);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_different_patterns_score_lower() {
        let a = descriptor(2, 60.0);
        let near = descriptor(2, 63.0);
        let far = descriptor(8, 200.0);
        assert!(similarity(&a, &near) > similarity(&a, &far));
    }

    #[test]
    fn test_missing_subvector_contributes_zero() {
        let a = descriptor(2, 60.0);
        let mut b = a.clone();
        b.texture = Vec::new();
        let s = similarity(&a, &b);
        // The texture term is gone; everything else still matches perfectly
        assert!((s - (1.0 - WEIGHT_TEXTURE)).abs() < 1e-9);
    }

    #[test]
    fn test_mismatched_lengths_contribute_zero() {
        let a = descriptor(2, 60.0);
        let mut b = a.clone();
        b.moments.pop();
        let s = similarity(&a, &b);
        assert!((s - (1.0 - WEIGHT_MOMENTS)).abs() < 1e-9);
    }
}
