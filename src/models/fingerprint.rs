//! Descriptor, fingerprint, and verdict types. These are the serializable
//! contract between the pipeline, the store, and callers.

use serde::{Deserialize, Serialize};

/// Keypoint yields and response statistics from the two detectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointStats {
    /// FAST corner count
    pub fast_count: f64,
    /// Mean FAST response
    pub fast_response_mean: f64,
    /// Standard deviation of FAST responses
    pub fast_response_std: f64,
    /// Multi-scale blob count
    pub blob_count: f64,
    /// Mean blob response
    pub blob_response_mean: f64,
    /// Standard deviation of blob responses
    pub blob_response_std: f64,
}

impl KeypointStats {
    /// Total keypoints across both detectors
    pub fn total(&self) -> f64 {
        self.fast_count + self.blob_count
    }
}

/// Gradient magnitude/direction summary over the region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientStats {
    /// Mean Sobel magnitude
    pub magnitude_mean: f64,
    /// Standard deviation of Sobel magnitude
    pub magnitude_std: f64,
    /// Mean gradient direction (radians)
    pub direction_mean: f64,
    /// Standard deviation of gradient direction
    pub direction_std: f64,
}

/// Intensity statistics of the enhanced grayscale plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntensityStats {
    /// Mean intensity
    pub mean: f64,
    /// Standard deviation of intensity
    pub std: f64,
    /// Median intensity
    pub median: f64,
}

/// The fixed-layout numeric descriptor of one nose pattern.
///
/// Section order is part of the versioned extractor contract:
/// keypoint stats (6), texture histogram (10), gradient stats (4),
/// edge-density cells (16), Hu moments (7), intensity stats (3).
/// Descriptors are only comparable when their `extractor_version` matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    /// Version tag of the configuration that produced this descriptor
    pub extractor_version: String,
    /// Keypoint yields and response statistics
    pub keypoints: KeypointStats,
    /// Rotation-invariant uniform LBP histogram, L1-normalized
    pub texture: Vec<f64>,
    /// Gradient magnitude/direction summary
    pub gradients: GradientStats,
    /// Per-cell edge-density histogram, L1-normalized
    pub edge_cells: Vec<f64>,
    /// Log-scaled Hu invariant moments
    pub moments: Vec<f64>,
    /// Intensity summary of the enhanced region
    pub intensity: IntensityStats,
    /// True when any non-finite component was replaced with zero
    pub sanitized: bool,
}

impl FeatureDescriptor {
    /// Flatten into the canonical component vector (fixed order, fixed length
    /// for a given extractor version). This is the exact sequence the hasher
    /// quantizes.
    pub fn components(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(6 + self.texture.len() + 4 + self.edge_cells.len() + self.moments.len() + 3);
        out.push(self.keypoints.fast_count);
        out.push(self.keypoints.fast_response_mean);
        out.push(self.keypoints.fast_response_std);
        out.push(self.keypoints.blob_count);
        out.push(self.keypoints.blob_response_mean);
        out.push(self.keypoints.blob_response_std);
        out.extend_from_slice(&self.texture);
        out.push(self.gradients.magnitude_mean);
        out.push(self.gradients.magnitude_std);
        out.push(self.gradients.direction_mean);
        out.push(self.gradients.direction_std);
        out.extend_from_slice(&self.edge_cells);
        out.extend_from_slice(&self.moments);
        out.push(self.intensity.mean);
        out.push(self.intensity.std);
        out.push(self.intensity.median);
        out
    }

    /// The summary-statistic components compared by normalized difference:
    /// keypoint stats, gradient stats, intensity stats
    pub fn summary_stats(&self) -> Vec<f64> {
        vec![
            self.keypoints.fast_count,
            self.keypoints.fast_response_mean,
            self.keypoints.fast_response_std,
            self.keypoints.blob_count,
            self.keypoints.blob_response_mean,
            self.keypoints.blob_response_std,
            self.gradients.magnitude_mean,
            self.gradients.magnitude_std,
            self.gradients.direction_mean,
            self.gradients.direction_std,
            self.intensity.mean,
            self.intensity.std,
            self.intensity.median,
        ]
    }
}

/// The persisted identification record for one processed image.
/// Immutable once created; re-processing creates a new fingerprint that
/// supersedes the old association, it never edits this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Deterministic quantized digest used for exact-duplicate lookup
    pub pattern_hash: String,
    /// The full descriptor, kept for similarity comparison
    pub descriptor: FeatureDescriptor,
    /// Discriminativeness estimate in [0, 1]
    pub quality_score: f64,
    /// Version tag of the producing configuration
    pub extractor_version: String,
}

/// How a duplicate was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Identical pattern hash
    ExactHash,
    /// Descriptor similarity above the configured threshold
    Similarity,
}

/// Outcome of checking a fingerprint against previously stored ones.
/// Derived on demand; the caller persists it as an annotation on the
/// requesting application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateVerdict {
    /// Whether the animal already backs another application
    pub is_duplicate: bool,
    /// How the match was established, when duplicate
    pub match_kind: Option<MatchKind>,
    /// The application already holding this animal's fingerprint
    pub matched_application_id: Option<String>,
    /// Descriptor similarity to the matched fingerprint, in [0, 1]
    pub similarity_score: Option<f64>,
}

impl DuplicateVerdict {
    /// A verdict asserting no duplicate exists
    pub fn unique() -> Self {
        Self {
            is_duplicate: false,
            match_kind: None,
            matched_application_id: None,
            similarity_score: None,
        }
    }

    /// A duplicate verdict with its supporting evidence
    pub fn duplicate(kind: MatchKind, application_id: impl Into<String>, similarity: f64) -> Self {
        Self {
            is_duplicate: true,
            match_kind: Some(kind),
            matched_application_id: Some(application_id.into()),
            similarity_score: Some(similarity),
        }
    }
}
