//! Noseprint - livestock identity from nose-print biometrics
//!
//! Derives a compact fingerprint from a photograph of a cow's nose and
//! resolves whether the same animal has already been pledged on another
//! loan application. Pure Rust image pipeline: region extraction,
//! enhancement, feature extraction, hashing, similarity scoring, and a
//! duplicate resolution policy over a pluggable store.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Pipeline tuning knobs and the descriptor layout constants
pub mod config;
/// Contrast, sharpening, and noise-reduction passes on the extracted region
pub mod enhance;
/// Error taxonomy for the pipeline and the store boundary
pub mod error;
/// Keypoint, texture, gradient, and moment feature extraction
pub mod features;
/// Quantized descriptor hashing
pub mod hash;
/// Core data structures (CropRect, FeatureDescriptor, Fingerprint, verdicts)
pub mod models;
/// Duplicate resolution against a fingerprint store
pub mod policy;
/// Quality scoring of an enhanced region
pub mod quality;
/// Nose region extraction (manual crop and automatic detection)
pub mod region;
/// Weighted descriptor similarity
pub mod similarity;
/// Utility functions (statistics, binarization, components, filters)
pub mod utils;
/// Parallel batch processing
pub mod worker;

pub use config::ProcessorConfig;
pub use error::{NoseprintError, Result};
pub use models::{CropRect, DuplicateVerdict, FeatureDescriptor, Fingerprint, MatchKind};
pub use policy::{DuplicatePolicy, FingerprintStore, MemoryStore, Resolution};
pub use worker::{Submission, WorkerPool};

use image::{GenericImageView, RgbImage};
use log::{debug, warn};

/// Everything the pipeline produces for one image
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// The derived fingerprint
    pub fingerprint: Fingerprint,
    /// Enhanced color preview of the extracted region, for operator review
    pub preview: RgbImage,
    /// Quality fell below the configured floor. This is a warning, never a
    /// rejection: a low-quality fingerprint is still stored and compared.
    pub low_quality: bool,
}

/// Derive a fingerprint from encoded image bytes with default settings
///
/// # Arguments
/// * `image_bytes` - Encoded image (PNG, JPEG, ...) as uploaded
/// * `crop` - Operator-drawn nose region, or `None` for automatic detection
pub fn process(image_bytes: &[u8], crop: Option<CropRect>) -> Result<ProcessOutput> {
    NoseprintEngine::default().process(image_bytes, crop)
}

/// Pipeline front-end with configuration options
#[derive(Debug, Clone, Default)]
pub struct NoseprintEngine {
    config: ProcessorConfig,
}

impl NoseprintEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit settings
    pub fn with_config(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run the full pipeline: decode, extract the nose region, enhance,
    /// extract features, score quality, and hash.
    pub fn process(&self, image_bytes: &[u8], crop: Option<CropRect>) -> Result<ProcessOutput> {
        let image = image::load_from_memory(image_bytes)?;
        let (src_w, src_h) = image.dimensions();
        debug!("decoded {src_w}x{src_h} image ({} bytes)", image_bytes.len());

        let extracted = region::extract(&image, crop, &self.config)?;
        let enhanced = enhance::enhance(&extracted, &self.config);
        let extraction = features::extract_features(&enhanced, &self.config)?;
        let quality_score = quality::quality_score(
            &enhanced,
            &extraction.descriptor,
            extraction.edge_density,
            &self.config,
        );
        let descriptor = extraction.descriptor;
        let pattern_hash = hash::pattern_hash(&descriptor, &self.config);

        let low_quality = quality_score < self.config.low_quality_floor;
        if low_quality {
            warn!(
                "quality {quality_score:.3} below floor {:.3}, flagging for recapture",
                self.config.low_quality_floor
            );
        }

        let fingerprint = Fingerprint {
            pattern_hash,
            extractor_version: descriptor.extractor_version.clone(),
            descriptor,
            quality_score,
        };

        Ok(ProcessOutput {
            fingerprint,
            preview: enhanced.preview,
            low_quality,
        })
    }
}
