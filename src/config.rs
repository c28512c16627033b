use serde::{Deserialize, Serialize};

/// Number of rotation-invariant uniform LBP bins (P = 8 neighbors:
/// 0..=8 uniform patterns plus one catch-all)
pub const TEXTURE_BINS: usize = 10;

/// Edge-density grid is `EDGE_GRID` x `EDGE_GRID` cells
pub const EDGE_GRID: usize = 4;

/// Number of Hu invariant moments in the descriptor
pub const MOMENT_COUNT: usize = 7;

/// Full configuration of the processing pipeline.
///
/// All components are pure functions of their input plus this configuration;
/// there is no hidden processor state. Two descriptors are only comparable
/// when produced under the same [`extractor_version`](Self::extractor_version),
/// which encodes every parameter that changes the descriptor layout or the
/// hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Side length of the normalized square nose region, in pixels
    pub region_size: u32,

    /// Detection frame is downscaled so its longer side is at most this
    pub max_detect_dim: u32,
    /// Gaussian blur sigma applied before adaptive thresholding
    pub detect_blur_sigma: f32,
    /// Adaptive threshold neighborhood size (odd)
    pub adaptive_block: usize,
    /// Constant subtracted from the local mean in adaptive thresholding
    pub adaptive_c: f64,
    /// Minimum component area as a fraction of the detection frame
    pub min_region_frac: f64,
    /// Padding added around the detected bounding box, in source pixels
    pub auto_padding: u32,

    /// Contrast gain applied by the enhancer
    pub contrast_gain: f64,
    /// Unsharp-mask sigma
    pub unsharp_sigma: f32,
    /// Unsharp-mask threshold
    pub unsharp_threshold: i32,
    /// Bilateral filter radius in pixels
    pub bilateral_radius: usize,
    /// Bilateral spatial sigma
    pub bilateral_sigma_space: f64,
    /// Bilateral range (intensity) sigma
    pub bilateral_sigma_range: f64,
    /// CLAHE tile grid (tiles x tiles)
    pub clahe_tiles: usize,
    /// CLAHE clip limit
    pub clahe_clip: f64,

    /// FAST corner threshold
    pub fast_threshold: u8,
    /// Cap on keypoints kept per detector, strongest responses first
    pub max_keypoints: usize,
    /// Blob (difference-of-Gaussians) response threshold
    pub blob_threshold: f64,
    /// Sobel magnitude above which a pixel counts as an edge
    pub edge_threshold: f64,

    /// Decimal places kept when quantizing descriptor components for hashing
    pub quantize_decimals: u32,
    /// Similarity at or above which two descriptors are a duplicate
    pub similarity_threshold: f64,
    /// Quality score below which a result carries a low-quality warning
    pub low_quality_floor: f64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            region_size: 400,
            max_detect_dim: 1024,
            detect_blur_sigma: 1.0,
            adaptive_block: 11,
            adaptive_c: 2.0,
            min_region_frac: 0.001,
            auto_padding: 20,
            contrast_gain: 1.3,
            unsharp_sigma: 1.0,
            unsharp_threshold: 3,
            bilateral_radius: 2,
            bilateral_sigma_space: 2.0,
            bilateral_sigma_range: 25.0,
            clahe_tiles: 8,
            clahe_clip: 2.0,
            fast_threshold: 20,
            max_keypoints: 500,
            blob_threshold: 8.0,
            edge_threshold: 128.0,
            quantize_decimals: 3,
            similarity_threshold: 0.85,
            low_quality_floor: 0.7,
        }
    }
}

impl ProcessorConfig {
    /// Version tag recorded on every descriptor and folded into the pattern
    /// hash. Encodes the parameters that define the descriptor layout and
    /// quantization, so descriptors from differently-configured extractors
    /// never collide or compare.
    pub fn extractor_version(&self) -> String {
        format!(
            "np2-r{}-t{}-e{}-m{}-q{}",
            self.region_size,
            TEXTURE_BINS,
            EDGE_GRID * EDGE_GRID,
            MOMENT_COUNT,
            self.quantize_decimals
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_version_tag() {
        let config = ProcessorConfig::default();
        assert_eq!(config.extractor_version(), "np2-r400-t10-e16-m7-q3");
    }

    #[test]
    fn test_version_changes_with_layout_parameters() {
        let mut config = ProcessorConfig::default();
        let base = config.extractor_version();

        config.region_size = 300;
        assert_ne!(config.extractor_version(), base);

        config.region_size = 400;
        config.quantize_decimals = 2;
        assert_ne!(config.extractor_version(), base);

        // Parameters that do not change the layout keep the tag stable
        config.quantize_decimals = 3;
        config.fast_threshold = 30;
        assert_eq!(config.extractor_version(), base);
    }
}
