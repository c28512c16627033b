//! Gradient summary features: Sobel magnitude/direction statistics
//! (overall pattern roughness and directionality) plus a spatial
//! edge-density histogram over a fixed cell grid, which the similarity
//! comparator consumes as its second histogram channel.

use image::GrayImage;

use crate::config::{EDGE_GRID, ProcessorConfig};
use crate::models::GradientStats;
use crate::utils::filter::{GradientField, sobel};
use crate::utils::stats::{mean_f64, std_f64};

/// Gradient features of one region
pub struct GradientFeatures {
    /// Magnitude/direction summary statistics
    pub stats: GradientStats,
    /// L1-normalized per-cell edge densities, `EDGE_GRID`^2 values in
    /// row-major cell order
    pub edge_cells: Vec<f64>,
    /// Fraction of interior pixels whose magnitude exceeds the edge threshold
    pub edge_density: f64,
}

/// Compute gradient statistics and the edge-density cell histogram
pub fn gradient_features(gray: &GrayImage, config: &ProcessorConfig) -> GradientFeatures {
    let field = sobel(
        gray.as_raw(),
        gray.width() as usize,
        gray.height() as usize,
    );
    let stats = GradientStats {
        magnitude_mean: mean_f64(&field.magnitude),
        magnitude_std: std_f64(&field.magnitude),
        direction_mean: mean_f64(&field.direction),
        direction_std: std_f64(&field.direction),
    };

    let (edge_cells, edge_density) = edge_cell_histogram(&field, config.edge_threshold);

    GradientFeatures {
        stats,
        edge_cells,
        edge_density,
    }
}

/// Edge pixels per grid cell, L1-normalized; also returns the overall edge
/// density used by the quality score
fn edge_cell_histogram(field: &GradientField, threshold: f64) -> (Vec<f64>, f64) {
    let cells = EDGE_GRID * EDGE_GRID;
    if field.width == 0 || field.height == 0 {
        return (vec![0.0; cells], 0.0);
    }

    let mut counts = vec![0u64; cells];
    let mut edge_total = 0u64;
    for y in 0..field.height {
        let cell_y = (y * EDGE_GRID / field.height).min(EDGE_GRID - 1);
        for x in 0..field.width {
            if field.magnitude[y * field.width + x] > threshold {
                let cell_x = (x * EDGE_GRID / field.width).min(EDGE_GRID - 1);
                counts[cell_y * EDGE_GRID + cell_x] += 1;
                edge_total += 1;
            }
        }
    }

    let density = edge_total as f64 / (field.width * field.height) as f64;
    if edge_total == 0 {
        return (vec![0.0; cells], 0.0);
    }
    let cells = counts
        .iter()
        .map(|&c| c as f64 / edge_total as f64)
        .collect();
    (cells, density)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_region_has_zero_gradients() {
        let config = ProcessorConfig::default();
        let img = GrayImage::from_pixel(32, 32, Luma([100]));
        let features = gradient_features(&img, &config);
        assert_eq!(features.stats.magnitude_mean, 0.0);
        assert_eq!(features.edge_density, 0.0);
        assert!(features.edge_cells.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_edges_concentrate_in_correct_cells() {
        let config = ProcessorConfig::default();
        // Strong vertical edge down the middle of the region
        let mut img = GrayImage::new(64, 64);
        for y in 0..64 {
            for x in 32..64 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        let features = gradient_features(&img, &config);
        assert!(features.stats.magnitude_mean > 0.0);

        let sum: f64 = features.edge_cells.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Edge sits between cell columns 1 and 2; outer columns stay empty
        for row in 0..EDGE_GRID {
            assert_eq!(features.edge_cells[row * EDGE_GRID], 0.0);
            assert_eq!(features.edge_cells[row * EDGE_GRID + EDGE_GRID - 1], 0.0);
        }
    }

    #[test]
    fn test_denser_texture_scores_higher_density() {
        let config = ProcessorConfig::default();
        let mut sparse = GrayImage::from_pixel(64, 64, Luma([100]));
        for y in 0..64 {
            sparse.put_pixel(32, y, Luma([255]));
        }
        let mut dense = GrayImage::from_pixel(64, 64, Luma([100]));
        for y in 0..64 {
            for x in (0..64).step_by(4) {
                dense.put_pixel(x, y, Luma([255]));
            }
        }
        let sparse_density = gradient_features(&sparse, &config).edge_density;
        let dense_density = gradient_features(&dense, &config).edge_density;
        assert!(dense_density > sparse_density);
    }
}
