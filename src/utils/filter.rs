//! Spatial filters over flat row-major grayscale buffers.
//!
//! These are the building blocks of the quality enhancer and the feature
//! extractor: Sobel gradients, Laplacian sharpness, an edge-preserving
//! bilateral pass, and contrast-limited adaptive histogram equalization.

/// Per-pixel gradient field from a pair of 3x3 Sobel kernels.
///
/// Border pixels are skipped, so both output buffers hold
/// `(width - 2) * (height - 2)` interior samples.
pub struct GradientField {
    /// Gradient magnitudes, row-major over the interior
    pub magnitude: Vec<f64>,
    /// Gradient directions in radians (-pi, pi], row-major over the interior
    pub direction: Vec<f64>,
    /// Interior width (`width - 2`)
    pub width: usize,
    /// Interior height (`height - 2`)
    pub height: usize,
}

/// Compute Sobel gradient magnitude and direction for every interior pixel
pub fn sobel(gray: &[u8], width: usize, height: usize) -> GradientField {
    if width < 3 || height < 3 {
        return GradientField {
            magnitude: Vec::new(),
            direction: Vec::new(),
            width: 0,
            height: 0,
        };
    }

    let iw = width - 2;
    let ih = height - 2;
    let mut magnitude = Vec::with_capacity(iw * ih);
    let mut direction = Vec::with_capacity(iw * ih);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let p = |dx: isize, dy: isize| -> f64 {
                let xi = (x as isize + dx) as usize;
                let yi = (y as isize + dy) as usize;
                gray[yi * width + xi] as f64
            };

            let gx = -p(-1, -1) + p(1, -1) - 2.0 * p(-1, 0) + 2.0 * p(1, 0) - p(-1, 1) + p(1, 1);
            let gy = -p(-1, -1) - 2.0 * p(0, -1) - p(1, -1) + p(-1, 1) + 2.0 * p(0, 1) + p(1, 1);

            magnitude.push((gx * gx + gy * gy).sqrt());
            direction.push(gy.atan2(gx));
        }
    }

    GradientField {
        magnitude,
        direction,
        width: iw,
        height: ih,
    }
}

/// Variance of the 3x3 Laplacian response, the standard focus/sharpness
/// measure (a blurry region scores near zero)
pub fn laplacian_variance(gray: &[u8], width: usize, height: usize) -> f64 {
    if width < 3 || height < 3 {
        return 0.0;
    }

    let mut responses = Vec::with_capacity((width - 2) * (height - 2));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let center = gray[idx] as f64;
            let response = gray[idx - 1] as f64
                + gray[idx + 1] as f64
                + gray[idx - width] as f64
                + gray[idx + width] as f64
                - 4.0 * center;
            responses.push(response);
        }
    }

    crate::utils::stats::std_f64(&responses).powi(2)
}

/// Edge-preserving bilateral filter.
///
/// Weights combine a Gaussian on spatial distance (`sigma_space`) with a
/// Gaussian on intensity difference (`sigma_range`), so smoothing stops at
/// pattern ridges instead of washing them out.
pub fn bilateral(
    gray: &[u8],
    width: usize,
    height: usize,
    radius: usize,
    sigma_space: f64,
    sigma_range: f64,
) -> Vec<u8> {
    let mut out = vec![0u8; width * height];

    // Precomputed kernels: spatial weights per offset, range weights per diff
    let k = 2 * radius + 1;
    let mut spatial = vec![0.0f64; k * k];
    for dy in 0..k {
        for dx in 0..k {
            let fx = dx as f64 - radius as f64;
            let fy = dy as f64 - radius as f64;
            spatial[dy * k + dx] = (-(fx * fx + fy * fy) / (2.0 * sigma_space * sigma_space)).exp();
        }
    }
    let mut range = [0.0f64; 256];
    for (diff, w) in range.iter_mut().enumerate() {
        let d = diff as f64;
        *w = (-(d * d) / (2.0 * sigma_range * sigma_range)).exp();
    }

    for y in 0..height {
        for x in 0..width {
            let center = gray[y * width + x] as i32;
            let mut acc = 0.0f64;
            let mut weight_sum = 0.0f64;

            for dy in 0..k {
                let yy = y as isize + dy as isize - radius as isize;
                if yy < 0 || yy >= height as isize {
                    continue;
                }
                for dx in 0..k {
                    let xx = x as isize + dx as isize - radius as isize;
                    if xx < 0 || xx >= width as isize {
                        continue;
                    }
                    let sample = gray[yy as usize * width + xx as usize];
                    let diff = (sample as i32 - center).unsigned_abs() as usize;
                    let w = spatial[dy * k + dx] * range[diff];
                    acc += w * sample as f64;
                    weight_sum += w;
                }
            }

            out[y * width + x] = (acc / weight_sum).round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Contrast-limited adaptive histogram equalization on the luminance plane.
///
/// The image is divided into `tiles x tiles` cells; each cell gets a
/// clip-limited equalization mapping, and pixels are remapped by bilinear
/// interpolation between the four surrounding cell mappings.
pub fn clahe(gray: &[u8], width: usize, height: usize, tiles: usize, clip_limit: f64) -> Vec<u8> {
    assert!(tiles >= 1);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let tile_w = width.div_ceil(tiles);
    let tile_h = height.div_ceil(tiles);
    // Effective grid: an uneven division can leave fewer populated columns
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    // Per-tile clip-limited CDF mappings
    let mut mappings = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut histogram = [0u64; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    histogram[gray[y * width + x] as usize] += 1;
                }
            }
            let pixel_count = ((x1 - x0) * (y1 - y0)) as u64;
            let occupied: Vec<usize> = (0..256).filter(|&i| histogram[i] > 0).collect();

            // Clip, then redistribute the excess across occupied bins only.
            // Spilling it into empty bins below the occupied band would
            // inflate the low-end CDF and compress the output range.
            let limit = ((clip_limit * pixel_count as f64 / 256.0).max(1.0)) as u64;
            let mut excess = 0u64;
            for bin in histogram.iter_mut() {
                if *bin > limit {
                    excess += *bin - limit;
                    *bin = limit;
                }
            }
            if !occupied.is_empty() {
                let bonus = excess / occupied.len() as u64;
                let remainder = (excess % occupied.len() as u64) as usize;
                for (j, &i) in occupied.iter().enumerate() {
                    histogram[i] += bonus + u64::from(j < remainder);
                }
            }

            let mapping = &mut mappings[ty * tiles_x + tx];
            let mut cumulative = 0u64;
            for (value, &count) in histogram.iter().enumerate() {
                cumulative += count;
                mapping[value] = ((cumulative * 255) / pixel_count.max(1)).min(255) as u8;
            }
        }
    }

    // Bilinear interpolation between the four neighboring tile mappings
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        // Position of this row relative to tile centers
        let fy = ((y as f64 - tile_h as f64 / 2.0) / tile_h as f64)
            .clamp(0.0, (tiles_y - 1) as f64);
        let ty0 = fy.floor() as usize;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let wy = fy - ty0 as f64;

        for x in 0..width {
            let fx = ((x as f64 - tile_w as f64 / 2.0) / tile_w as f64)
                .clamp(0.0, (tiles_x - 1) as f64);
            let tx0 = fx.floor() as usize;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let wx = fx - tx0 as f64;

            let v = gray[y * width + x] as usize;
            let m00 = mappings[ty0 * tiles_x + tx0][v] as f64;
            let m01 = mappings[ty0 * tiles_x + tx1][v] as f64;
            let m10 = mappings[ty1 * tiles_x + tx0][v] as f64;
            let m11 = mappings[ty1 * tiles_x + tx1][v] as f64;

            let top = m00 * (1.0 - wx) + m01 * wx;
            let bottom = m10 * (1.0 - wx) + m11 * wx;
            out[y * width + x] = (top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Linear contrast adjustment about mid-gray: `out = (in - 128) * gain + 128`
pub fn contrast_stretch(gray: &[u8], gain: f64) -> Vec<u8> {
    gray.iter()
        .map(|&v| ((v as f64 - 128.0) * gain + 128.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sobel_vertical_edge() {
        // Left half dark, right half bright: strong horizontal gradient
        let width = 8;
        let height = 8;
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 4..width {
                gray[y * width + x] = 200;
            }
        }

        let field = sobel(&gray, width, height);
        assert_eq!(field.width, 6);
        assert_eq!(field.height, 6);
        let max_mag = field.magnitude.iter().cloned().fold(0.0f64, f64::max);
        assert!(max_mag > 400.0, "edge magnitude {max_mag} too weak");

        // Direction at the edge should be near 0 (pointing along +x)
        let (idx, _) = field
            .magnitude
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!(field.direction[idx].abs() < 0.1);
    }

    #[test]
    fn test_sobel_flat_region() {
        let gray = vec![77u8; 25];
        let field = sobel(&gray, 5, 5);
        assert!(field.magnitude.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_laplacian_variance_orders_sharpness() {
        let width = 16;
        let height = 16;
        let flat = vec![100u8; width * height];
        let mut checkered = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    checkered[y * width + x] = 255;
                }
            }
        }

        assert_eq!(laplacian_variance(&flat, width, height), 0.0);
        assert!(laplacian_variance(&checkered, width, height) > 1000.0);
    }

    #[test]
    fn test_bilateral_preserves_strong_edge() {
        let width = 10;
        let height = 10;
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 5..width {
                gray[y * width + x] = 255;
            }
        }

        let smoothed = bilateral(&gray, width, height, 2, 2.0, 25.0);
        // Pixels adjacent to the step should stay close to their side's value
        assert!(smoothed[4 * width + 4] < 30);
        assert!(smoothed[4 * width + 5] > 225);
    }

    #[test]
    fn test_clahe_spreads_low_contrast() {
        // Narrow intensity band with mild structure, expect a wider range out
        let width = 64;
        let height = 64;
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                gray[y * width + x] = 120 + ((x + y) % 16) as u8;
            }
        }

        let equalized = clahe(&gray, width, height, 8, 2.0);
        let min = *equalized.iter().min().unwrap();
        let max = *equalized.iter().max().unwrap();
        assert!(
            max - min > 150,
            "CLAHE should widen the range, got {min}..{max}"
        );
        // The occupied band must map from near-black, not float on a
        // baseline inflated by empty bins below it
        assert!(min < 40, "low end should reach near zero, got {min}");
    }

    #[test]
    fn test_clahe_is_deterministic() {
        let gray: Vec<u8> = (0..64 * 64).map(|i| (i % 251) as u8).collect();
        let a = clahe(&gray, 64, 64, 8, 2.0);
        let b = clahe(&gray, 64, 64, 8, 2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_contrast_stretch_clamps() {
        let gray = [0u8, 64, 128, 192, 255];
        let boosted = contrast_stretch(&gray, 1.3);
        assert_eq!(boosted[2], 128);
        assert_eq!(boosted[0], 0);
        assert_eq!(boosted[4], 255);
        assert!(boosted[1] < 64);
        assert!(boosted[3] > 192);
    }
}
