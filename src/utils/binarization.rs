//! Grayscale binarization for the automatic nose-region detector.
//!
//! Masks are flat `Vec<bool>` buffers in row-major order where `true` marks
//! a foreground (dark, feature-bearing) pixel.

/// Adaptive mean thresholding with an inverse binary output.
///
/// A pixel is foreground when it is darker than the mean of its
/// `block_size`-square neighborhood minus `c`. Uses a summed-area table so
/// the cost is independent of the block size.
pub fn adaptive_threshold_inv(
    gray: &[u8],
    width: usize,
    height: usize,
    block_size: usize,
    c: f64,
) -> Vec<bool> {
    assert!(block_size % 2 == 1, "block size must be odd");
    let mut mask = vec![false; width * height];
    if width == 0 || height == 0 {
        return mask;
    }

    // Summed-area table with a one-cell apron on top/left
    let iw = width + 1;
    let mut integral = vec![0u64; iw * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += gray[y * width + x] as u64;
            integral[(y + 1) * iw + x + 1] = integral[y * iw + x + 1] + row_sum;
        }
    }

    let radius = block_size / 2;
    for y in 0..height {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height);
        for x in 0..width {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(width);

            let area = ((y1 - y0) * (x1 - x0)) as f64;
            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0];
            let local_mean = sum as f64 / area;

            mask[y * width + x] = (gray[y * width + x] as f64) < local_mean - c;
        }
    }

    mask
}

/// Otsu's optimal global threshold from the intensity histogram.
///
/// Single cumulative pass over the histogram; maximizes between-class
/// variance. Pixels strictly below the returned value form the dark
/// class, so masking with `v < t` recovers the optimal split.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &n)| v as f64 * n as f64)
        .sum();

    let mut best_threshold = 128u8;
    let mut best_variance = 0.0;
    let mut background_count = 0.0;
    let mut background_sum = 0.0;

    for threshold in 0..256usize {
        background_count += histogram[threshold] as f64;
        if background_count == 0.0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0.0 {
            break;
        }
        background_sum += threshold as f64 * histogram[threshold] as f64;

        let mean_bg = background_sum / background_count;
        let mean_fg = (total_sum - background_sum) / foreground_count;
        let between = background_count * foreground_count * (mean_bg - mean_fg).powi(2);

        // Bin `threshold` sits in the background here, so the exclusive
        // upper bound is one above it. A scored split always has a
        // nonempty foreground, keeping threshold <= 254.
        if between > best_variance {
            best_variance = between;
            best_threshold = (threshold + 1) as u8;
        }
    }

    best_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_threshold_marks_dark_spot() {
        // Bright field with one dark 3x3 blob in the middle
        let width = 15;
        let height = 15;
        let mut gray = vec![200u8; width * height];
        for y in 6..9 {
            for x in 6..9 {
                gray[y * width + x] = 20;
            }
        }

        let mask = adaptive_threshold_inv(&gray, width, height, 11, 2.0);
        assert!(mask[7 * width + 7], "blob center should be foreground");
        assert!(!mask[width + 1], "bright corner should be background");
    }

    #[test]
    fn test_adaptive_threshold_uniform_image_is_empty() {
        let gray = vec![128u8; 64];
        let mask = adaptive_threshold_inv(&gray, 8, 8, 5, 2.0);
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn test_otsu_separates_two_classes() {
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);
        let t = otsu_threshold(&gray);
        assert!(t > 50 && t <= 200, "threshold {t} should split the classes");
    }

    #[test]
    fn test_otsu_threshold_masks_dark_class() {
        // Masking below the returned threshold must recover exactly the
        // dark half of a bimodal image
        let mut gray = vec![50u8; 50];
        gray.extend(vec![200u8; 50]);
        let t = otsu_threshold(&gray);
        let dark = gray.iter().filter(|&&v| v < t).count();
        assert_eq!(dark, 50, "threshold {t} should isolate the dark class");
    }
}
