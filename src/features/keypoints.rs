//! Two complementary keypoint detectors over the enhanced region:
//! a FAST-9/16 corner detector (the fast, binary-descriptor-style detector)
//! and a multi-scale difference-of-Gaussians blob detector (the
//! scale-invariant-style detector). Only counts and response statistics
//! enter the descriptor; positions are used for non-max suppression only.

use image::imageops;
use image::GrayImage;

use crate::config::ProcessorConfig;

/// A detected interest point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Column in region pixels
    pub x: u32,
    /// Row in region pixels
    pub y: u32,
    /// Detector response (higher is stronger)
    pub response: f64,
}

/// Bresenham circle of radius 3 used by FAST, in circular order
const FAST_CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// FAST-9/16 corner detection with 3x3 non-max suppression.
///
/// A pixel is a corner when at least 9 contiguous circle pixels are all
/// brighter than center + threshold or all darker than center - threshold.
/// Response is the sum of absolute differences over the circle pixels that
/// exceed the threshold.
pub fn detect_fast(gray: &GrayImage, config: &ProcessorConfig) -> Vec<Keypoint> {
    let width = gray.width() as i32;
    let height = gray.height() as i32;
    let data = gray.as_raw();
    let threshold = config.fast_threshold as i32;

    let mut responses = vec![0.0f64; (width * height) as usize];
    for y in 3..height - 3 {
        for x in 3..width - 3 {
            let center = data[(y * width + x) as usize] as i32;

            let mut bright_mask = 0u16;
            let mut dark_mask = 0u16;
            let mut response = 0.0f64;
            for (i, &(dx, dy)) in FAST_CIRCLE.iter().enumerate() {
                let sample = data[((y + dy) * width + x + dx) as usize] as i32;
                let diff = sample - center;
                if diff > threshold {
                    bright_mask |= 1 << i;
                    response += (diff - threshold) as f64;
                } else if diff < -threshold {
                    dark_mask |= 1 << i;
                    response += (-diff - threshold) as f64;
                }
            }

            if has_contiguous_arc(bright_mask, 9) || has_contiguous_arc(dark_mask, 9) {
                responses[(y * width + x) as usize] = response;
            }
        }
    }

    suppress_and_cap(&responses, width as usize, height as usize, config.max_keypoints)
}

/// Longest circular run of set bits in a 16-bit mask reaches `min_run`
fn has_contiguous_arc(mask: u16, min_run: u32) -> bool {
    if mask == 0 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }
    // Doubling the mask makes wraparound runs contiguous
    let doubled = (mask as u32) | ((mask as u32) << 16);
    let mut run = 0u32;
    let mut best = 0u32;
    for i in 0..32 {
        if doubled & (1 << i) != 0 {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best >= min_run
}

/// Multi-scale blob detection via difference of Gaussians.
///
/// Three octave-spaced blur levels give two DoG planes; a keypoint is a
/// local 3x3 maximum of |DoG| above the configured response threshold.
pub fn detect_blobs(gray: &GrayImage, config: &ProcessorConfig) -> Vec<Keypoint> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    if width < 3 || height < 3 {
        return Vec::new();
    }

    let sigmas = [1.0f32, 2.0, 4.0];
    let blurred: Vec<GrayImage> = sigmas
        .iter()
        .map(|&sigma| imageops::blur(gray, sigma))
        .collect();

    let mut all = Vec::new();
    for pair in blurred.windows(2) {
        let fine = pair[0].as_raw();
        let coarse = pair[1].as_raw();
        let dog: Vec<f64> = fine
            .iter()
            .zip(coarse.iter())
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .collect();

        let mut responses = vec![0.0f64; width * height];
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let idx = y * width + x;
                let v = dog[idx];
                if v < config.blob_threshold {
                    continue;
                }
                let is_peak = [
                    idx - width - 1,
                    idx - width,
                    idx - width + 1,
                    idx - 1,
                    idx + 1,
                    idx + width - 1,
                    idx + width,
                    idx + width + 1,
                ]
                .iter()
                .all(|&n| dog[n] <= v);
                if is_peak {
                    responses[idx] = v;
                }
            }
        }
        all.extend(suppress_and_cap(
            &responses,
            width,
            height,
            config.max_keypoints,
        ));
    }

    // Keep the strongest across levels under the shared cap
    all.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(std::cmp::Ordering::Equal));
    all.truncate(config.max_keypoints);
    all
}

/// 3x3 non-max suppression over a response grid, then keep the strongest
/// `cap` responses
fn suppress_and_cap(responses: &[f64], width: usize, height: usize, cap: usize) -> Vec<Keypoint> {
    let mut keypoints = Vec::new();
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let idx = y * width + x;
            let v = responses[idx];
            if v <= 0.0 {
                continue;
            }
            let neighbors = [
                responses[idx - width - 1],
                responses[idx - width],
                responses[idx - width + 1],
                responses[idx - 1],
                responses[idx + 1],
                responses[idx + width - 1],
                responses[idx + width],
                responses[idx + width + 1],
            ];
            if neighbors.iter().all(|&n| n <= v) {
                keypoints.push(Keypoint {
                    x: x as u32,
                    y: y as u32,
                    response: v,
                });
            }
        }
    }

    keypoints.sort_by(|a, b| {
        b.response
            .partial_cmp(&a.response)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
    });
    keypoints.truncate(cap);
    keypoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn dotted_field(size: u32, spacing: u32) -> GrayImage {
        // Isolated bright dots on a dark field; every dot's full Bresenham
        // circle is darker, so the segment test fires at each one
        let mut img = GrayImage::from_pixel(size, size, Luma([20]));
        for y in (spacing / 2..size).step_by(spacing as usize) {
            for x in (spacing / 2..size).step_by(spacing as usize) {
                img.put_pixel(x, y, Luma([230]));
            }
        }
        img
    }

    #[test]
    fn test_contiguous_arc() {
        assert!(has_contiguous_arc(0b0000_0001_1111_1111, 9));
        assert!(!has_contiguous_arc(0b0000_0000_1111_1111, 9));
        // Wraparound run: 5 high bits + 4 low bits
        assert!(has_contiguous_arc(0b1111_1000_0000_1111, 9));
        assert!(!has_contiguous_arc(0, 9));
        assert!(has_contiguous_arc(u16::MAX, 16));
    }

    #[test]
    fn test_fast_finds_isolated_bright_dots() {
        let config = ProcessorConfig::default();
        let img = dotted_field(64, 8);
        let keypoints = detect_fast(&img, &config);
        assert!(!keypoints.is_empty(), "bright dots should trigger FAST");
        assert!(keypoints.len() <= config.max_keypoints);
        assert!(keypoints.iter().all(|k| k.response > 0.0));
        // Detections land on dot centers, never on the flat field
        assert!(
            keypoints
                .iter()
                .all(|k| img.get_pixel(k.x, k.y)[0] == 230)
        );
    }

    #[test]
    fn test_fast_flat_image_yields_nothing() {
        let config = ProcessorConfig::default();
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert!(detect_fast(&img, &config).is_empty());
        assert!(detect_blobs(&img, &config).is_empty());
    }

    #[test]
    fn test_blobs_find_isolated_spot() {
        let config = ProcessorConfig::default();
        let mut img = GrayImage::from_pixel(64, 64, Luma([200]));
        for y in 28..36 {
            for x in 28..36 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        let blobs = detect_blobs(&img, &config);
        assert!(!blobs.is_empty(), "dark spot should register as a blob");
        // The strongest response should sit near the spot boundary/center
        let k = blobs[0];
        assert!(k.x >= 20 && k.x <= 44 && k.y >= 20 && k.y <= 44);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let config = ProcessorConfig::default();
        let img = dotted_field(64, 8);
        assert_eq!(detect_fast(&img, &config), detect_fast(&img, &config));
        assert_eq!(detect_blobs(&img, &config), detect_blobs(&img, &config));
    }
}
