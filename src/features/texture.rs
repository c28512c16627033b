//! Rotation-invariant uniform local binary patterns (LBP, P=8, R=1).
//!
//! Each interior pixel compares against its 8 neighbors to form a byte
//! code. Uniform codes (at most two 0/1 transitions around the circle) are
//! binned by their number of set bits, which is rotation invariant; all
//! non-uniform codes share a single catch-all bin. The histogram is
//! L1-normalized so it is insensitive to absolute brightness.

use image::GrayImage;

use crate::config::TEXTURE_BINS;

/// Neighbor offsets in circular order starting east, counter-clockwise
const NEIGHBORS: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Compute the normalized riu2 LBP histogram of a grayscale region.
///
/// Returns all zeros for regions too small to have interior pixels.
pub fn lbp_histogram(gray: &GrayImage) -> Vec<f64> {
    let width = gray.width() as i32;
    let height = gray.height() as i32;
    let data = gray.as_raw();

    let mut counts = [0u64; TEXTURE_BINS];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let center = data[(y * width + x) as usize];
            let mut code = 0u8;
            for (i, &(dx, dy)) in NEIGHBORS.iter().enumerate() {
                let neighbor = data[((y + dy) * width + x + dx) as usize];
                if neighbor >= center {
                    code |= 1 << i;
                }
            }
            counts[riu2_bin(code)] += 1;
        }
    }

    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; TEXTURE_BINS];
    }
    counts.iter().map(|&c| c as f64 / total as f64).collect()
}

/// Map an 8-bit LBP code to its rotation-invariant uniform bin:
/// bins 0..=8 count set bits of uniform codes, bin 9 is non-uniform
fn riu2_bin(code: u8) -> usize {
    let transitions = (code ^ code.rotate_left(1)).count_ones();
    if transitions <= 2 {
        code.count_ones() as usize
    } else {
        TEXTURE_BINS - 1
    }
}
