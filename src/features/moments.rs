//! Hu invariant moments of the grayscale region: a compact shape summary
//! that is invariant to rotation, scale, and translation. Values are
//! log-scaled because the raw invariants span many orders of magnitude.

use image::GrayImage;

use crate::config::MOMENT_COUNT;

/// Compute the seven log-scaled Hu moments.
///
/// An all-black region (zero total intensity) yields all zeros rather than
/// dividing by zero.
pub fn hu_moments(gray: &GrayImage) -> Vec<f64> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let data = gray.as_raw();

    // Raw moments up to first order for the centroid
    let mut m00 = 0.0f64;
    let mut m10 = 0.0f64;
    let mut m01 = 0.0f64;
    for y in 0..height {
        for x in 0..width {
            let v = data[y * width + x] as f64;
            m00 += v;
            m10 += x as f64 * v;
            m01 += y as f64 * v;
        }
    }
    if m00 == 0.0 {
        return vec![0.0; MOMENT_COUNT];
    }
    let cx = m10 / m00;
    let cy = m01 / m00;

    // Central moments up to third order
    let mut mu = [[0.0f64; 4]; 4];
    for y in 0..height {
        let dy = y as f64 - cy;
        for x in 0..width {
            let dx = x as f64 - cx;
            let v = data[y * width + x] as f64;
            let dx2 = dx * dx;
            let dy2 = dy * dy;
            mu[2][0] += dx2 * v;
            mu[0][2] += dy2 * v;
            mu[1][1] += dx * dy * v;
            mu[3][0] += dx2 * dx * v;
            mu[0][3] += dy2 * dy * v;
            mu[2][1] += dx2 * dy * v;
            mu[1][2] += dx * dy2 * v;
        }
    }

    // Scale-normalized central moments
    let eta = |p: usize, q: usize| -> f64 {
        let order = 1.0 + (p + q) as f64 / 2.0;
        mu[p][q] / m00.powf(order)
    };
    let n20 = eta(2, 0);
    let n02 = eta(0, 2);
    let n11 = eta(1, 1);
    let n30 = eta(3, 0);
    let n03 = eta(0, 3);
    let n21 = eta(2, 1);
    let n12 = eta(1, 2);

    let h1 = n20 + n02;
    let h2 = (n20 - n02).powi(2) + 4.0 * n11.powi(2);
    let h3 = (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2);
    let h4 = (n30 + n12).powi(2) + (n21 + n03).powi(2);
    let h5 = (n30 - 3.0 * n12) * (n30 + n12)
        * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
        + (3.0 * n21 - n03) * (n21 + n03) * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2));
    let h6 = (n20 - n02) * ((n30 + n12).powi(2) - (n21 + n03).powi(2))
        + 4.0 * n11 * (n30 + n12) * (n21 + n03);
    let h7 = (3.0 * n21 - n03) * (n30 + n12)
        * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
        - (n30 - 3.0 * n12) * (n21 + n03) * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2));

    [h1, h2, h3, h4, h5, h6, h7]
        .iter()
        .map(|&h| log_scale(h))
        .collect()
}

/// Signed log scaling: `-sign(h) * log10(|h|)`, with near-zero mapped to 0
fn log_scale(h: f64) -> f64 {
    if h.abs() < 1e-30 {
        0.0
    } else {
        -h.signum() * h.abs().log10()
    }
}
