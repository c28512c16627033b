//! Basic descriptive statistics over byte and float buffers.
//!
//! Every helper here is deterministic and total: empty input yields 0.0
//! rather than NaN so downstream descriptor components stay finite.

/// Mean of a byte buffer
pub fn mean_u8(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: u64 = data.iter().map(|&v| v as u64).sum();
    sum as f64 / data.len() as f64
}

/// Population standard deviation of a byte buffer
pub fn std_u8(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean_u8(data);
    let var: f64 = data
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum::<f64>()
        / data.len() as f64;
    var.sqrt()
}

/// Population variance of a byte buffer
pub fn variance_u8(data: &[u8]) -> f64 {
    let s = std_u8(data);
    s * s
}

/// Median of a byte buffer via a 256-bin histogram (no sort needed)
pub fn median_u8(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut histogram = [0usize; 256];
    for &v in data {
        histogram[v as usize] += 1;
    }
    let half = data.len() / 2;
    let mut seen = 0usize;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > half {
            return value as f64;
        }
    }
    255.0
}

/// Mean of a float buffer
pub fn mean_f64(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation of a float buffer
pub fn std_f64(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean_f64(data);
    let var = data
        .iter()
        .map(|&v| {
            let d = v - m;
            d * d
        })
        .sum::<f64>()
        / data.len() as f64;
    var.sqrt()
}

/// Shannon entropy (nats) of an L1-normalized histogram
pub fn entropy(histogram: &[f64]) -> f64 {
    histogram
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum()
}

/// Pearson correlation of two equal-length vectors.
///
/// Two zero-variance vectors correlate 1.0 when they are elementwise equal
/// and 0.0 otherwise, so reflexivity holds even for flat histograms.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let ma = mean_f64(a);
    let mb = mean_f64(b);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    const EPS: f64 = 1e-12;
    if va < EPS && vb < EPS {
        let equal = a.iter().zip(b.iter()).all(|(&x, &y)| (x - y).abs() < 1e-9);
        return if equal { 1.0 } else { 0.0 };
    }
    if va < EPS || vb < EPS {
        return 0.0;
    }
    cov / (va.sqrt() * vb.sqrt())
}

/// Replace a non-finite value with 0.0, raising the caller's sanitized flag
pub fn sanitize(value: f64, flagged: &mut bool) -> f64 {
    if value.is_finite() {
        value
    } else {
        *flagged = true;
        0.0
    }
}

/// Clamp a float to the unit interval
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
