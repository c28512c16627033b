//! Fingerprint Hasher: a deterministic, quantization-tolerant digest of the
//! descriptor, used as the O(1) exact-duplicate lookup key.
//!
//! Each component is quantized to a fixed decimal precision (coarse enough
//! to absorb last-digit float jitter, fine enough to stay discriminative),
//! serialized as scaled integers (stable text, unlike float formatting),
//! prefixed with the extractor version, and digested with SHA-256. The hash
//! is a lookup key, not a secret.

use sha2::{Digest, Sha256};

use crate::config::ProcessorConfig;
use crate::models::FeatureDescriptor;

/// Compute the pattern hash of a descriptor under the given configuration
pub fn pattern_hash(descriptor: &FeatureDescriptor, config: &ProcessorConfig) -> String {
    let scale = 10f64.powi(config.quantize_decimals as i32);

    let mut serialized = String::with_capacity(512);
    serialized.push_str(&config.extractor_version());
    serialized.push(':');
    for (i, component) in descriptor.components().iter().enumerate() {
        if i > 0 {
            serialized.push(',');
        }
        // Round-half-away-from-zero on the scaled value; i64 text is
        // deterministic across platforms in a way float formatting is not
        let quantized = (component * scale).round() as i64;
        serialized.push_str(&quantized.to_string());
    }

    let digest = Sha256::digest(serialized.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        // Writing to a String cannot fail
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
