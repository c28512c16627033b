//! Core data structures: crop rectangles, nose regions, descriptors,
//! fingerprints, and duplicate verdicts

pub mod fingerprint;
pub mod region;

pub use fingerprint::{
    DuplicateVerdict, FeatureDescriptor, Fingerprint, GradientStats, IntensityStats,
    KeypointStats, MatchKind,
};
pub use region::{CropRect, NoseRegion, RegionSource};
