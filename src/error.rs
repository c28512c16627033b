use thiserror::Error;

/// Failure taxonomy of the nose-print engine.
///
/// `InvalidImage` and `InvalidRegion` are operator-correctable request
/// errors; `DegenerateImage` gets its own variant so the caller can tell the
/// operator to recapture rather than re-crop. `StoreUnavailable` wraps a
/// collaborator failure and is never downgraded to a "no duplicate" answer.
/// Low quality is deliberately *not* an error; it is a warning carried on a
/// successful result.
#[derive(Debug, Error)]
pub enum NoseprintError {
    /// The submitted payload could not be decoded as an image
    #[error("could not decode source image: {0}")]
    InvalidImage(#[from] image::ImageError),

    /// The crop rectangle (or detected region) has no usable area
    #[error("invalid nose region: {0}")]
    InvalidRegion(String),

    /// The region is uniform; there is no pattern to extract
    #[error("nose region has no extractable pattern; recapture the photo")]
    DegenerateImage,

    /// The fingerprint store collaborator could not be reached or failed
    #[error("fingerprint store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, NoseprintError>;
