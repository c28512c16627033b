//! Crop rectangles and the normalized nose region the pipeline works on

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Operator-supplied crop rectangle in source-image pixel coordinates.
///
/// Coordinates are signed: operator UIs routinely send rectangles that hang
/// off the image edge, and those are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
}

impl CropRect {
    /// Create a crop rectangle
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect with an image of the given dimensions.
    ///
    /// Returns `(x, y, width, height)` in unsigned pixel coordinates, or
    /// `None` when the clamped rectangle has zero area.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(image_width as i64);
        let y1 = (self.y + self.height).min(image_height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// How the nose region was selected from the source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Operator-supplied crop rectangle
    Manual,
    /// Automatic contour-based detection
    AutoDetected,
    /// Automatic detection found nothing; centered fallback square
    CenterFallback,
}

/// The normalized nose region: a fixed-size grayscale working plane plus an
/// RGB preview retained for human review. Ephemeral, owned by the pipeline
/// for one extraction and never persisted independently of its descriptor.
#[derive(Debug, Clone)]
pub struct NoseRegion {
    /// Grayscale plane the features are computed on
    pub gray: GrayImage,
    /// RGB copy of the same crop, kept for auditable preview output
    pub preview: RgbImage,
    /// How the region was chosen
    pub source: RegionSource,
}

impl NoseRegion {
    /// Side length of the square region
    pub fn size(&self) -> u32 {
        self.gray.width()
    }
}
