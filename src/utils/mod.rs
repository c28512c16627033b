//! Pixel-level building blocks for the nose-print pipeline
//!
//! - Binarization (adaptive mean threshold, Otsu) for region detection
//! - Connected components (union-find) for selecting the nose blob
//! - Spatial filters (Sobel, Laplacian, bilateral, CLAHE)
//! - Descriptive statistics with NaN sanitizing

pub mod binarization;
pub mod components;
pub mod filter;
pub mod stats;
