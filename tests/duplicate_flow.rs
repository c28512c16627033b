//! End-to-end tests of the duplicate resolution flow.
//!
//! These run the real pipeline over synthetic nose textures: a spotted
//! pattern with a spatial density gradient stands in for a nose print, and
//! a smooth ramp stands in for a different animal. The near-duplicate case
//! re-crops the same canvas two pixels over and brightens it five percent,
//! the kind of drift two photos of the same nose actually show.

use std::io::Cursor;

use anyhow::anyhow;
use image::{GrayImage, ImageFormat, Luma};
use noseprint::policy::{InsertOutcome, StoredFingerprint};
use noseprint::{
    CropRect, DuplicatePolicy, Fingerprint, FingerprintStore, MatchKind, MemoryStore,
    NoseprintEngine, NoseprintError, Submission, WorkerPool,
};

/// Spotted canvas with spot density increasing toward the bottom-right.
/// The gradient gives the edge-cell histogram real variance, so small
/// crops shift it smoothly instead of scrambling it.
fn nose_canvas(size: u32, seed: u32) -> GrayImage {
    let mut img = GrayImage::from_fn(size, size, |x, _| Luma([200 - (30 * x / size) as u8]));
    let mut state = seed.wrapping_mul(2654435761).max(1);
    let mut next = || {
        state = state.wrapping_mul(1664525).wrapping_add(1013904223);
        state >> 16
    };
    let spots = (size * size) / 40;
    for _ in 0..spots {
        let cx = next() % size;
        let cy = next() % size;
        // Acceptance probability grows with (x + y): denser lower-right
        if (next() % (2 * size)) > cx + cy {
            continue;
        }
        let radius = 1 + (next() % 3) as i64;
        let shade = 60 + (next() % 50) as u8;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let px = cx as i64 + dx;
                let py = cy as i64 + dy;
                if px >= 0 && py >= 0 && (px as u32) < size && (py as u32) < size {
                    img.put_pixel(px as u32, py as u32, Luma([shade]));
                }
            }
        }
    }
    img
}

/// Smooth diagonal ramp: valid image, completely different texture
fn ramp_canvas(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| Luma([(40 + (x + y) * 150 / (2 * size)) as u8]))
}

fn brighten(img: &GrayImage, factor: f64) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = (img.get_pixel(x, y)[0] as f64 * factor).round();
        Luma([v.clamp(0.0, 255.0) as u8])
    })
}

fn png_bytes(img: &GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG encoding");
    bytes
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn crop(x: i64, y: i64, side: i64) -> Option<CropRect> {
    Some(CropRect {
        x,
        y,
        width: side,
        height: side,
    })
}

#[test]
fn test_first_submission_is_unique_and_stored() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());
    let bytes = png_bytes(&nose_canvas(500, 42));

    let resolution = policy.resolve(&bytes, crop(60, 60, 380), "app-1").unwrap();
    assert!(!resolution.verdict.is_duplicate);
    assert_eq!(policy.store().len(), 1);
    assert_eq!(resolution.fingerprint.pattern_hash.len(), 64);
}

#[test]
fn test_identical_bytes_match_by_exact_hash() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());
    let bytes = png_bytes(&nose_canvas(500, 42));

    policy.resolve(&bytes, crop(60, 60, 380), "app-1").unwrap();
    let resolution = policy.resolve(&bytes, crop(60, 60, 380), "app-2").unwrap();

    assert!(resolution.verdict.is_duplicate);
    assert_eq!(resolution.verdict.match_kind, Some(MatchKind::ExactHash));
    assert_eq!(
        resolution.verdict.matched_application_id.as_deref(),
        Some("app-1")
    );
    assert_eq!(policy.store().len(), 1, "duplicates are never stored");
}

#[test]
fn test_recropped_brightened_photo_matches_by_similarity() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());
    let canvas = nose_canvas(500, 42);

    let original = png_bytes(&canvas);
    let retaken = png_bytes(&brighten(&canvas, 1.05));

    policy.resolve(&original, crop(60, 60, 380), "app-1").unwrap();
    let resolution = policy
        .resolve(&retaken, crop(62, 62, 380), "app-2")
        .unwrap();

    assert!(
        resolution.verdict.is_duplicate,
        "re-cropped brightened photo must match, score {:?}",
        resolution.verdict.similarity_score
    );
    assert_eq!(resolution.verdict.match_kind, Some(MatchKind::Similarity));
    assert_eq!(
        resolution.verdict.matched_application_id.as_deref(),
        Some("app-1")
    );
    let score = resolution.verdict.similarity_score.unwrap();
    assert!((0.85..=1.0).contains(&score), "score {score}");
}

#[test]
fn test_different_texture_is_unique() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());

    policy
        .resolve(&png_bytes(&nose_canvas(500, 42)), crop(60, 60, 380), "app-1")
        .unwrap();
    let resolution = policy
        .resolve(&png_bytes(&ramp_canvas(500)), crop(60, 60, 380), "app-2")
        .unwrap();

    assert!(!resolution.verdict.is_duplicate);
    assert_eq!(policy.store().len(), 2);
}

#[test]
fn test_resubmission_supersedes_own_fingerprint() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());
    let canvas = nose_canvas(500, 42);

    policy
        .resolve(&png_bytes(&canvas), crop(60, 60, 380), "app-1")
        .unwrap();
    // Same application retakes the photo: not a duplicate of itself
    let resolution = policy
        .resolve(&png_bytes(&brighten(&canvas, 1.05)), crop(62, 62, 380), "app-1")
        .unwrap();

    assert!(!resolution.verdict.is_duplicate);
    assert_eq!(policy.store().len(), 1);
}

#[test]
fn test_four_application_flow() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());
    let canvas = nose_canvas(500, 42);
    let original = png_bytes(&canvas);

    // Application #1: first sighting of this animal
    let first = policy.resolve(&original, crop(60, 60, 380), "app-1").unwrap();
    assert!(!first.verdict.is_duplicate);

    // Application #2: retaken photo of the same nose
    let second = policy
        .resolve(
            &png_bytes(&brighten(&canvas, 1.05)),
            crop(62, 62, 380),
            "app-2",
        )
        .unwrap();
    assert_eq!(second.verdict.match_kind, Some(MatchKind::Similarity));
    assert_eq!(
        second.verdict.matched_application_id.as_deref(),
        Some("app-1")
    );

    // Application #3: the exact same upload again
    let third = policy.resolve(&original, crop(60, 60, 380), "app-3").unwrap();
    assert_eq!(third.verdict.match_kind, Some(MatchKind::ExactHash));
    assert_eq!(
        third.verdict.matched_application_id.as_deref(),
        Some("app-1")
    );

    // Application #4: a different animal
    let fourth = policy
        .resolve(&png_bytes(&ramp_canvas(500)), crop(60, 60, 380), "app-4")
        .unwrap();
    assert!(!fourth.verdict.is_duplicate);

    assert_eq!(policy.store().len(), 2, "only the unique animals are stored");
}

#[test]
fn test_processing_is_deterministic() {
    init_logs();
    let engine = NoseprintEngine::default();
    let bytes = png_bytes(&nose_canvas(500, 7));

    let a = engine.process(&bytes, crop(60, 60, 380)).unwrap();
    let b = engine.process(&bytes, crop(60, 60, 380)).unwrap();
    assert_eq!(a.fingerprint.pattern_hash, b.fingerprint.pattern_hash);
    assert_eq!(a.fingerprint.quality_score, b.fingerprint.quality_score);
}

#[test]
fn test_fully_out_of_bounds_crop_is_rejected() {
    init_logs();
    let engine = NoseprintEngine::default();
    let bytes = png_bytes(&nose_canvas(200, 7));

    let err = engine.process(&bytes, crop(500, 500, 100)).unwrap_err();
    assert!(matches!(err, NoseprintError::InvalidRegion(_)));
}

struct DownStore;

impl FingerprintStore for DownStore {
    fn insert(&self, _: &str, _: &Fingerprint) -> anyhow::Result<InsertOutcome> {
        Err(anyhow!("store offline"))
    }
    fn find_by_hash(&self, _: &str) -> anyhow::Result<Option<StoredFingerprint>> {
        Err(anyhow!("store offline"))
    }
    fn candidates(&self) -> anyhow::Result<Vec<StoredFingerprint>> {
        Err(anyhow!("store offline"))
    }
}

#[test]
fn test_store_outage_never_reports_unique() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), DownStore);
    let bytes = png_bytes(&nose_canvas(500, 42));

    let err = policy.resolve(&bytes, crop(60, 60, 380), "app-1").unwrap_err();
    assert!(matches!(err, NoseprintError::StoreUnavailable(_)));
}

#[test]
fn test_concurrent_identical_submissions_store_exactly_one() {
    init_logs();
    let policy = DuplicatePolicy::new(NoseprintEngine::default(), MemoryStore::new());
    let pool = WorkerPool::new(Some(2)).unwrap();
    let bytes = png_bytes(&nose_canvas(500, 42));

    let submissions: Vec<Submission> = (1..=2)
        .map(|i| Submission {
            application_id: format!("app-{i}"),
            image_bytes: bytes.clone(),
            crop: crop(60, 60, 380),
        })
        .collect();

    let results = pool.resolve_batch(&policy, &submissions);
    let resolutions: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();

    let duplicates = resolutions
        .iter()
        .filter(|r| r.verdict.is_duplicate)
        .count();
    assert_eq!(duplicates, 1, "exactly one side of the race wins");
    assert_eq!(policy.store().len(), 1);
}
