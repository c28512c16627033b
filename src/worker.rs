//! Parallel batch processing over a dedicated rayon thread pool.
//!
//! Each submission is independent until the store insert, so the pipeline
//! parallelizes per image rather than within one. Result order always
//! matches submission order.

use log::debug;
use rayon::prelude::*;

use crate::error::Result;
use crate::models::CropRect;
use crate::policy::{DuplicatePolicy, FingerprintStore, Resolution};
use crate::{NoseprintEngine, ProcessOutput};

/// One image in a batch
#[derive(Debug, Clone)]
pub struct Submission {
    /// Loan application the image belongs to
    pub application_id: String,
    /// Encoded image bytes as uploaded
    pub image_bytes: Vec<u8>,
    /// Operator-drawn nose region, if any
    pub crop: Option<CropRect>,
}

/// A fixed-size pool of pipeline workers
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `threads` workers, or one per logical CPU when
    /// `None`
    pub fn new(threads: Option<usize>) -> anyhow::Result<Self> {
        let threads = threads.unwrap_or_else(num_cpus::get);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("noseprint-{i}"))
            .build()?;
        debug!("worker pool started with {threads} threads");
        Ok(Self { pool })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run the fingerprint pipeline over a batch of images. Per-image
    /// failures land in that image's slot; they never abort the batch.
    pub fn process_batch(
        &self,
        engine: &NoseprintEngine,
        submissions: &[Submission],
    ) -> Vec<Result<ProcessOutput>> {
        self.pool.install(|| {
            submissions
                .par_iter()
                .map(|s| engine.process(&s.image_bytes, s.crop))
                .collect()
        })
    }

    /// Resolve a batch of submissions against the store. Concurrent
    /// submissions of the same animal are safe: the storage-layer hash
    /// conflict turns the losing insert into an exact-hash duplicate.
    pub fn resolve_batch<S: FingerprintStore>(
        &self,
        policy: &DuplicatePolicy<S>,
        submissions: &[Submission],
    ) -> Vec<Result<Resolution>> {
        self.pool.install(|| {
            submissions
                .par_iter()
                .map(|s| policy.resolve(&s.image_bytes, s.crop, &s.application_id))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_thread_count() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        assert_eq!(pool.threads(), 2);
    }

    #[test]
    fn test_default_thread_count_is_positive() {
        let pool = WorkerPool::new(None).unwrap();
        assert!(pool.threads() >= 1);
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let engine = NoseprintEngine::default();
        assert!(pool.process_batch(&engine, &[]).is_empty());
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let engine = NoseprintEngine::default();
        let submissions = vec![
            Submission {
                application_id: "app-1".into(),
                image_bytes: vec![0xde, 0xad], // not an image
                crop: None,
            },
            Submission {
                application_id: "app-2".into(),
                image_bytes: vec![],
                crop: None,
            },
        ];
        let results = pool.process_batch(&engine, &submissions);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));
    }
}
