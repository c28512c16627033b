//! Duplicate Resolution Policy: orchestrates the pipeline against the
//! fingerprint store and issues a verdict with supporting evidence.
//!
//! The store is the only shared mutable state in the crate and lives behind
//! a trait. The read-then-write race (two concurrent submissions of the
//! same animal both observing "no match") is resolved at the storage layer:
//! `insert` reports a hash conflict instead of silently appending, and the
//! policy turns a lost race into an exact-hash duplicate verdict.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;
use log::{info, warn};

use crate::NoseprintEngine;
use crate::error::{NoseprintError, Result};
use crate::models::{CropRect, DuplicateVerdict, Fingerprint, MatchKind};
use crate::similarity::similarity;

/// A fingerprint with the application that owns it
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFingerprint {
    /// Owning loan application
    pub application_id: String,
    /// The stored fingerprint
    pub fingerprint: Fingerprint,
}

/// What happened to an insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New fingerprint stored
    Inserted,
    /// The same application already had a fingerprint; it was replaced
    Superseded,
    /// A *different* application already holds this pattern hash; nothing
    /// was written. The policy treats this as a lost duplicate-check race.
    HashConflict {
        /// The application holding the conflicting fingerprint
        application_id: String,
    },
}

/// Collaborator interface to fingerprint persistence.
///
/// Implementations must enforce uniqueness of `pattern_hash` across
/// applications at the storage layer (report [`InsertOutcome::HashConflict`])
/// and must replace, not append, on re-submission by the same application.
pub trait FingerprintStore: Send + Sync {
    /// Persist a fingerprint for an application
    fn insert(&self, application_id: &str, fingerprint: &Fingerprint)
    -> anyhow::Result<InsertOutcome>;

    /// Look up a fingerprint by exact pattern hash
    fn find_by_hash(&self, pattern_hash: &str) -> anyhow::Result<Option<StoredFingerprint>>;

    /// Enumerate stored fingerprints for the similarity fallback. Stores may
    /// pre-filter the set; the policy re-checks every candidate it receives.
    fn candidates(&self) -> anyhow::Result<Vec<StoredFingerprint>>;
}

/// In-memory reference store: a mutex-guarded map from application id to
/// fingerprint. Suitable for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Fingerprint>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored fingerprints
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FingerprintStore for MemoryStore {
    fn insert(
        &self,
        application_id: &str,
        fingerprint: &Fingerprint,
    ) -> anyhow::Result<InsertOutcome> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| anyhow!("fingerprint store mutex poisoned"))?;

        if let Some(holder) = map
            .iter()
            .find(|(id, fp)| {
                fp.pattern_hash == fingerprint.pattern_hash && id.as_str() != application_id
            })
            .map(|(id, _)| id.clone())
        {
            return Ok(InsertOutcome::HashConflict {
                application_id: holder,
            });
        }

        let replaced = map.insert(application_id.to_owned(), fingerprint.clone());
        Ok(if replaced.is_some() {
            InsertOutcome::Superseded
        } else {
            InsertOutcome::Inserted
        })
    }

    fn find_by_hash(&self, pattern_hash: &str) -> anyhow::Result<Option<StoredFingerprint>> {
        let map = self
            .inner
            .lock()
            .map_err(|_| anyhow!("fingerprint store mutex poisoned"))?;
        Ok(map
            .iter()
            .find(|(_, fp)| fp.pattern_hash == pattern_hash)
            .map(|(id, fp)| StoredFingerprint {
                application_id: id.clone(),
                fingerprint: fp.clone(),
            }))
    }

    fn candidates(&self) -> anyhow::Result<Vec<StoredFingerprint>> {
        let map = self
            .inner
            .lock()
            .map_err(|_| anyhow!("fingerprint store mutex poisoned"))?;
        Ok(map
            .iter()
            .map(|(id, fp)| StoredFingerprint {
                application_id: id.clone(),
                fingerprint: fp.clone(),
            })
            .collect())
    }
}

/// The full outcome of resolving one submission
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The duplicate verdict, persisted by the caller as an annotation
    pub verdict: DuplicateVerdict,
    /// The fingerprint derived from the submitted image
    pub fingerprint: Fingerprint,
    /// Quality fell below the configured floor; caller may demand recapture
    pub low_quality: bool,
}

/// Drives the pipeline and the store for one submission at a time
pub struct DuplicatePolicy<S: FingerprintStore> {
    engine: NoseprintEngine,
    store: S,
}

impl<S: FingerprintStore> DuplicatePolicy<S> {
    /// Build a policy around an engine and a store
    pub fn new(engine: NoseprintEngine, store: S) -> Self {
        Self { engine, store }
    }

    /// Access the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process a submitted image and resolve its duplicate status.
    ///
    /// Unique submissions are persisted before returning; a re-submission
    /// for the same application supersedes its stored fingerprint. Never
    /// fails open: a store error surfaces as `StoreUnavailable`, not as
    /// `Unique`.
    pub fn resolve(
        &self,
        image_bytes: &[u8],
        crop: Option<CropRect>,
        application_id: &str,
    ) -> Result<Resolution> {
        let output = self.engine.process(image_bytes, crop)?;
        let fingerprint = output.fingerprint;

        let verdict = self.check_duplicate(&fingerprint, application_id)?;
        if verdict.is_duplicate {
            info!(
                "application {application_id}: duplicate of {:?} via {:?}",
                verdict.matched_application_id, verdict.match_kind
            );
            return Ok(Resolution {
                verdict,
                fingerprint,
                low_quality: output.low_quality,
            });
        }

        match self
            .store
            .insert(application_id, &fingerprint)
            .map_err(NoseprintError::StoreUnavailable)?
        {
            InsertOutcome::Inserted => {
                info!("application {application_id}: unique, fingerprint stored");
            }
            InsertOutcome::Superseded => {
                info!("application {application_id}: re-submission superseded stored fingerprint");
            }
            InsertOutcome::HashConflict {
                application_id: holder,
            } => {
                // A concurrent submission won the race between our check and
                // our insert; re-resolve against the winner
                warn!(
                    "application {application_id}: insert conflict with {holder}, lost duplicate-check race"
                );
                let score = self
                    .store
                    .find_by_hash(&fingerprint.pattern_hash)
                    .map_err(NoseprintError::StoreUnavailable)?
                    .map(|existing| similarity(&fingerprint.descriptor, &existing.fingerprint.descriptor))
                    .unwrap_or(1.0);
                return Ok(Resolution {
                    verdict: DuplicateVerdict::duplicate(MatchKind::ExactHash, holder, score),
                    fingerprint,
                    low_quality: output.low_quality,
                });
            }
        }

        Ok(Resolution {
            verdict: DuplicateVerdict::unique(),
            fingerprint,
            low_quality: output.low_quality,
        })
    }

    /// Check a fingerprint against the store without persisting anything.
    ///
    /// Exact hash match first (O(1) path), then the bounded similarity scan
    /// over candidates sharing the extractor version. `excluding` is the
    /// requesting application: its own stored fingerprint never counts as a
    /// duplicate of itself.
    pub fn check_duplicate(
        &self,
        fingerprint: &Fingerprint,
        excluding: &str,
    ) -> Result<DuplicateVerdict> {
        if let Some(existing) = self
            .store
            .find_by_hash(&fingerprint.pattern_hash)
            .map_err(NoseprintError::StoreUnavailable)?
        {
            if existing.application_id != excluding {
                let score =
                    similarity(&fingerprint.descriptor, &existing.fingerprint.descriptor);
                return Ok(DuplicateVerdict::duplicate(
                    MatchKind::ExactHash,
                    existing.application_id,
                    score,
                ));
            }
        }

        let threshold = self.engine.config().similarity_threshold;
        let mut best: Option<(String, f64)> = None;
        for candidate in self
            .store
            .candidates()
            .map_err(NoseprintError::StoreUnavailable)?
        {
            if candidate.application_id == excluding {
                continue;
            }
            // Descriptors from a different extractor configuration are not
            // comparable
            if candidate.fingerprint.extractor_version != fingerprint.extractor_version {
                continue;
            }
            let score = similarity(&fingerprint.descriptor, &candidate.fingerprint.descriptor);
            if best.as_ref().is_none_or(|(_, s)| score > *s) {
                best = Some((candidate.application_id, score));
            }
        }

        if let Some((application_id, score)) = best {
            if score >= threshold {
                return Ok(DuplicateVerdict::duplicate(
                    MatchKind::Similarity,
                    application_id,
                    score,
                ));
            }
        }

        Ok(DuplicateVerdict::unique())
    }
}
