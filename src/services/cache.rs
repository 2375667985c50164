use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::{CandidateProfile, UserId};
use crate::services::{ProfileStore, StoreError};

/// Rough per-candidate footprint used for the warm-up memory estimate.
const ESTIMATED_BYTES_PER_CANDIDATE: usize = 1024;

/// Snapshot generations kept around; only the newest is ever read.
const SNAPSHOT_CAPACITY: u64 = 8;

/// Read-optimized view of matchable profiles the matching core depends on.
///
/// Invalidation is event-driven only: callers invalidate in the same unit of
/// work as the profile write they performed.
#[async_trait]
pub trait CandidateCachePort: Send + Sync {
    async fn get_all_candidates(&self) -> Result<Arc<Vec<CandidateProfile>>, StoreError>;
    async fn get_candidate_by_id(&self, user_id: UserId) -> Result<Option<CandidateProfile>, StoreError>;
    async fn invalidate_all(&self);
    /// Also drops the aggregate snapshot, whose composition may have changed.
    async fn invalidate_one(&self, user_id: UserId);
    /// Deduplicates input; empty input is a no-op.
    async fn invalidate_many(&self, user_ids: &[UserId]);
}

/// Outcome of an eager cache population at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupReport {
    pub candidate_count: usize,
    pub duration_millis: u64,
    pub retry_count: u32,
    pub estimated_memory_mb: f64,
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub snapshot_entries: u64,
    pub profile_entries: u64,
    pub generation: u64,
    pub rebuilds: u64,
}

/// In-process candidate cache backed by moka.
///
/// Both the aggregate snapshot and the per-id entries are keyed by an
/// invalidation generation. Bumping the generation on every invalidation means
/// a load that started before an invalidation lands under a key nobody reads
/// any more, and a later reader never joins that load.
pub struct CandidateCache {
    source: Arc<dyn ProfileStore>,
    snapshots: moka::future::Cache<u64, Arc<Vec<CandidateProfile>>>,
    profiles: moka::future::Cache<(UserId, u64), CandidateProfile>,
    generation: AtomicU64,
    rebuilds: Arc<AtomicU64>,
}

impl CandidateCache {
    pub fn new(source: Arc<dyn ProfileStore>, profile_capacity: u64) -> Self {
        let snapshots = moka::future::CacheBuilder::new(SNAPSHOT_CAPACITY).build();
        let profiles = moka::future::CacheBuilder::new(profile_capacity).build();

        Self {
            source,
            snapshots,
            profiles,
            generation: AtomicU64::new(0),
            rebuilds: Arc::new(AtomicU64::new(0)),
        }
    }

    fn advance_generation(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Older keys are unreachable now; drop them instead of waiting for eviction
        self.snapshots.invalidate_all();
        self.profiles.invalidate_all();
        generation
    }

    /// Evict everything, then repopulate the aggregate snapshot eagerly.
    pub async fn warm_up(&self) -> Result<WarmupReport, StoreError> {
        self.invalidate_all().await;
        tracing::info!("Candidate cache warm-up started");

        let started = Instant::now();
        let candidates = self.get_all_candidates().await?;
        let duration_millis = started.elapsed().as_millis() as u64;

        let estimated_memory_mb =
            (candidates.len() * ESTIMATED_BYTES_PER_CANDIDATE) as f64 / (1024.0 * 1024.0);

        Ok(WarmupReport {
            candidate_count: candidates.len(),
            duration_millis,
            retry_count: 0,
            estimated_memory_mb,
        })
    }

    /// Warm up, retrying up to `max_attempts` times with `retry_delay` between attempts.
    pub async fn warm_up_with_retry(
        &self,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Result<WarmupReport, StoreError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match self.warm_up().await {
                Ok(report) => return Ok(WarmupReport { retry_count: attempt, ..report }),
                Err(e) if attempt + 1 < max_attempts => {
                    attempt += 1;
                    tracing::warn!("Cache warm-up failed (retry {}/{}): {}", attempt, max_attempts, e);
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Warm up on a background task. Failures are logged, never propagated.
    pub fn spawn_warm_up(
        cache: Arc<Self>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            match cache.warm_up_with_retry(max_attempts, retry_delay).await {
                Ok(report) => tracing::info!(
                    candidate_count = report.candidate_count,
                    duration_millis = report.duration_millis,
                    retry_count = report.retry_count,
                    estimated_memory_mb = report.estimated_memory_mb,
                    "Candidate cache warm-up complete"
                ),
                Err(e) => tracing::error!("Candidate cache warm-up failed: {}", e),
            }
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            snapshot_entries: self.snapshots.entry_count(),
            profile_entries: self.profiles.entry_count(),
            generation: self.generation.load(Ordering::SeqCst),
            rebuilds: self.rebuilds.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl CandidateCachePort for CandidateCache {
    async fn get_all_candidates(&self) -> Result<Arc<Vec<CandidateProfile>>, StoreError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let source = Arc::clone(&self.source);
        let rebuilds = Arc::clone(&self.rebuilds);

        self.snapshots
            .try_get_with(generation, async move {
                tracing::info!("Cache miss - loading all candidate profiles");
                let profiles = source.list_all_profiles().await?;
                rebuilds.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(Arc::new(profiles))
            })
            .await
            .map_err(StoreError::CacheLoad)
    }

    async fn get_candidate_by_id(&self, user_id: UserId) -> Result<Option<CandidateProfile>, StoreError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let source = Arc::clone(&self.source);

        let loaded = self
            .profiles
            .try_get_with((user_id, generation), async move {
                tracing::debug!("Cache miss - loading profile {}", user_id);
                source
                    .get_profile(user_id)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("profile {}", user_id)))
            })
            .await;

        match loaded {
            Ok(profile) => Ok(Some(profile)),
            Err(e) if matches!(*e, StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(StoreError::CacheLoad(e)),
        }
    }

    async fn invalidate_all(&self) {
        let generation = self.advance_generation();
        tracing::info!("All candidate cache entries invalidated (generation {})", generation);
    }

    async fn invalidate_one(&self, user_id: UserId) {
        let generation = self.advance_generation();
        tracing::info!("Candidate cache invalidated for user {} (generation {})", user_id, generation);
    }

    async fn invalidate_many(&self, user_ids: &[UserId]) {
        let distinct: BTreeSet<UserId> = user_ids.iter().copied().collect();

        if distinct.is_empty() {
            tracing::debug!("Bulk cache invalidation requested with no users, skipping");
            return;
        }

        let generation = self.advance_generation();
        tracing::info!(
            "Candidate cache invalidated for {} users (generation {})",
            distinct.len(),
            generation
        );
    }
}
