//! Client-side progress cache.
//!
//! Progress reads are cached per (learner, trainer) for a short TTL. The
//! cache is only a hint: a successful recording overwrites the entry with
//! the server's authoritative progress, and a failed one drops it so the
//! next read goes back to the source.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::FlowConfig;
use crate::core::Progress;
use crate::error::{AbacusError, FailOpen, Result};
use crate::recording::{ProgressApi, RecordOutcome, RecordRequest};
use crate::stats::{AchievementView, StatsSummary};

type CacheKey = (String, String);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    progress: Progress,
    fetched_at: Instant,
}

/// TTL cache of per-trainer progress.
#[derive(Debug)]
pub struct ProgressCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ProgressCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(flow: &FlowConfig) -> Self {
        Self::new(Duration::from_secs(flow.progress_cache_ttl_seconds))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(learner_id: &str, trainer_id: &str) -> CacheKey {
        (learner_id.to_string(), trainer_id.to_string())
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<CacheKey, CacheEntry>) -> T,
    ) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AbacusError::transient("progress cache lock poisoned"))?;
        Ok(f(&mut entries))
    }

    /// An entry is stale once it is older than the TTL.
    pub fn is_stale(&self, learner_id: &str, trainer_id: &str, now: Instant) -> bool {
        let key = Self::key(learner_id, trainer_id);
        self.with_entries(|entries| match entries.get(&key) {
            Some(entry) => now.saturating_duration_since(entry.fetched_at) >= self.ttl,
            None => true,
        })
        .fail_open_with("progress cache", true)
    }

    /// Cached progress, if still fresh.
    pub fn get_fresh(&self, learner_id: &str, trainer_id: &str, now: Instant) -> Option<Progress> {
        let key = Self::key(learner_id, trainer_id);
        self.with_entries(|entries| {
            entries
                .get(&key)
                .filter(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)
                .map(|entry| entry.progress)
        })
        .fail_open_default("progress cache")
    }

    pub fn put(&self, learner_id: &str, trainer_id: &str, progress: Progress, now: Instant) {
        let key = Self::key(learner_id, trainer_id);
        self.with_entries(|entries| {
            entries.insert(
                key,
                CacheEntry {
                    progress,
                    fetched_at: now,
                },
            );
        })
        .fail_open_default("progress cache")
    }

    pub fn invalidate(&self, learner_id: &str, trainer_id: &str) {
        let key = Self::key(learner_id, trainer_id);
        self.with_entries(|entries| {
            entries.remove(&key);
        })
        .fail_open_default("progress cache")
    }

    pub fn clear(&self) {
        self.with_entries(|entries| entries.clear())
            .fail_open_default("progress cache")
    }
}

/// [`ProgressApi`] decorator that reads progress through a [`ProgressCache`].
#[derive(Debug)]
pub struct CachedProgressApi<A: ProgressApi> {
    inner: A,
    cache: ProgressCache,
}

impl<A: ProgressApi> CachedProgressApi<A> {
    pub fn new(inner: A, cache: ProgressCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn cache(&self) -> &ProgressCache {
        &self.cache
    }

    /// Fetch from the source, bypassing and refreshing the cache.
    pub fn reload_progress(&self, learner_id: &str, trainer_id: &str) -> Result<Progress> {
        let progress = self.inner.load_progress(learner_id, trainer_id)?;
        self.cache.put(learner_id, trainer_id, progress, Instant::now());
        Ok(progress)
    }
}

impl<A: ProgressApi> ProgressApi for CachedProgressApi<A> {
    fn load_progress(&self, learner_id: &str, trainer_id: &str) -> Result<Progress> {
        if let Some(progress) = self.cache.get_fresh(learner_id, trainer_id, Instant::now()) {
            tracing::trace!(learner = learner_id, trainer = trainer_id, "progress cache hit");
            return Ok(progress);
        }
        self.reload_progress(learner_id, trainer_id)
    }

    fn record_attempt(&self, request: &RecordRequest) -> Result<RecordOutcome> {
        match self.inner.record_attempt(request) {
            Ok(outcome) => {
                self.cache.put(
                    &request.learner_id,
                    &request.trainer_id,
                    outcome.progress,
                    Instant::now(),
                );
                Ok(outcome)
            }
            Err(err) => {
                self.cache
                    .invalidate(&request.learner_id, &request.trainer_id);
                Err(err)
            }
        }
    }

    fn load_achievements(&self, learner_id: &str) -> Result<Vec<AchievementView>> {
        self.inner.load_achievements(learner_id)
    }

    fn load_stats_summary(&self, learner_id: &str) -> Result<StatsSummary> {
        self.inner.load_stats_summary(learner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AttemptToken, LevelProgress, Metrics, ModeProgress, PresetId, SessionResult};
    use crate::stats::UserStats;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake source counting calls; fails recordings on demand.
    #[derive(Default)]
    struct CountingApi {
        loads: AtomicUsize,
        fail_record: bool,
    }

    impl ProgressApi for CountingApi {
        fn load_progress(&self, _learner_id: &str, _trainer_id: &str) -> Result<Progress> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Progress::Modes(ModeProgress::default()))
        }

        fn record_attempt(&self, _request: &RecordRequest) -> Result<RecordOutcome> {
            if self.fail_record {
                return Err(AbacusError::transient("offline"));
            }
            Ok(RecordOutcome {
                progress: Progress::Modes(ModeProgress {
                    accuracy: true,
                    ..Default::default()
                }),
                duplicate: false,
                newly_unlocked: Vec::new(),
                stats: UserStats::default(),
            })
        }

        fn load_achievements(&self, _learner_id: &str) -> Result<Vec<AchievementView>> {
            Ok(Vec::new())
        }

        fn load_stats_summary(&self, _learner_id: &str) -> Result<StatsSummary> {
            Err(AbacusError::transient("not needed"))
        }
    }

    fn request() -> RecordRequest {
        RecordRequest {
            learner_id: "ada".to_string(),
            trainer_id: "column-addition".to_string(),
            token: Some(AttemptToken::generate()),
            preset_id: PresetId::new("accuracy"),
            result: SessionResult::new(true, Metrics::default()),
        }
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = ProgressCache::new(Duration::from_secs(30));
        let now = Instant::now();
        let progress = Progress::Levels(LevelProgress::default());

        assert!(cache.is_stale("ada", "times-tables", now));
        cache.put("ada", "times-tables", progress, now);
        assert_eq!(cache.get_fresh("ada", "times-tables", now), Some(progress));
        assert!(!cache.is_stale("ada", "times-tables", now + Duration::from_secs(29)));

        let later = now + Duration::from_secs(30);
        assert!(cache.is_stale("ada", "times-tables", later));
        assert_eq!(cache.get_fresh("ada", "times-tables", later), None);
        // keyed per trainer
        assert_eq!(cache.get_fresh("ada", "column-addition", now), None);
    }

    #[test]
    fn test_reads_hit_cache() {
        let api = CachedProgressApi::new(
            CountingApi::default(),
            ProgressCache::new(Duration::from_secs(60)),
        );
        api.load_progress("ada", "column-addition").unwrap();
        api.load_progress("ada", "column-addition").unwrap();
        assert_eq!(api.inner().loads.load(Ordering::SeqCst), 1);

        api.reload_progress("ada", "column-addition").unwrap();
        assert_eq!(api.inner().loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let api = CachedProgressApi::new(CountingApi::default(), ProgressCache::new(Duration::ZERO));
        api.load_progress("ada", "column-addition").unwrap();
        api.load_progress("ada", "column-addition").unwrap();
        assert_eq!(api.inner().loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_record_refreshes_with_server_progress() {
        let api = CachedProgressApi::new(
            CountingApi::default(),
            ProgressCache::new(Duration::from_secs(60)),
        );
        api.load_progress("ada", "column-addition").unwrap();
        api.record_attempt(&request()).unwrap();

        let progress = api.load_progress("ada", "column-addition").unwrap();
        assert!(progress.flag(crate::core::ProgressFlag::Accuracy));
        assert_eq!(api.inner().loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_record_invalidates() {
        let api = CachedProgressApi::new(
            CountingApi {
                fail_record: true,
                ..Default::default()
            },
            ProgressCache::new(Duration::from_secs(60)),
        );
        api.load_progress("ada", "column-addition").unwrap();
        assert!(api.record_attempt(&request()).is_err());

        api.load_progress("ada", "column-addition").unwrap();
        assert_eq!(api.inner().loads.load(Ordering::SeqCst), 2);
    }
}
