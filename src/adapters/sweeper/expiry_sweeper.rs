//! ExpirySweeper - Background task that deletes expired memberships.
//!
//! Every `check_period` the sweeper asks the repository to delete all
//! memberships whose expiry is at or before the current time.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `check_period` | 1h | Time between sweeps (`TTL_CHECK_PERIOD`) |
//!
//! ## Failure Policy
//!
//! A failed sweep is logged and the loop keeps going; the next tick retries.
//! The loop only ends on shutdown.
//!
//! ## Graceful Shutdown
//!
//! [`SweeperHandle::shutdown`] signals a watch channel and waits for the task.
//! The signal is checked before each sweep, so an in-flight delete always
//! runs to completion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::SegmentRepository;

/// Period used when none is configured.
pub const DEFAULT_CHECK_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Configuration for the ExpirySweeper task.
#[derive(Debug, Clone)]
pub struct ExpirySweeperConfig {
    /// Time between sweeps.
    pub check_period: Duration,
}

impl Default for ExpirySweeperConfig {
    fn default() -> Self {
        Self {
            check_period: DEFAULT_CHECK_PERIOD,
        }
    }
}

impl ExpirySweeperConfig {
    /// Create config with a custom check period. Zero falls back to the default.
    pub fn with_check_period(mut self, period: Duration) -> Self {
        self.check_period = if period.is_zero() {
            DEFAULT_CHECK_PERIOD
        } else {
            period
        };
        self
    }
}

/// Counters describing what the sweeper has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweeperStats {
    pub sweeps: u64,
    pub failures: u64,
    pub rows_removed: u64,
}

#[derive(Debug, Default)]
struct SweeperCounters {
    sweeps: AtomicU64,
    failures: AtomicU64,
    rows_removed: AtomicU64,
}

impl SweeperCounters {
    fn snapshot(&self) -> SweeperStats {
        SweeperStats {
            sweeps: self.sweeps.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rows_removed: self.rows_removed.load(Ordering::Relaxed),
        }
    }
}

/// Periodically deletes expired memberships.
pub struct ExpirySweeper {
    repository: Arc<dyn SegmentRepository>,
    config: ExpirySweeperConfig,
    counters: Arc<SweeperCounters>,
}

impl ExpirySweeper {
    /// Create a new ExpirySweeper with default configuration.
    pub fn new(repository: Arc<dyn SegmentRepository>) -> Self {
        Self::with_config(repository, ExpirySweeperConfig::default())
    }

    /// Create a new ExpirySweeper with custom configuration.
    pub fn with_config(repository: Arc<dyn SegmentRepository>, config: ExpirySweeperConfig) -> Self {
        Self {
            repository,
            config,
            counters: Arc::new(SweeperCounters::default()),
        }
    }

    /// Start the sweep loop on the runtime and return a handle that owns it.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let counters = Arc::clone(&self.counters);
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });

        SweeperHandle {
            shutdown_tx,
            task,
            counters,
        }
    }

    /// Run the sweep loop until the shutdown signal is received.
    ///
    /// The first sweep happens one full period after start.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.check_period;
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(check_period = ?period, "Expiry sweeper started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    // A dropped sender also means stop.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::warn!(
                            error = %e,
                            code = %e.code,
                            "Expiry sweep failed; retrying next period"
                        );
                    }
                }
            }
        }

        tracing::info!("Expiry sweeper stopped");
    }

    /// Run exactly one sweep and return the number of rows removed.
    pub async fn sweep_once(&self) -> Result<u64, DomainError> {
        self.counters.sweeps.fetch_add(1, Ordering::Relaxed);

        match self.repository.sweep_expired(Timestamp::now()).await {
            Ok(removed) => {
                self.counters.rows_removed.fetch_add(removed, Ordering::Relaxed);
                if removed > 0 {
                    tracing::debug!(rows = removed, "Expired memberships removed");
                }
                Ok(removed)
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SweeperStats {
        self.counters.snapshot()
    }
}

/// Owner of a running sweeper task.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) closes
/// the channel, which also stops the loop, but nothing waits for it.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    counters: Arc<SweeperCounters>,
}

impl SweeperHandle {
    /// Snapshot of the counters.
    pub fn stats(&self) -> SweeperStats {
        self.counters.snapshot()
    }

    /// Signal the loop to stop and wait until it has.
    pub async fn shutdown(self) -> SweeperStats {
        // Err only if the loop already exited.
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Expiry sweeper task panicked");
        }
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySegmentRepository;
    use crate::domain::foundation::{ErrorCode, SegmentId, UserId};
    use crate::domain::segment::{
        DeltaOutcome, MembershipDelta, MembershipEvent, MembershipWindow, ReportMonth, Segment,
        SegmentSlug,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Repository
    // ════════════════════════════════════════════════════════════════════════════

    /// Repository whose sweep results are scripted per call.
    struct ScriptedRepository {
        inner: InMemorySegmentRepository,
        script: Mutex<Vec<Result<u64, DomainError>>>,
    }

    impl ScriptedRepository {
        fn new(script: Vec<Result<u64, DomainError>>) -> Self {
            Self {
                inner: InMemorySegmentRepository::new(),
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl SegmentRepository for ScriptedRepository {
        async fn create_segment(
            &self,
            slug: &SegmentSlug,
        ) -> Result<Segment, DomainError> {
            self.inner.create_segment(slug).await
        }

        async fn delete_segment(&self, slug: &SegmentSlug) -> Result<bool, DomainError> {
            self.inner.delete_segment(slug).await
        }

        async fn find_segment(
            &self,
            slug: &SegmentSlug,
        ) -> Result<Option<Segment>, DomainError> {
            self.inner.find_segment(slug).await
        }

        async fn add_users_to_segment(
            &self,
            segment_id: SegmentId,
            user_ids: &[UserId],
            window: &MembershipWindow,
        ) -> Result<u64, DomainError> {
            self.inner.add_users_to_segment(segment_id, user_ids, window).await
        }

        async fn add_user_to_segments(
            &self,
            user_id: UserId,
            slugs: &[SegmentSlug],
            window: &MembershipWindow,
        ) -> Result<u64, DomainError> {
            self.inner.add_user_to_segments(user_id, slugs, window).await
        }

        async fn remove_user_from_segments(
            &self,
            user_id: UserId,
            slugs: &[SegmentSlug],
        ) -> Result<u64, DomainError> {
            self.inner.remove_user_from_segments(user_id, slugs).await
        }

        async fn apply_delta(
            &self,
            delta: &MembershipDelta,
            window: &MembershipWindow,
        ) -> Result<DeltaOutcome, DomainError> {
            self.inner.apply_delta(delta, window).await
        }

        async fn sweep_expired(&self, now: Timestamp) -> Result<u64, DomainError> {
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    None
                } else {
                    Some(script.remove(0))
                }
            };
            match next {
                Some(result) => result,
                None => self.inner.sweep_expired(now).await,
            }
        }

        async fn list_segment_slugs_for_user(
            &self,
            user_id: UserId,
        ) -> Result<Vec<SegmentSlug>, DomainError> {
            self.inner.list_segment_slugs_for_user(user_id).await
        }

        async fn list_all_user_ids(&self) -> Result<Vec<UserId>, DomainError> {
            self.inner.list_all_user_ids().await
        }

        async fn register_users(&self, user_ids: &[UserId]) -> Result<u64, DomainError> {
            self.inner.register_users(user_ids).await
        }

        async fn monthly_report(
            &self,
            month: ReportMonth,
        ) -> Result<Vec<MembershipEvent>, DomainError> {
            self.inner.monthly_report(month).await
        }
    }

    fn unavailable() -> DomainError {
        DomainError::new(ErrorCode::StoreUnavailable, "connection refused")
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sweep_once_removes_expired_rows() {
        let repo = Arc::new(InMemorySegmentRepository::new());
        let slug = SegmentSlug::new("beta").unwrap();
        repo.create_segment(&slug).await.unwrap();
        let now = Timestamp::now();
        let expired = MembershipWindow {
            created_at: now.plus_secs(-120),
            expires_at: Some(now.plus_secs(-60)),
        };
        repo.add_user_to_segments(UserId::new(1).unwrap(), &[slug], &expired)
            .await
            .unwrap();

        let sweeper = ExpirySweeper::new(repo.clone());
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert!(repo.memberships().await.is_empty());
        assert_eq!(
            sweeper.stats(),
            SweeperStats {
                sweeps: 1,
                failures: 0,
                rows_removed: 1
            }
        );
    }

    #[tokio::test]
    async fn sweep_once_with_nothing_expired_returns_zero() {
        let sweeper = ExpirySweeper::new(Arc::new(InMemorySegmentRepository::new()));
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_sweep_is_counted_and_returned() {
        let repo = Arc::new(ScriptedRepository::new(vec![Err(unavailable())]));
        let sweeper = ExpirySweeper::new(repo);

        let err = sweeper.sweep_once().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);
        assert_eq!(sweeper.stats().failures, 1);
    }

    #[tokio::test]
    async fn loop_survives_failures_and_keeps_sweeping() {
        let repo = Arc::new(ScriptedRepository::new(vec![
            Err(unavailable()),
            Err(unavailable()),
            Ok(3),
        ]));
        let config = ExpirySweeperConfig::default().with_check_period(Duration::from_millis(10));
        let handle = ExpirySweeper::with_config(repo, config).spawn();

        tokio::time::sleep(Duration::from_millis(150)).await;
        let stats = handle.shutdown().await;

        assert!(stats.sweeps >= 3, "expected at least 3 sweeps, got {:?}", stats);
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.rows_removed, 3);
    }

    #[tokio::test]
    async fn shutdown_stops_a_long_period_sweeper_promptly() {
        let handle = ExpirySweeper::new(Arc::new(InMemorySegmentRepository::new())).spawn();

        let stats = tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .expect("sweeper did not stop");

        assert_eq!(stats.sweeps, 0);
    }

    #[test]
    fn config_defaults_to_one_hour() {
        assert_eq!(
            ExpirySweeperConfig::default().check_period,
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn zero_period_falls_back_to_default() {
        let config = ExpirySweeperConfig::default().with_check_period(Duration::ZERO);
        assert_eq!(config.check_period, DEFAULT_CHECK_PERIOD);
    }
}
