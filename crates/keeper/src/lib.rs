//! # Keeper: the runtime around one pet
//!
//! [`Keeper`] is a cheap-to-clone handle over a single [`PetState`] behind a
//! `tokio::sync::Mutex`. Every operation (feed, tick, actions, snapshots)
//! takes the lock, so interleaved callers always observe whole transitions.
//!
//! ```text
//! MetricsSource ──► Keeper::tick ──┐
//!                                  ├──► Mutex<PetState>
//! transport ──► Keeper::feed/... ──┘
//! ```
//!
//! [`Keeper::spawn_ticker`] drives `tick` on a fixed period until a shutdown
//! signal arrives.

pub mod config;
pub mod source;

pub use config::KeeperConfig;
pub use source::{FixedMetrics, MetricsSource, ProcMetrics};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use classifier::Classifier;
use common::{FeedOutcome, HealthReport, PetSnapshot};
use pet::{MetricsError, PetState, SystemSample, TickOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub const APP_NAME: &str = "sys.pet";

/// Debug view returned by [`Keeper::info`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeeperInfo {
    pub app: String,
    pub version: String,
    pub tick_loop_running: bool,
    pub pet: PetSnapshot,
}

#[derive(Clone)]
pub struct Keeper {
    pet: Arc<Mutex<PetState>>,
    source: Arc<dyn MetricsSource>,
    config: KeeperConfig,
    ticking: Arc<AtomicBool>,
}

/// Current time on tokio's clock, so paused-clock tests drive the pet too.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl Keeper {
    pub fn new(
        config: KeeperConfig,
        classifier: Arc<Classifier>,
        source: Arc<dyn MetricsSource>,
    ) -> Self {
        let pet = PetState::new(config.name.clone(), classifier, now());
        Self {
            pet: Arc::new(Mutex::new(pet)),
            source,
            config,
            ticking: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub async fn feed(&self, snippet: &str) -> FeedOutcome {
        self.pet.lock().await.feed(snippet)
    }

    pub async fn rest(&self) -> PetSnapshot {
        let mut pet = self.pet.lock().await;
        pet.rest();
        pet.snapshot()
    }

    pub async fn pet(&self) -> PetSnapshot {
        let mut pet = self.pet.lock().await;
        pet.pet();
        pet.snapshot()
    }

    /// Rewards the pet for a confirmed process termination.
    pub async fn process_killed(&self, pid: u32, name: Option<&str>) -> PetSnapshot {
        info!(pid, name = name.unwrap_or("?"), "process terminated");
        let mut pet = self.pet.lock().await;
        pet.process_killed();
        pet.snapshot()
    }

    pub async fn reset(&self) -> PetSnapshot {
        let mut pet = self.pet.lock().await;
        pet.reset(now());
        pet.snapshot()
    }

    pub async fn snapshot(&self) -> PetSnapshot {
        self.pet.lock().await.snapshot()
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            pet_alive: self.pet.lock().await.is_alive(),
        }
    }

    pub async fn info(&self) -> KeeperInfo {
        KeeperInfo {
            app: APP_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tick_loop_running: self.is_ticking(),
            pet: self.snapshot().await,
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::SeqCst)
    }

    /// One sample from the configured source, bounded by `metrics_timeout`.
    pub async fn sample(&self) -> Result<SystemSample, MetricsError> {
        let limit = self.config.metrics_timeout;
        match tokio::time::timeout(limit, self.source.sample()).await {
            Ok(result) => result,
            Err(_) => Err(MetricsError::Timeout(limit)),
        }
    }

    /// Runs one periodic update.
    ///
    /// The lock is held across the metrics read so a tick is one indivisible
    /// transition. Throttled ticks skip the read entirely. The pet is stamped
    /// with the tick's start time, not the time the read finished.
    pub async fn tick(&self) -> TickOutcome {
        let mut pet = self.pet.lock().await;
        let started = now();
        if !pet.is_tick_due(started) {
            return TickOutcome::Throttled;
        }
        let sample = self.sample().await;
        let outcome = pet.tick(started, sample);
        if let TickOutcome::Ran(report) = outcome {
            debug!(?report, "tick applied");
        }
        outcome
    }

    /// Spawns the background ticker. It stops when `shutdown` becomes `true`
    /// or its sender is dropped.
    pub fn spawn_ticker(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let keeper = self.clone();
        keeper.ticking.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(keeper.config.tick_period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(period = ?keeper.config.tick_period, "tick loop started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        keeper.tick().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            keeper.ticking.store(false, Ordering::SeqCst);
            info!("tick loop stopped");
        })
    }
}

impl std::fmt::Debug for Keeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keeper")
            .field("config", &self.config)
            .field("ticking", &self.is_ticking())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::PetStatus;
    use std::time::Duration;

    fn keeper_with(source: impl MetricsSource + 'static) -> Keeper {
        let classifier = Arc::new(Classifier::new().unwrap());
        Keeper::new(KeeperConfig::default(), classifier, Arc::new(source))
    }

    struct Stalled;

    #[async_trait]
    impl MetricsSource for Stalled {
        async fn sample(&self) -> Result<SystemSample, MetricsError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(SystemSample::percentages(0.0, 0.0))
        }
    }

    struct Sluggish {
        latency: Duration,
    }

    #[async_trait]
    impl MetricsSource for Sluggish {
        async fn sample(&self) -> Result<SystemSample, MetricsError> {
            tokio::time::sleep(self.latency).await;
            Ok(SystemSample::percentages(100.0, 30.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_through_keeper() {
        let keeper = keeper_with(FixedMetrics::percentages(0.0, 50.0));
        let out = keeper.feed("if n % 2 == 0: return True").await;
        assert!(out.success);
        assert_eq!(keeper.snapshot().await.hunger, 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_throttles_on_tokio_clock() {
        let keeper = keeper_with(FixedMetrics::percentages(100.0, 42.0));
        assert_eq!(keeper.tick().await, TickOutcome::Throttled);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(matches!(keeper.tick().await, TickOutcome::Ran(r) if r.metrics_applied));
        assert_eq!(keeper.tick().await, TickOutcome::Throttled);

        let snap = keeper.snapshot().await;
        assert_eq!(snap.fatigue, 5.0);
        assert_eq!(snap.weight, 42.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_timeout_is_reported() {
        let keeper = keeper_with(Stalled);
        let err = keeper.sample().await.unwrap_err();
        assert!(matches!(err, MetricsError::Timeout(d) if d == Duration::from_millis(500)));

        tokio::time::advance(Duration::from_secs(1)).await;
        let out = keeper.tick().await;
        assert!(matches!(out, TickOutcome::Ran(r) if !r.metrics_applied));
        assert!(keeper
            .snapshot()
            .await
            .status_message
            .starts_with("System error:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_metrics_keep_pet_alive() {
        let keeper = keeper_with(FixedMetrics::Unavailable("no procfs".into()));
        tokio::time::advance(Duration::from_secs(10)).await;
        keeper.tick().await;
        let snap = keeper.snapshot().await;
        assert_eq!(snap.hunger, 18.0);
        assert_eq!(snap.weight, 50.0);
        assert!(keeper.health().await.pet_alive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_and_reset() {
        let keeper = keeper_with(FixedMetrics::percentages(0.0, 0.0));
        let snap = keeper.pet().await;
        assert_eq!(snap.happiness, 85.0);
        let snap = keeper.rest().await;
        assert_eq!(snap.hunger, 10.0);
        let snap = keeper.process_killed(4242, Some("chrome")).await;
        assert_eq!(snap.sanity, 100.0);

        for _ in 0..10 {
            keeper.feed("nothing to see").await;
        }
        let health = keeper.health().await;
        assert_eq!(health.status, "ok");
        assert!(!health.pet_alive);
        assert_eq!(keeper.snapshot().await.status, PetStatus::Dead);

        let snap = keeper.reset().await;
        assert_eq!(snap.status, PetStatus::Happy);
        assert_eq!(snap.name, "sys.pet");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_runs_until_shutdown() {
        let keeper = keeper_with(FixedMetrics::percentages(100.0, 10.0));
        let (tx, rx) = watch::channel(false);
        let handle = keeper.spawn_ticker(rx);
        assert!(keeper.is_ticking());
        assert!(keeper.info().await.tick_loop_running);

        // First interval tick fires immediately and is throttled; the next
        // three each apply +5 fatigue.
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(keeper.snapshot().await.fatigue, 15.0);

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert!(!keeper.is_ticking());
        assert!(!keeper.info().await.tick_loop_running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_applies_every_period_despite_read_latency() {
        let keeper = keeper_with(Sluggish {
            latency: Duration::from_millis(10),
        });
        let (tx, rx) = watch::channel(false);
        let handle = keeper.spawn_ticker(rx);

        // Ticks at 1..=6 s all apply; the one at 0 s is throttled.
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        assert_eq!(keeper.snapshot().await.fatigue, 30.0);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_ticks_apply_once() {
        let keeper = keeper_with(Sluggish {
            latency: Duration::from_millis(10),
        });
        tokio::time::advance(Duration::from_secs(1)).await;

        let (a, b, c, d) = tokio::join!(keeper.tick(), keeper.tick(), keeper.tick(), keeper.tick());
        let ran = [a, b, c, d]
            .iter()
            .filter(|o| matches!(o, TickOutcome::Ran(_)))
            .count();
        assert_eq!(ran, 1);
        assert_eq!(keeper.snapshot().await.fatigue, 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_when_sender_dropped() {
        let keeper = keeper_with(FixedMetrics::percentages(0.0, 0.0));
        let (tx, rx) = watch::channel(false);
        let handle = keeper.spawn_ticker(rx);
        drop(tx);
        handle.await.unwrap();
        assert!(!keeper.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_serializes() {
        let keeper = keeper_with(FixedMetrics::percentages(0.0, 0.0));
        let info = keeper.info().await;
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["app"], "sys.pet");
        assert_eq!(json["tick_loop_running"], false);
        assert_eq!(json["pet"]["skin"], "👶");
    }
}
