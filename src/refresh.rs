//! Background refresh of crop overviews
//!
//! Overviews are recomputed from scratch whenever something may have
//! changed what is due:
//! 1. a fixed interval tick (hourly by default, to catch window boundaries)
//! 2. the record set changing (storage mutation, explicit update notice)
//! 3. the app becoming visible or focused again
//! 4. the farmer selecting a different crop
//!
//! The latest snapshot is published on a `watch` channel. Nothing is cached
//! between recomputes; every snapshot is built from the record source and
//! the clock at that moment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::models::CropRecord;
use crate::overview::{CropEngine, CropOverview};

/// ---------------------------------------------------------------------------
/// Collaborators
/// ---------------------------------------------------------------------------

/// Source of "now"; injected so refreshes are deterministic under test
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Supplies the current user's crop records; re-read on every refresh
pub trait RecordSource: Send + Sync {
    fn records(&self) -> Vec<CropRecord>;
}

impl RecordSource for Vec<CropRecord> {
    fn records(&self) -> Vec<CropRecord> {
        self.clone()
    }
}

impl RecordSource for std::sync::RwLock<Vec<CropRecord>> {
    fn records(&self) -> Vec<CropRecord> {
        match self.read() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// ---------------------------------------------------------------------------
/// Triggers and Snapshots
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Storage was mutated elsewhere (another tab, sync)
    StorageChanged,
    /// Explicit "records updated" notification from the UI
    RecordsUpdated,
    /// Window regained focus or visibility
    VisibilityRegained,
    /// Farmer picked a crop to inspect
    SelectCrop(String),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    Startup,
    Timer,
    StorageChanged,
    RecordsUpdated,
    VisibilityRegained,
    CropSelected,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSnapshot {
    pub generated_at: DateTime<Utc>,
    pub reason: RefreshReason,
    pub selected: Option<String>,
    pub overviews: Vec<CropOverview>,
}

impl RefreshSnapshot {
    pub fn selected_overview(&self) -> Option<&CropOverview> {
        let id = self.selected.as_deref()?;
        self.overviews.iter().find(|o| o.crop_id == id)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Refresh service has stopped")]
    Stopped,
}

/// ---------------------------------------------------------------------------
/// Service
/// ---------------------------------------------------------------------------

pub struct RefreshHandle {
    triggers: mpsc::Sender<RefreshTrigger>,
    snapshots: watch::Receiver<RefreshSnapshot>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub async fn trigger(&self, trigger: RefreshTrigger) -> Result<(), RefreshError> {
        self.triggers
            .send(trigger)
            .await
            .map_err(|_| RefreshError::Stopped)
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshSnapshot> {
        self.snapshots.clone()
    }

    pub fn latest(&self) -> RefreshSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Ask the loop to stop and wait for it
    pub async fn shutdown(self) {
        let _ = self.triggers.send(RefreshTrigger::Shutdown).await;
        let _ = self.task.await;
    }
}

struct Refresher {
    engine: Arc<CropEngine>,
    clock: Arc<dyn Clock>,
    source: Arc<dyn RecordSource>,
    selected: Option<String>,
}

impl Refresher {
    fn snapshot(&self, reason: RefreshReason) -> RefreshSnapshot {
        let now = self.clock.now();
        let overviews: Vec<CropOverview> = self
            .source
            .records()
            .iter()
            .map(|record| self.engine.overview(record, now))
            .collect();

        debug!(?reason, crops = overviews.len(), "Recomputed crop overviews");

        RefreshSnapshot {
            generated_at: now,
            reason,
            selected: self.selected.clone(),
            overviews,
        }
    }
}

/// Compute an initial snapshot and start the refresh loop.
///
/// Must be called from within a tokio runtime.
pub fn spawn_refresher(
    engine: Arc<CropEngine>,
    clock: Arc<dyn Clock>,
    source: Arc<dyn RecordSource>,
) -> RefreshHandle {
    let period = engine.config().refresh_interval;
    let mut refresher = Refresher {
        engine,
        clock,
        source,
        selected: None,
    };

    let (trigger_tx, mut trigger_rx) = mpsc::channel(32);
    let (snapshot_tx, snapshot_rx) = watch::channel(refresher.snapshot(RefreshReason::Startup));

    info!(interval_secs = period.as_secs(), "Starting crop refresh service");

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let reason = tokio::select! {
                _ = ticker.tick() => RefreshReason::Timer,
                trigger = trigger_rx.recv() => match trigger {
                    None | Some(RefreshTrigger::Shutdown) => break,
                    Some(RefreshTrigger::StorageChanged) => RefreshReason::StorageChanged,
                    Some(RefreshTrigger::RecordsUpdated) => RefreshReason::RecordsUpdated,
                    Some(RefreshTrigger::VisibilityRegained) => RefreshReason::VisibilityRegained,
                    Some(RefreshTrigger::SelectCrop(id)) => {
                        refresher.selected = Some(id);
                        RefreshReason::CropSelected
                    }
                },
            };

            info!(?reason, "Refreshing crop overviews");
            if snapshot_tx.send(refresher.snapshot(reason)).is_err() {
                break;
            }
        }

        info!("Crop refresh service stopped");
    });

    RefreshHandle {
        triggers: trigger_tx,
        snapshots: snapshot_rx,
        task,
    }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::ActivityCategory;
    use crate::test_utils::{mock_crop_record, utc};
    use std::sync::RwLock;
    use std::time::Duration;

    fn engine(interval: Duration) -> Arc<CropEngine> {
        let config = EngineConfig::default().with_refresh_interval(interval);
        Arc::new(CropEngine::new(config).expect("builtin engine"))
    }

    fn records() -> Vec<CropRecord> {
        let mut rice = mock_crop_record("Rice", "2024-01-01", Some("2024-05-01"));
        rice.id = "rice-1".to_string();
        let mut wheat = mock_crop_record("Wheat", "2023-11-01", Some("2024-03-01"));
        wheat.id = "wheat-1".to_string();
        vec![rice, wheat]
    }

    #[tokio::test]
    async fn test_startup_snapshot_covers_all_records() {
        let clock = Arc::new(FixedClock(utc(2024, 1, 22, 7)));
        let handle = spawn_refresher(engine(Duration::from_secs(3600)), clock, Arc::new(records()));

        let snapshot = handle.latest();
        assert_eq!(snapshot.reason, RefreshReason::Startup);
        assert_eq!(snapshot.overviews.len(), 2);
        assert_eq!(snapshot.generated_at, utc(2024, 1, 22, 7));
        assert!(snapshot.selected_overview().is_none());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_select_crop_publishes_selection() {
        let clock = Arc::new(FixedClock(utc(2024, 1, 22, 7)));
        let handle = spawn_refresher(engine(Duration::from_secs(3600)), clock, Arc::new(records()));
        let mut rx = handle.subscribe();

        handle
            .trigger(RefreshTrigger::SelectCrop("wheat-1".to_string()))
            .await
            .unwrap();
        rx.changed().await.unwrap();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.reason, RefreshReason::CropSelected);
        let wheat = snapshot.selected_overview().expect("selected wheat");
        assert_eq!(wheat.crop_type, "Wheat");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_storage_change_rereads_records() {
        let source = Arc::new(RwLock::new(records()));
        let clock = Arc::new(FixedClock(utc(2024, 1, 22, 7)));
        let handle = spawn_refresher(
            engine(Duration::from_secs(3600)),
            clock,
            source.clone(),
        );
        let mut rx = handle.subscribe();

        source.write().unwrap().push(mock_crop_record("Maize", "2024-01-10", None));
        handle.trigger(RefreshTrigger::StorageChanged).await.unwrap();
        rx.changed().await.unwrap();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.reason, RefreshReason::StorageChanged);
        assert_eq!(snapshot.overviews.len(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_tick_recomputes() {
        let clock = Arc::new(FixedClock(utc(2024, 1, 22, 7)));
        let handle = spawn_refresher(engine(Duration::from_secs(3600)), clock, Arc::new(records()));
        let mut rx = handle.subscribe();

        // Paused time auto-advances to the next tick once the runtime is idle
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.reason, RefreshReason::Timer);
        let rice = &snapshot.overviews[0];
        assert_eq!(rice.activities[0].category, ActivityCategory::Irrigation);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_trigger_after_shutdown_fails() {
        let clock = Arc::new(FixedClock(utc(2024, 1, 22, 7)));
        let handle = spawn_refresher(engine(Duration::from_secs(3600)), clock, Arc::new(records()));

        handle.trigger(RefreshTrigger::Shutdown).await.unwrap();
        // Wait for the loop to drop its receiver
        while !handle.triggers.is_closed() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            handle.trigger(RefreshTrigger::VisibilityRegained).await,
            Err(RefreshError::Stopped)
        );
    }
}
