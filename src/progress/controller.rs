use std::sync::{Arc, Mutex as StdMutex};

use anyhow::Result;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::ProgressCheckpoint;

use super::tracker::CheckpointTracker;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Destination for emitted checkpoints. Saves are fire-and-forget: an
/// implementation must not block and must swallow its own failures.
pub trait CheckpointSink: Send + Sync {
    fn save(&self, checkpoint: ProgressCheckpoint);
}

/// Persists checkpoints on a background task.
#[derive(Clone)]
pub struct DatabaseSink {
    db: Database,
}

impl DatabaseSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CheckpointSink for DatabaseSink {
    fn save(&self, checkpoint: ProgressCheckpoint) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log_warn!(
                "no async runtime; dropping checkpoint {}% for {}",
                checkpoint.percentage,
                checkpoint.video_id
            );
            return;
        };

        let db = self.db.clone();
        runtime.spawn(async move {
            if let Err(err) = db.save_checkpoint(&checkpoint).await {
                log_warn!(
                    "failed to save checkpoint {}% for {}: {err:#}",
                    checkpoint.percentage,
                    checkpoint.video_id
                );
            }
        });
    }
}

/// Keeps emitted checkpoints in memory; handy for previews and tests.
#[derive(Clone, Default)]
pub struct MemorySink {
    saved: Arc<StdMutex<Vec<ProgressCheckpoint>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<ProgressCheckpoint> {
        match self.saved.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CheckpointSink for MemorySink {
    fn save(&self, checkpoint: ProgressCheckpoint) {
        let mut guard = match self.saved.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(checkpoint);
    }
}

/// Feeds player events through a [`CheckpointTracker`] and hands anything it
/// emits to the sink.
#[derive(Clone)]
pub struct ProgressController {
    tracker: Arc<Mutex<CheckpointTracker>>,
    sink: Arc<dyn CheckpointSink>,
}

impl ProgressController {
    pub fn new(sink: Arc<dyn CheckpointSink>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(CheckpointTracker::new())),
            sink,
        }
    }

    /// Seed the tracker from the stored checkpoint for `video_id`, if any.
    pub async fn load(&self, db: &Database, video_id: &str) -> Result<u8> {
        let stored = db.get_checkpoint(video_id).await?.unwrap_or(0);
        self.tracker.lock().await.seed(video_id, stored);
        log_debug!("resuming {video_id} from {stored}%");
        Ok(stored)
    }

    pub async fn seed(&self, video_id: &str, percentage: u8) {
        self.tracker.lock().await.seed(video_id, percentage);
    }

    pub async fn last_saved(&self, video_id: &str) -> u8 {
        self.tracker.lock().await.last_saved(video_id)
    }

    pub async fn on_time_update(&self, current_time: f64, duration: f64, video_id: &str) {
        let emitted = self
            .tracker
            .lock()
            .await
            .on_time_update(current_time, duration, video_id);
        self.emit(emitted);
    }

    pub async fn on_ended(&self, video_id: &str) {
        let checkpoint = self.tracker.lock().await.on_ended(video_id);
        self.emit(Some(checkpoint));
    }

    pub async fn on_close(&self, current_time: f64, duration: f64, video_id: &str) {
        let emitted = self
            .tracker
            .lock()
            .await
            .on_close(current_time, duration, video_id);
        self.emit(emitted);
    }

    fn emit(&self, checkpoint: Option<ProgressCheckpoint>) {
        if let Some(checkpoint) = checkpoint {
            log_debug!(
                "checkpoint {}% for {}",
                checkpoint.percentage,
                checkpoint.video_id
            );
            self.sink.save(checkpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_emitted_checkpoints_to_sink() {
        let sink = MemorySink::new();
        let controller = ProgressController::new(Arc::new(sink.clone()));

        for time in [4.0, 6.0, 20.0, 49.8] {
            controller.on_time_update(time, 50.0, "v").await;
        }
        controller.on_ended("v").await;

        let saved: Vec<u8> = sink.saved().iter().map(|c| c.percentage).collect();
        assert_eq!(saved, vec![12, 40, 100, 100]);
    }

    #[tokio::test]
    async fn database_sink_persists_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("repcast.sqlite3")).unwrap();
        let controller = ProgressController::new(Arc::new(DatabaseSink::new(db.clone())));

        assert_eq!(controller.load(&db, "v").await.unwrap(), 0);
        controller.on_time_update(30.0, 100.0, "v").await;

        let mut stored = None;
        for _ in 0..50 {
            stored = db.get_checkpoint("v").await.unwrap();
            if stored.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(stored, Some(30));

        let resumed = ProgressController::new(Arc::new(MemorySink::new()));
        assert_eq!(resumed.load(&db, "v").await.unwrap(), 30);
        assert_eq!(resumed.last_saved("v").await, 30);
    }
}
