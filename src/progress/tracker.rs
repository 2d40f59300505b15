use std::collections::HashMap;

use crate::models::ProgressCheckpoint;

/// Raw percentages at or above this count as fully watched.
const COMPLETE_AT_PERCENT: f64 = 99.5;
const SHORT_VIDEO_SECS: f64 = 60.0;

/// Watched percentage for a position, or `None` when the inputs are unusable.
pub fn watched_percentage(current_time: f64, duration: f64) -> Option<u8> {
    if !current_time.is_finite() || !duration.is_finite() || duration <= 0.0 {
        return None;
    }

    let raw = current_time.max(0.0) / duration * 100.0;
    if raw >= COMPLETE_AT_PERCENT {
        Some(100)
    } else {
        Some(raw.round().clamp(0.0, 99.0) as u8)
    }
}

/// Minimum gain in percentage points before another checkpoint is emitted.
pub fn save_threshold(duration: f64) -> u8 {
    if duration < SHORT_VIDEO_SECS {
        10
    } else {
        5
    }
}

/// Decides when watched progress is worth persisting, per video.
#[derive(Debug, Clone, Default)]
pub struct CheckpointTracker {
    last_saved: HashMap<String, u8>,
}

impl CheckpointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted value.
    pub fn seed(&mut self, video_id: &str, percentage: u8) {
        self.last_saved.insert(video_id.to_string(), percentage.min(100));
    }

    pub fn last_saved(&self, video_id: &str) -> u8 {
        self.last_saved.get(video_id).copied().unwrap_or(0)
    }

    pub fn on_time_update(
        &mut self,
        current_time: f64,
        duration: f64,
        video_id: &str,
    ) -> Option<ProgressCheckpoint> {
        let percent = watched_percentage(current_time, duration)?;
        let last = self.last_saved(video_id);

        let should_emit = if percent == 100 {
            last < 100
        } else {
            percent > last && percent - last >= save_threshold(duration)
        };

        should_emit.then(|| self.record(video_id, percent))
    }

    /// The video played to its natural end.
    pub fn on_ended(&mut self, video_id: &str) -> ProgressCheckpoint {
        self.record(video_id, 100)
    }

    /// The player is closing; flush any unsaved progress.
    pub fn on_close(
        &mut self,
        current_time: f64,
        duration: f64,
        video_id: &str,
    ) -> Option<ProgressCheckpoint> {
        if current_time <= 0.0 {
            return None;
        }
        let percent = watched_percentage(current_time, duration)?;
        (percent > self.last_saved(video_id)).then(|| self.record(video_id, percent))
    }

    fn record(&mut self, video_id: &str, percent: u8) -> ProgressCheckpoint {
        self.last_saved.insert(video_id.to_string(), percent);
        ProgressCheckpoint::new(video_id, percent)
    }
}
