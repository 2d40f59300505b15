pub mod db;
pub mod models;
pub mod overlay;
pub mod playback;
pub mod progress;
pub mod render;
pub mod segmentation;
pub mod settings;
pub mod utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

pub use db::{Database, StoredVideo};
pub use models::{Overlay, OverlayKind, ProgressCheckpoint, Segment, SegmentKind, SegmentList};
pub use overlay::{EdgeTiming, OverlayFrameState};
pub use playback::{
    BreakSchedule, PlaybackSynchronizer, PreviewController, PreviewPhase, PreviewSurface,
    SyncFrame, SyncTuning,
};
pub use progress::{DatabaseSink, ProgressController};
pub use render::{AuthoringSession, RenderError, Renderer};
pub use segmentation::{generate, GeneratorConfig, PersistedSegments};
pub use settings::{PlayerSettings, SettingsStore};
pub use utils::logging::init_logging;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

pub const DB_FILE_NAME: &str = "repcast.sqlite3";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Long-lived services shared by every player opened from one data directory.
pub struct AppState {
    pub db: Database,
    pub settings: SettingsStore,
    pub progress: ProgressController,
}

impl AppState {
    /// Open (or create) the store and settings under `data_dir`.
    ///
    /// Checkpoint writes are spawned on the ambient tokio runtime, so call
    /// this from inside one.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let db = Database::new(data_dir.join(DB_FILE_NAME))?;
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?;
        let progress = ProgressController::new(Arc::new(DatabaseSink::new(db.clone())));

        crate::log_info!("opened data directory {}", data_dir.display());

        Ok(Self {
            db,
            settings,
            progress,
        })
    }

    /// Break schedule for a video, or a disabled one when nothing usable
    /// has been committed for it.
    pub async fn break_schedule(&self, video_id: &str) -> Result<BreakSchedule> {
        let stored = self.db.get_video_segments(video_id).await?;
        Ok(BreakSchedule::from_persisted(
            stored.as_ref().map(|video| &video.segments),
        ))
    }

    /// Reopen a committed video in the editor.
    pub async fn resume_authoring(&self, video_id: &str) -> Result<AuthoringSession> {
        let stored = self
            .db
            .get_video_segments(video_id)
            .await?
            .with_context(|| format!("no committed video {video_id}"))?;
        AuthoringSession::resume(stored)
    }

    /// Overlays of a committed video at playback position `now`, faded with
    /// the current overlay settings.
    pub async fn preview_overlays(
        &self,
        video_id: &str,
        now: f64,
    ) -> Result<Vec<OverlayFrameState>> {
        let session = self.resume_authoring(video_id).await?;
        Ok(session.preview_overlays(now, self.settings.player().edge_timing()))
    }

    /// Overlays of a committed video as baked into output frame `frame`.
    pub async fn bake_overlays(
        &self,
        video_id: &str,
        frame: u32,
    ) -> Result<Vec<OverlayFrameState>> {
        let session = self.resume_authoring(video_id).await?;
        Ok(session.bake_overlays(frame, self.settings.player().edge_timing()))
    }

    /// Preview controller for one viewing session, tuned from current settings.
    pub async fn open_player<S: PreviewSurface + Send + 'static>(
        &self,
        video_id: &str,
        surface: S,
    ) -> Result<PreviewController<S>> {
        let schedule = self.break_schedule(video_id).await?;
        let settings = self.settings.player();
        self.progress.load(&self.db, video_id).await?;
        Ok(PreviewController::new(
            surface,
            schedule,
            settings.sync_tuning(),
            settings.preview_tick_hz,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{SimulatedSurface, SimulatedSurfaceConfig};

    #[tokio::test]
    async fn player_for_unknown_video_is_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();

        let schedule = state.break_schedule("missing").await.unwrap();
        assert!(schedule.is_disabled());

        let player = state
            .open_player("missing", SimulatedSurface::new(SimulatedSurfaceConfig::default()))
            .await
            .unwrap();
        let frame = player.on_time_update(50.0, true).await;
        assert_eq!(frame.phase, PreviewPhase::Idle);
        player.shutdown().await;
    }

    #[tokio::test]
    async fn player_uses_committed_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        let segments = generate(&GeneratorConfig::for_duration(185.0)).unwrap();
        state
            .db
            .save_video_segments("v1", &PersistedSegments::from(&segments), &[], None)
            .await
            .unwrap();

        let schedule = state.break_schedule("v1").await.unwrap();
        assert_eq!(schedule.breaks().len(), 3);
        assert_eq!(schedule.breaks()[2].preview_start, 180.0);
    }

    #[tokio::test]
    async fn overlay_states_follow_stored_settings() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path()).unwrap();
        let segments = generate(&GeneratorConfig::for_duration(185.0)).unwrap();
        let overlays = vec![Overlay::timer(2.0, 12.0, 90.0, 10.0).unwrap()];
        state
            .db
            .save_video_segments("v1", &PersistedSegments::from(&segments), &overlays, None)
            .await
            .unwrap();

        // Defaults: 15 frames at 30fps, fully faded in by 2.5s.
        let active = state.preview_overlays("v1", 2.5).await.unwrap();
        assert_eq!(active[0].opacity, 1.0);
        assert!(state.bake_overlays("v1", 25).await.unwrap().is_empty());

        state
            .settings
            .update(PlayerSettings {
                overlay_fps: 10,
                overlay_fade_in_frames: 10,
                overlay_fade_out_frames: 0,
                ..PlayerSettings::default()
            })
            .unwrap();

        let active = state.preview_overlays("v1", 2.5).await.unwrap();
        assert_eq!(active[0].opacity, 0.5);
        assert_eq!(state.bake_overlays("v1", 25).await.unwrap(), active);
        assert!(state.preview_overlays("missing", 2.5).await.is_err());
    }
}
