use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::overlay::EdgeTiming;
use crate::playback::{RecoveryPolicy, SyncTuning};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Player tuning, stored as JSON next to the database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerSettings {
    pub preview_tick_hz: u32,
    pub seek_timeout_ms: u64,
    pub exit_animation_ms: u64,
    pub drift_tolerance_secs: f64,
    pub final_countdown_secs: f64,
    pub start_countdown_secs: f64,
    pub stall_threshold_ms: u64,
    pub stall_nudge_secs: f64,
    pub max_nudges_before_reload: u32,
    pub overlay_fps: u32,
    pub overlay_fade_in_frames: u32,
    pub overlay_fade_out_frames: u32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            preview_tick_hz: 60,
            seek_timeout_ms: 500,
            exit_animation_ms: 500,
            drift_tolerance_secs: 0.5,
            final_countdown_secs: 5.0,
            start_countdown_secs: 5.0,
            stall_threshold_ms: 2_000,
            stall_nudge_secs: 0.1,
            max_nudges_before_reload: 3,
            overlay_fps: 30,
            overlay_fade_in_frames: 15,
            overlay_fade_out_frames: 15,
        }
    }
}

impl PlayerSettings {
    pub fn sync_tuning(&self) -> SyncTuning {
        SyncTuning {
            seek_timeout: Duration::from_millis(self.seek_timeout_ms),
            exit_animation: Duration::from_millis(self.exit_animation_ms),
            drift_tolerance_secs: self.drift_tolerance_secs,
            final_countdown_secs: self.final_countdown_secs,
        }
    }

    pub fn edge_timing(&self) -> EdgeTiming {
        EdgeTiming {
            fade_in_frames: self.overlay_fade_in_frames,
            fade_out_frames: self.overlay_fade_out_frames,
            fps: self.overlay_fps,
        }
    }

    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            stall_threshold: Duration::from_millis(self.stall_threshold_ms),
            nudge_secs: self.stall_nudge_secs,
            max_nudges_before_reload: self.max_nudges_before_reload,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<PlayerSettings>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable as JSON.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!("ignoring malformed settings at {}: {err}", path.display());
                PlayerSettings::default()
            })
        } else {
            PlayerSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, PlayerSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlayerSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn player(&self) -> PlayerSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: PlayerSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &PlayerSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
