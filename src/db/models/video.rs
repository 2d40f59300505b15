use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Overlay;
use crate::segmentation::PersistedSegments;

/// Committed authoring output for one video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredVideo {
    pub video_id: String,
    pub segments: PersistedSegments,
    pub overlays: Vec<Overlay>,
    pub output_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}
