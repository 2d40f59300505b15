use serde::{Deserialize, Serialize};

/// Watched percentage for one video, 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCheckpoint {
    pub video_id: String,
    pub percentage: u8,
}

impl ProgressCheckpoint {
    pub fn new(video_id: impl Into<String>, percentage: u8) -> Self {
        Self {
            video_id: video_id.into(),
            percentage: percentage.min(100),
        }
    }
}
