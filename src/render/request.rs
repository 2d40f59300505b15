use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Overlay, SegmentList};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SourceVideo {
    Url { url: String },
    File { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderExercise {
    pub name: String,
    pub start: f64,
    pub duration_seconds: f64,
}

/// Job handed to the external renderer at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub source_video: SourceVideo,
    pub exercises: Vec<RenderExercise>,
    pub overlays: Vec<Overlay>,
}

impl RenderRequest {
    pub fn new(source_video: SourceVideo, segments: &SegmentList, overlays: &[Overlay]) -> Self {
        Self {
            source_video,
            exercises: segments
                .exercises()
                .map(|e| RenderExercise {
                    name: e.label.clone(),
                    start: e.start_time,
                    duration_seconds: e.duration(),
                })
                .collect(),
            overlays: overlays.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RenderResponse {
    #[serde(rename_all = "camelCase")]
    Success { output_url: String },
    Failure { error: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("renderer rejected the job: {0}")]
    Rejected(String),
    #[error("renderer unavailable: {0}")]
    Transport(String),
}

/// The external video renderer. Transcoding itself happens elsewhere.
pub trait Renderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderResponse>;
}
