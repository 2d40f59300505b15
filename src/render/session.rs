use anyhow::{anyhow, Result};

use crate::db::{Database, StoredVideo};
use crate::models::{Overlay, Segment, SegmentList};
use crate::overlay::{bake_frame, preview_at, EdgeTiming, OverlayFrameState};
use crate::segmentation::{generate, GeneratorConfig, PersistedSegments};

use super::request::{RenderError, RenderRequest, RenderResponse, Renderer, SourceVideo};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const RESTORED_BREAK_NAME: &str = "Break";

/// In-memory authoring state for one video, from first edit until the
/// rendered result is committed.
#[derive(Debug, Clone)]
pub struct AuthoringSession {
    video_id: String,
    segments: SegmentList,
    overlays: Vec<Overlay>,
    last_error: Option<String>,
}

impl AuthoringSession {
    pub fn new(video_id: impl Into<String>, segments: SegmentList) -> Self {
        Self {
            video_id: video_id.into(),
            segments,
            overlays: Vec::new(),
            last_error: None,
        }
    }

    pub fn generated(video_id: impl Into<String>, config: &GeneratorConfig) -> Result<Self> {
        Ok(Self::new(video_id, generate(config)?))
    }

    /// Reopen a committed video for editing.
    pub fn resume(stored: StoredVideo) -> Result<Self> {
        let mut segments: Vec<Segment> = stored
            .segments
            .exercises
            .iter()
            .map(|e| Segment::exercise(e.name.clone(), e.start_time, e.end_time))
            .collect();
        segments.extend(stored.segments.breaks.iter().map(|b| {
            Segment::rest(
                RESTORED_BREAK_NAME,
                b.start_time,
                b.end_time,
                b.next_exercise_name.clone(),
            )
        }));
        segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        Ok(Self {
            video_id: stored.video_id,
            segments: SegmentList::new(segments)?,
            overlays: stored.overlays,
            last_error: None,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn segments(&self) -> &SegmentList {
        &self.segments
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Error from the last failed submission, for display.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replace the segment list with a fresh generation. The previous list,
    /// including any renames, is discarded.
    pub fn regenerate(&mut self, config: &GeneratorConfig) -> Result<()> {
        self.segments = generate(config)?;
        Ok(())
    }

    pub fn rename_segment(&mut self, index: usize, label: impl Into<String>) -> Result<()> {
        self.segments.rename(index, label)
    }

    pub fn add_overlay(&mut self, overlay: Overlay) -> Result<()> {
        if !(overlay.end_secs() > overlay.start_secs()) {
            return Err(anyhow!(
                "overlay {} has an empty window [{}, {})",
                overlay.id,
                overlay.start_time,
                overlay.end_time
            ));
        }
        self.overlays.push(overlay);
        Ok(())
    }

    pub fn remove_overlay(&mut self, id: &str) -> Option<Overlay> {
        let index = self.overlays.iter().position(|o| o.id == id)?;
        Some(self.overlays.remove(index))
    }

    /// Overlays as they appear at playback position `now`, for the editor preview.
    pub fn preview_overlays(&self, now: f64, timing: EdgeTiming) -> Vec<OverlayFrameState> {
        preview_at(&self.overlays, now, timing)
    }

    /// Overlays as they are baked into output frame `frame`.
    pub fn bake_overlays(&self, frame: u32, timing: EdgeTiming) -> Vec<OverlayFrameState> {
        bake_frame(&self.overlays, frame, timing)
    }

    pub fn render_request(&self, source: SourceVideo) -> RenderRequest {
        RenderRequest::new(source, &self.segments, &self.overlays)
    }

    /// Send the current state to the renderer. On failure the error is kept
    /// for display and segments and overlays stay as they were.
    pub fn submit<R: Renderer>(
        &mut self,
        renderer: &R,
        source: SourceVideo,
    ) -> Result<String, RenderError> {
        let request = self.render_request(source);
        let outcome = match renderer.render(&request) {
            Ok(RenderResponse::Success { output_url }) => Ok(output_url),
            Ok(RenderResponse::Failure { error }) => Err(RenderError::Rejected(error)),
            Err(err) => Err(RenderError::Transport(format!("{err:#}"))),
        };

        match &outcome {
            Ok(url) => {
                log_info!("rendered {} to {url}", self.video_id);
                self.last_error = None;
            }
            Err(err) => {
                log_warn!("render of {} failed: {err}", self.video_id);
                self.last_error = Some(err.to_string());
            }
        }
        outcome
    }

    /// Persist the committed state and drop the in-memory copy.
    pub async fn commit(self, db: &Database, output_url: &str) -> Result<StoredVideo> {
        let persisted = PersistedSegments::from(&self.segments);
        db.save_video_segments(&self.video_id, &persisted, &self.overlays, Some(output_url))
            .await
    }
}
