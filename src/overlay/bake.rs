use serde::Serialize;

use crate::models::{Overlay, OverlayKind};
use crate::overlay::sequencer::{ease_out_cubic, edge_factor, is_active, EdgeTiming};

const MIN_SCALE: f64 = 0.8;

/// Resolved look of one overlay at one instant.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrameState {
    pub id: String,
    pub kind: &'static str,
    pub opacity: f64,
    pub scale: f64,
    pub x: f64,
    pub y: f64,
    /// Whole seconds left in the window, for timer overlays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_remaining: Option<u32>,
}

/// Seconds at which `frame` starts.
pub fn frame_time(frame: u32, fps: u32) -> f64 {
    f64::from(frame) / f64::from(fps.max(1))
}

fn evaluate(overlay: &Overlay, now: f64, timing: EdgeTiming) -> Option<OverlayFrameState> {
    let (start, end) = (overlay.start_secs(), overlay.end_secs());
    if !is_active(start, end, now) {
        return None;
    }

    let factor = edge_factor(now, start, end, timing);
    let timer_remaining =
        (overlay.kind == OverlayKind::Timer).then(|| (end - now).ceil().max(0.0) as u32);

    Some(OverlayFrameState {
        id: overlay.id.clone(),
        kind: overlay.kind.as_str(),
        opacity: factor,
        scale: MIN_SCALE + (1.0 - MIN_SCALE) * ease_out_cubic(factor),
        x: overlay.x_percent(),
        y: overlay.y_percent(),
        timer_remaining,
    })
}

/// Active overlays at playback position `now` (seconds), for on-screen preview.
pub fn preview_at(overlays: &[Overlay], now: f64, timing: EdgeTiming) -> Vec<OverlayFrameState> {
    overlays
        .iter()
        .filter_map(|overlay| evaluate(overlay, now, timing))
        .collect()
}

/// Active overlays for output frame `frame`, for baking into the render.
pub fn bake_frame(overlays: &[Overlay], frame: u32, timing: EdgeTiming) -> Vec<OverlayFrameState> {
    preview_at(overlays, frame_time(frame, timing.fps), timing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlays() -> Vec<Overlay> {
        let mut timer = Overlay::timer(2.0, 12.0, 90.0, 10.0).unwrap();
        timer.id = "timer".into();
        let mut text = Overlay::text(5.0, 8.0, 50.0, 90.0, "Breathe").unwrap();
        text.id = "text".into();
        vec![timer, text]
    }

    #[test]
    fn preview_and_render_agree_on_every_frame() {
        let overlays = overlays();
        let timing = EdgeTiming::default();

        for frame in 0..(15 * timing.fps) {
            let baked = bake_frame(&overlays, frame, timing);
            let previewed = preview_at(&overlays, frame_time(frame, timing.fps), timing);
            assert_eq!(baked, previewed, "frame {frame}");
        }
    }

    #[test]
    fn overlapping_overlays_are_both_active() {
        let active = preview_at(&overlays(), 6.0, EdgeTiming::default());
        let ids: Vec<&str> = active.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["timer", "text"]);
    }

    #[test]
    fn timer_overlay_counts_down() {
        let active = preview_at(&overlays(), 8.2, EdgeTiming::default());
        assert_eq!(active[0].timer_remaining, Some(4));
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn entry_frame_is_transparent_and_shrunk() {
        let state = &preview_at(&overlays(), 2.0, EdgeTiming::default())[0];
        assert_eq!(state.opacity, 0.0);
        assert!((state.scale - MIN_SCALE).abs() < 1e-9);
    }
}
