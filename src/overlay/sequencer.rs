//! Window activation and edge easing shared by live preview and render-time baking.
//!
//! Both consumers call the same functions with a time in seconds; the renderer
//! converts its frame counter with [`crate::overlay::frame_time`] first. Nothing
//! here reads a clock.

use serde::{Deserialize, Serialize};

/// Fade lengths at each edge of a window, expressed in frames at `fps`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTiming {
    pub fade_in_frames: u32,
    pub fade_out_frames: u32,
    pub fps: u32,
}

impl Default for EdgeTiming {
    fn default() -> Self {
        Self {
            fade_in_frames: 15,
            fade_out_frames: 15,
            fps: 30,
        }
    }
}

/// True for exactly `window_start <= now < window_end`.
pub fn is_active(window_start: f64, window_end: f64, now: f64) -> bool {
    window_start <= now && now < window_end
}

/// Opacity/scale factor in `[0, 1]`: ramps up over the first `fade_in_frames`
/// of the window, down over the last `fade_out_frames`, and is 0 outside it.
pub fn edge_factor(now: f64, window_start: f64, window_end: f64, timing: EdgeTiming) -> f64 {
    if !is_active(window_start, window_end, now) {
        return 0.0;
    }

    let fps = f64::from(timing.fps.max(1));
    let elapsed_frames = (now - window_start) * fps;
    let remaining_frames = (window_end - now) * fps;

    let fade_in = ramp(elapsed_frames, timing.fade_in_frames);
    let fade_out = ramp(remaining_frames, timing.fade_out_frames);
    fade_in.min(fade_out)
}

fn ramp(frames: f64, length: u32) -> f64 {
    if length == 0 {
        return 1.0;
    }
    (frames / f64::from(length)).clamp(0.0, 1.0)
}

/// Cubic ease-out, used for the entry/exit scale pop.
pub(crate) fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_exactly_inside_half_open_window() {
        assert!(!is_active(10.0, 20.0, 9.999));
        assert!(is_active(10.0, 20.0, 10.0));
        assert!(is_active(10.0, 20.0, 19.999));
        assert!(!is_active(10.0, 20.0, 20.0));
    }

    #[test]
    fn activation_is_repeatable() {
        for step in 0..400 {
            let t = step as f64 * 0.07;
            assert_eq!(is_active(3.0, 17.5, t), is_active(3.0, 17.5, t));
            assert_eq!(is_active(3.0, 17.5, t), (3.0..17.5).contains(&t));
        }
    }

    #[test]
    fn fades_in_and_out_over_frame_counts() {
        let timing = EdgeTiming {
            fade_in_frames: 10,
            fade_out_frames: 20,
            fps: 10,
        };

        assert_eq!(edge_factor(0.0, 0.0, 10.0, timing), 0.0);
        assert!((edge_factor(0.5, 0.0, 10.0, timing) - 0.5).abs() < 1e-9);
        assert_eq!(edge_factor(5.0, 0.0, 10.0, timing), 1.0);
        assert!((edge_factor(9.0, 0.0, 10.0, timing) - 0.5).abs() < 1e-9);
        assert_eq!(edge_factor(10.0, 0.0, 10.0, timing), 0.0);
        assert_eq!(edge_factor(-1.0, 0.0, 10.0, timing), 0.0);
    }

    #[test]
    fn zero_length_fades_are_instant() {
        let timing = EdgeTiming {
            fade_in_frames: 0,
            fade_out_frames: 0,
            fps: 30,
        };
        assert_eq!(edge_factor(2.0, 2.0, 4.0, timing), 1.0);
        assert_eq!(edge_factor(3.99, 2.0, 4.0, timing), 1.0);
    }

    #[test]
    fn short_window_never_reaches_full_strength() {
        let timing = EdgeTiming::default();
        // 10 frames long, fades of 15 frames on both sides.
        let peak = (0..10)
            .map(|frame| edge_factor(frame as f64 / 30.0, 0.0, 10.0 / 30.0, timing))
            .fold(0.0, f64::max);
        assert!(peak < 1.0);
        assert!(peak > 0.0);
    }
}
