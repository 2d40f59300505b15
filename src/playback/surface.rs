use thiserror::Error;

/// Why a `play()` request did not start playback. Never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlayRejection {
    #[error("autoplay blocked by playback policy")]
    AutoplayBlocked,
    #[error("play request interrupted by pause")]
    InterruptedByPause,
    #[error("play request failed: {0}")]
    Other(String),
}

/// Outcome of an outstanding `play()` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayPoll {
    Pending,
    Started,
    Rejected(PlayRejection),
}

/// The secondary playback surface the synchroniser drives.
///
/// Seeks and play requests complete asynchronously; completion is observed by
/// polling `is_seeking` and `poll_play` on later ticks.
pub trait PreviewSurface {
    fn current_time(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    fn set_controls_visible(&mut self, visible: bool);

    /// Start a seek. The surface reports `is_seeking() == true` until it lands.
    fn seek(&mut self, to: f64);

    fn is_seeking(&mut self) -> bool;

    /// Start a play request; resolve it through `poll_play`.
    fn play(&mut self);

    fn poll_play(&mut self) -> PlayPoll;

    fn pause(&mut self);
}
