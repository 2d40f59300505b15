use std::sync::{Arc, Mutex, MutexGuard};

use super::surface::{PlayPoll, PlayRejection, PreviewSurface};

/// Latency and policy knobs for [`SimulatedSurface`], counted in polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedSurfaceConfig {
    pub seek_latency_polls: u32,
    pub play_latency_polls: u32,
    pub reject_autoplay: bool,
}

#[derive(Debug, Default)]
struct SimState {
    time: f64,
    playing: bool,
    muted: bool,
    controls_visible: bool,
    seek_polls_left: Option<u32>,
    play_polls_left: Option<u32>,
    reject_autoplay: bool,
    config: SimulatedSurfaceConfig,
    seeks: Vec<f64>,
    play_calls: u32,
    pause_calls: u32,
    pauses_during_play_request: u32,
}

/// Deterministic in-memory preview surface.
///
/// Clones share state, so a driver can keep a handle for advancing time and
/// inspecting calls while the synchroniser owns another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSurface {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSurface {
    pub fn new(config: SimulatedSurfaceConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                controls_visible: true,
                reject_autoplay: config.reject_autoplay,
                config,
                ..SimState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Advance media time by `dt` seconds if playing and not mid-seek.
    pub fn advance(&self, dt: f64) {
        let mut state = self.lock();
        if state.playing && state.seek_polls_left.is_none() {
            state.time += dt;
        }
    }

    /// Jump the media clock without going through the synchroniser.
    pub fn set_time(&self, time: f64) {
        self.lock().time = time;
    }

    pub fn set_reject_autoplay(&self, reject: bool) {
        self.lock().reject_autoplay = reject;
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.lock().seeks.clone()
    }

    pub fn play_calls(&self) -> u32 {
        self.lock().play_calls
    }

    pub fn pause_calls(&self) -> u32 {
        self.lock().pause_calls
    }

    /// Pauses issued while a play request was unresolved.
    pub fn pauses_during_play_request(&self) -> u32 {
        self.lock().pauses_during_play_request
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn controls_visible(&self) -> bool {
        self.lock().controls_visible
    }
}

impl PreviewSurface for SimulatedSurface {
    fn current_time(&self) -> f64 {
        self.lock().time
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().muted = muted;
    }

    fn set_controls_visible(&mut self, visible: bool) {
        self.lock().controls_visible = visible;
    }

    fn seek(&mut self, to: f64) {
        let mut state = self.lock();
        state.time = to.max(0.0);
        state.seeks.push(to);
        state.seek_polls_left = Some(state.config.seek_latency_polls);
    }

    fn is_seeking(&mut self) -> bool {
        let mut state = self.lock();
        match state.seek_polls_left {
            None => false,
            Some(0) => {
                state.seek_polls_left = None;
                false
            }
            Some(left) => {
                state.seek_polls_left = Some(left - 1);
                true
            }
        }
    }

    fn play(&mut self) {
        let mut state = self.lock();
        state.play_calls += 1;
        state.play_polls_left = Some(state.config.play_latency_polls);
    }

    fn poll_play(&mut self) -> PlayPoll {
        let mut state = self.lock();
        match state.play_polls_left {
            None => {
                if state.playing {
                    PlayPoll::Started
                } else {
                    PlayPoll::Rejected(PlayRejection::Other("no play request".into()))
                }
            }
            Some(0) => {
                state.play_polls_left = None;
                if state.reject_autoplay {
                    PlayPoll::Rejected(PlayRejection::AutoplayBlocked)
                } else {
                    state.playing = true;
                    PlayPoll::Started
                }
            }
            Some(left) => {
                state.play_polls_left = Some(left - 1);
                PlayPoll::Pending
            }
        }
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        state.pause_calls += 1;
        state.playing = false;
        if state.play_polls_left.take().is_some() {
            state.pauses_during_play_request += 1;
        }
    }
}
