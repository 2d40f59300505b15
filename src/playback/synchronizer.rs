//! Keeps the muted preview surface seeked and looping inside the upcoming
//! exercise while the primary surface plays through a break.
//!
//! All decisions happen in [`PlaybackSynchronizer::tick`]. Callers feed it the
//! primary surface's time on every time update and, while a break is active,
//! from a high-frequency loop as well. `clock` is a monotonic offset from any
//! fixed origin; deadlines are compared against it instead of running timers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::state::{BreakSchedule, PreviewPhase, PreviewWindow, ScheduledBreak, SyncFrame};
use super::surface::{PlayPoll, PreviewSurface};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncTuning {
    pub seek_timeout: Duration,
    pub exit_animation: Duration,
    /// How far before `preview_start` the preview may sit before it is re-seeked.
    pub drift_tolerance_secs: f64,
    pub final_countdown_secs: f64,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            seek_timeout: Duration::from_millis(500),
            exit_animation: Duration::from_millis(500),
            drift_tolerance_secs: 0.5,
            final_countdown_secs: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeekReason {
    BreakEntry,
    Drift,
    Loop,
}

#[derive(Debug, Clone, Copy)]
struct PendingSeek {
    target: f64,
    issued_at: Duration,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub seeks_issued: u32,
    pub seek_timeouts: u32,
    pub plays_issued: u32,
    pub play_rejections: u32,
    pub pauses_issued: u32,
}

pub struct PlaybackSynchronizer<S: PreviewSurface> {
    surface: S,
    schedule: BreakSchedule,
    tuning: SyncTuning,
    phase: PreviewPhase,
    active_break: Option<ScheduledBreak>,
    /// Start of the break the preview was last positioned for.
    last_break_start: Option<f64>,
    pending_seek: Option<PendingSeek>,
    /// Entry seek for the current break not issued yet because a play
    /// request was unresolved when the break was entered.
    entry_seek_due: bool,
    play_in_flight: bool,
    pause_requested: bool,
    exit_deadline: Option<Duration>,
    stats: SyncStats,
}

impl<S: PreviewSurface> PlaybackSynchronizer<S> {
    pub fn new(mut surface: S, schedule: BreakSchedule, tuning: SyncTuning) -> Self {
        surface.set_muted(true);
        surface.set_controls_visible(false);

        if schedule.is_disabled() {
            log_info!("no usable breaks; break preview disabled");
        }

        Self {
            surface,
            schedule,
            tuning,
            phase: PreviewPhase::Idle,
            active_break: None,
            last_break_start: None,
            pending_seek: None,
            entry_seek_due: false,
            play_in_flight: false,
            pause_requested: false,
            exit_deadline: None,
            stats: SyncStats::default(),
        }
    }

    pub fn phase(&self) -> PreviewPhase {
        self.phase
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn is_seek_pending(&self) -> bool {
        self.pending_seek.is_some()
    }

    pub fn is_play_in_flight(&self) -> bool {
        self.play_in_flight
    }

    /// Re-evaluate everything against the primary surface's position.
    pub fn tick(&mut self, clock: Duration, primary_time: f64, primary_playing: bool) -> SyncFrame {
        self.settle_pending(clock);

        let current = if primary_time.is_finite() {
            self.schedule.break_at(primary_time).cloned()
        } else {
            None
        };

        match current {
            Some(scheduled) => self.tick_in_break(clock, scheduled, primary_time, primary_playing),
            None => self.tick_outside_break(clock),
        }
    }

    fn tick_in_break(
        &mut self,
        clock: Duration,
        scheduled: ScheduledBreak,
        primary_time: f64,
        primary_playing: bool,
    ) -> SyncFrame {
        let window = PreviewWindow::for_break(&scheduled, self.tuning.final_countdown_secs);
        let entered = self.last_break_start != Some(scheduled.start);
        if entered {
            log_debug!(
                "entered break [{:.2}, {:.2}); preview [{:.2}, {:.2})",
                window.break_start,
                window.break_end,
                window.preview_start,
                window.preview_end
            );
            self.last_break_start = Some(scheduled.start);
            self.exit_deadline = None;
        }

        // Final countdown wins where it overlaps the popup window.
        self.phase = if primary_time >= window.last5_start {
            PreviewPhase::FinalCountdown
        } else {
            PreviewPhase::Approaching
        };

        self.position_preview(clock, &window, entered);
        if primary_playing {
            self.start_preview();
        } else {
            self.halt_preview();
        }

        let countdown = (self.phase == PreviewPhase::FinalCountdown).then(|| {
            (window.break_end - primary_time)
                .ceil()
                .clamp(1.0, self.tuning.final_countdown_secs.max(1.0)) as u8
        });
        let frame = SyncFrame {
            phase: self.phase,
            popup_visible: self.phase == PreviewPhase::Approaching
                && primary_time < window.popup_show_until,
            countdown,
            window: Some(window),
            next_label: scheduled.next_label.clone(),
        };
        self.active_break = Some(scheduled);
        frame
    }

    fn tick_outside_break(&mut self, clock: Duration) -> SyncFrame {
        if self.active_break.take().is_some() {
            log_debug!("left break; exit animation until {:?}", clock + self.tuning.exit_animation);
            self.phase = PreviewPhase::ExitAnimating;
            self.exit_deadline = Some(clock + self.tuning.exit_animation);
            self.last_break_start = None;
            self.entry_seek_due = false;
        }

        if self.phase == PreviewPhase::ExitAnimating {
            match self.exit_deadline {
                Some(deadline) if clock < deadline => {}
                _ => {
                    self.phase = PreviewPhase::Idle;
                    self.exit_deadline = None;
                }
            }
        }

        self.halt_preview();

        SyncFrame {
            phase: self.phase,
            ..SyncFrame::default()
        }
    }

    /// Resolve seeks and play requests issued on earlier ticks.
    fn settle_pending(&mut self, clock: Duration) {
        if let Some(pending) = self.pending_seek {
            if !self.surface.is_seeking() {
                self.pending_seek = None;
            } else if clock.saturating_sub(pending.issued_at) >= self.tuning.seek_timeout {
                log_warn!(
                    "preview seek to {:.2}s did not complete within {:?}; continuing",
                    pending.target,
                    self.tuning.seek_timeout
                );
                self.pending_seek = None;
                self.stats.seek_timeouts += 1;
            }
        }

        if self.play_in_flight {
            match self.surface.poll_play() {
                PlayPoll::Pending => {}
                PlayPoll::Started => {
                    self.play_in_flight = false;
                }
                PlayPoll::Rejected(reason) => {
                    log_debug!("preview play rejected: {reason}");
                    self.play_in_flight = false;
                    self.stats.play_rejections += 1;
                }
            }

            if !self.play_in_flight && self.pause_requested {
                self.pause_now();
            }
        }
    }

    fn position_preview(&mut self, clock: Duration, window: &PreviewWindow, entered: bool) {
        if entered {
            self.entry_seek_due = true;
        }

        let reason = if self.entry_seek_due {
            if self.play_in_flight {
                log_debug!("deferring entry seek until the pending play settles");
                None
            } else {
                self.entry_seek_due = false;
                // Stop whatever the preview was showing before moving it.
                self.pause_now();
                Some(SeekReason::BreakEntry)
            }
        } else if self.pending_seek.is_some() || self.play_in_flight {
            None
        } else {
            let time = self.surface.current_time();
            if time >= window.preview_end {
                Some(if self.surface.is_playing() {
                    SeekReason::Loop
                } else {
                    SeekReason::Drift
                })
            } else if time < window.preview_start - self.tuning.drift_tolerance_secs {
                Some(SeekReason::Drift)
            } else {
                None
            }
        };

        if let Some(reason) = reason {
            log_debug!("seeking preview to {:.2}s ({reason:?})", window.preview_start);
            self.surface.seek(window.preview_start);
            self.pending_seek = Some(PendingSeek {
                target: window.preview_start,
                issued_at: clock,
            });
            self.stats.seeks_issued += 1;
        }
    }

    fn start_preview(&mut self) {
        self.pause_requested = false;
        if self.pending_seek.is_some() || self.play_in_flight || self.surface.is_playing() {
            return;
        }
        self.surface.play();
        self.play_in_flight = true;
        self.stats.plays_issued += 1;
    }

    /// Pause the preview, deferring while a play request is unresolved.
    fn halt_preview(&mut self) {
        if self.play_in_flight {
            self.pause_requested = true;
            return;
        }
        self.pause_now();
    }

    fn pause_now(&mut self) {
        self.pause_requested = false;
        if self.surface.is_playing() {
            self.surface.pause();
            self.stats.pauses_issued += 1;
        }
    }

    /// Swap the driving break list. Everything tied to the old list is reset.
    pub fn set_schedule(&mut self, clock: Duration, schedule: BreakSchedule) {
        self.teardown(clock);
        self.schedule = schedule;
    }

    /// Cancel all break state and pause the preview. Returns `false` while a
    /// play request is still unresolved; call again until it returns `true`.
    pub fn teardown(&mut self, clock: Duration) -> bool {
        self.phase = PreviewPhase::Idle;
        self.active_break = None;
        self.last_break_start = None;
        self.exit_deadline = None;
        self.entry_seek_due = false;

        self.settle_pending(clock);
        self.pending_seek = None;
        self.halt_preview();
        !self.play_in_flight
    }
}
