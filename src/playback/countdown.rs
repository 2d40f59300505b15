use std::time::Duration;

use serde::Serialize;

/// How the program-start countdown is triggered for one video.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum StartCountdownMode {
    /// First exercise starts at 0: hold playback paused while counting down.
    HoldAtStart,
    /// First exercise starts later: count down over the seconds before it
    /// while playback keeps running.
    Preroll { exercise_start: f64 },
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CountdownView {
    pub value: Option<u8>,
    /// True while the primary surface must stay paused.
    pub hold_playback: bool,
}

/// Countdown shown when a program video opens. The mode is fixed at creation.
#[derive(Debug, Clone)]
pub struct StartCountdown {
    mode: Option<StartCountdownMode>,
    length_secs: f64,
    started_at: Option<Duration>,
    finished: bool,
}

impl StartCountdown {
    /// Pick the mode from the first exercise's start. `None`, negative or
    /// non-finite starts disable the countdown.
    pub fn choose(first_exercise_start: Option<f64>, length_secs: f64) -> Self {
        let mode = match first_exercise_start {
            Some(start) if start.is_finite() && start > 0.0 => {
                Some(StartCountdownMode::Preroll {
                    exercise_start: start,
                })
            }
            Some(start) if start == 0.0 => Some(StartCountdownMode::HoldAtStart),
            _ => None,
        };

        Self {
            mode,
            length_secs: if length_secs.is_finite() && length_secs > 0.0 {
                length_secs
            } else {
                5.0
            },
            started_at: None,
            finished: false,
        }
    }

    pub fn mode(&self) -> Option<StartCountdownMode> {
        self.mode
    }

    /// Record when the held countdown began. Sampling starts it implicitly.
    pub fn begin(&mut self, clock: Duration) {
        if self.started_at.is_none() {
            self.started_at = Some(clock);
        }
    }

    pub fn sample(&mut self, clock: Duration, primary_time: f64) -> CountdownView {
        match self.mode {
            None => CountdownView::default(),
            Some(StartCountdownMode::HoldAtStart) => self.sample_hold(clock),
            Some(StartCountdownMode::Preroll { exercise_start }) => {
                self.sample_preroll(exercise_start, primary_time)
            }
        }
    }

    fn sample_hold(&mut self, clock: Duration) -> CountdownView {
        if self.finished {
            return CountdownView::default();
        }
        self.begin(clock);

        let started_at = self.started_at.unwrap_or(clock);
        let elapsed = clock.saturating_sub(started_at).as_secs_f64();
        if elapsed >= self.length_secs {
            self.finished = true;
            return CountdownView::default();
        }

        CountdownView {
            value: Some(self.whole_seconds(self.length_secs - elapsed)),
            hold_playback: true,
        }
    }

    fn sample_preroll(&self, exercise_start: f64, primary_time: f64) -> CountdownView {
        let window_start = (exercise_start - self.length_secs).max(0.0);
        if !(window_start <= primary_time && primary_time < exercise_start) {
            return CountdownView::default();
        }

        CountdownView {
            value: Some(self.whole_seconds(exercise_start - primary_time)),
            hold_playback: false,
        }
    }

    fn whole_seconds(&self, remaining: f64) -> u8 {
        remaining.ceil().clamp(1.0, self.length_secs.ceil()) as u8
    }
}
