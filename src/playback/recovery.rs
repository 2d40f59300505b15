use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum RecoveryAction {
    /// Step the primary surface slightly forward past the stuck position.
    Nudge { to: f64 },
    /// Reload the source and resume from `resume_at`.
    Reload { resume_at: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryPolicy {
    pub stall_threshold: Duration,
    pub nudge_secs: f64,
    pub max_nudges_before_reload: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            stall_threshold: Duration::from_millis(2_000),
            nudge_secs: 0.1,
            max_nudges_before_reload: 3,
        }
    }
}

/// Watches the primary surface for stalls and suggests a recovery step.
///
/// Only advises; the primary surface belongs to the UI, which applies the
/// action. Never blocks the synchroniser.
#[derive(Debug, Clone)]
pub struct StallRecovery {
    policy: RecoveryPolicy,
    last_time: Option<f64>,
    last_progress_at: Duration,
    nudges: u32,
}

impl StallRecovery {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            policy,
            last_time: None,
            last_progress_at: Duration::ZERO,
            nudges: 0,
        }
    }

    pub fn observe(
        &mut self,
        clock: Duration,
        primary_time: f64,
        primary_playing: bool,
    ) -> Option<RecoveryAction> {
        let progressed = match self.last_time {
            Some(previous) => primary_time > previous + 1e-3 || primary_time < previous,
            None => true,
        };
        self.last_time = Some(primary_time);

        if !primary_playing || progressed {
            self.last_progress_at = clock;
            if progressed {
                self.nudges = 0;
            }
            return None;
        }

        if clock.saturating_sub(self.last_progress_at) < self.policy.stall_threshold {
            return None;
        }

        self.last_progress_at = clock;
        if self.nudges < self.policy.max_nudges_before_reload {
            self.nudges += 1;
            Some(RecoveryAction::Nudge {
                to: primary_time + self.policy.nudge_secs,
            })
        } else {
            self.nudges = 0;
            Some(RecoveryAction::Reload {
                resume_at: primary_time,
            })
        }
    }
}
