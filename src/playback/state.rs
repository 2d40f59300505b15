use serde::Serialize;

use crate::models::SegmentList;
use crate::segmentation::{PersistedSegments, PersistedExercise};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PreviewPhase {
    Idle,
    Approaching,
    FinalCountdown,
    ExitAnimating,
}

impl Default for PreviewPhase {
    fn default() -> Self {
        PreviewPhase::Idle
    }
}

/// A break the synchroniser can preview, with the resolved start of the
/// exercise that follows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledBreak {
    pub start: f64,
    pub end: f64,
    pub next_label: Option<String>,
    pub preview_start: f64,
}

impl ScheduledBreak {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }
}

/// Derived per tick for the active break; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewWindow {
    pub break_start: f64,
    pub break_end: f64,
    pub popup_show_until: f64,
    pub last5_start: f64,
    pub preview_start: f64,
    pub preview_end: f64,
}

impl PreviewWindow {
    pub fn for_break(scheduled: &ScheduledBreak, final_countdown_secs: f64) -> Self {
        let duration = scheduled.duration();
        Self {
            break_start: scheduled.start,
            break_end: scheduled.end,
            popup_show_until: scheduled.end - 0.25 * duration,
            last5_start: scheduled.start.max(scheduled.end - final_countdown_secs),
            preview_start: scheduled.preview_start,
            preview_end: scheduled.preview_start + duration,
        }
    }
}

/// Breaks of one video in time order. An empty schedule disables previews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakSchedule {
    breaks: Vec<ScheduledBreak>,
}

impl BreakSchedule {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build from stored segment data. Absent data disables previews; malformed
    /// breaks are dropped individually.
    pub fn from_persisted(persisted: Option<&PersistedSegments>) -> Self {
        let Some(persisted) = persisted else {
            return Self::disabled();
        };

        let mut breaks = Vec::with_capacity(persisted.breaks.len());
        for stored in &persisted.breaks {
            let well_formed = stored.start_time.is_finite()
                && stored.end_time.is_finite()
                && stored.duration.is_finite()
                && stored.duration > 0.0
                && stored.start_time >= 0.0
                && stored.end_time > stored.start_time;
            if !well_formed {
                log_warn!(
                    "ignoring malformed break [{}, {}) duration {}",
                    stored.start_time,
                    stored.end_time,
                    stored.duration
                );
                continue;
            }

            let preview_start = resolve_preview_start(
                &persisted.exercises,
                stored.next_exercise_name.as_deref(),
                stored.end_time,
            );
            breaks.push(ScheduledBreak {
                start: stored.start_time,
                end: stored.end_time,
                next_label: stored.next_exercise_name.clone(),
                preview_start,
            });
        }

        Self::from_breaks(breaks)
    }

    pub fn from_segments(list: &SegmentList) -> Self {
        Self::from_persisted(Some(&PersistedSegments::from(list)))
    }

    fn from_breaks(mut breaks: Vec<ScheduledBreak>) -> Self {
        breaks.sort_by(|a, b| a.start.total_cmp(&b.start));
        // Keep the list disjoint; a later overlapping break loses.
        let mut disjoint: Vec<ScheduledBreak> = Vec::with_capacity(breaks.len());
        for scheduled in breaks {
            match disjoint.last() {
                Some(previous) if scheduled.start < previous.end => {
                    log_warn!(
                        "ignoring break [{}, {}) overlapping [{}, {})",
                        scheduled.start,
                        scheduled.end,
                        previous.start,
                        previous.end
                    );
                }
                _ => disjoint.push(scheduled),
            }
        }
        Self { breaks: disjoint }
    }

    pub fn is_disabled(&self) -> bool {
        self.breaks.is_empty()
    }

    pub fn breaks(&self) -> &[ScheduledBreak] {
        &self.breaks
    }

    pub fn break_at(&self, time: f64) -> Option<&ScheduledBreak> {
        self.breaks.iter().find(|b| b.contains(time))
    }
}

/// Start of the exercise a break leads into: matched by name (preferring the
/// first match at or after the break), else the first exercise after the
/// break, else the break end itself.
fn resolve_preview_start(
    exercises: &[PersistedExercise],
    next_name: Option<&str>,
    break_end: f64,
) -> f64 {
    let valid = |e: &&PersistedExercise| e.start_time.is_finite() && e.start_time >= 0.0;

    if let Some(name) = next_name {
        let named: Vec<&PersistedExercise> =
            exercises.iter().filter(valid).filter(|e| e.name == name).collect();
        if let Some(after) = named.iter().find(|e| e.start_time >= break_end) {
            return after.start_time;
        }
        if let Some(first) = named.first() {
            return first.start_time;
        }
    }

    exercises
        .iter()
        .filter(valid)
        .map(|e| e.start_time)
        .filter(|start| *start >= break_end)
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(break_end)
}

/// What the UI renders for the current tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFrame {
    pub phase: PreviewPhase,
    pub popup_visible: bool,
    /// Whole seconds left in the break during the final countdown.
    pub countdown: Option<u8>,
    pub window: Option<PreviewWindow>,
    pub next_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::{generate, GeneratorConfig, PersistedBreak};

    #[test]
    fn window_for_twenty_second_break() {
        let scheduled = ScheduledBreak {
            start: 160.0,
            end: 180.0,
            next_label: Some("Exercise 4".into()),
            preview_start: 180.0,
        };
        let window = PreviewWindow::for_break(&scheduled, 5.0);

        assert_eq!(window.popup_show_until, 175.0);
        assert_eq!(window.last5_start, 175.0);
        assert_eq!(window.preview_start, 180.0);
        assert_eq!(window.preview_end, 200.0);
    }

    #[test]
    fn short_break_countdown_starts_at_break_start() {
        let scheduled = ScheduledBreak {
            start: 10.0,
            end: 13.0,
            next_label: None,
            preview_start: 13.0,
        };
        assert_eq!(PreviewWindow::for_break(&scheduled, 5.0).last5_start, 10.0);
    }

    #[test]
    fn schedule_resolves_next_exercise_start() {
        let list = generate(&GeneratorConfig::for_duration(185.0)).unwrap();
        let schedule = BreakSchedule::from_segments(&list);

        let starts: Vec<f64> = schedule.breaks().iter().map(|b| b.preview_start).collect();
        assert_eq!(starts, vec![60.0, 120.0, 180.0]);
        assert_eq!(schedule.break_at(171.0).unwrap().start, 160.0);
        assert!(schedule.break_at(180.0).is_none());
    }

    #[test]
    fn absent_or_malformed_data_disables_preview() {
        assert!(BreakSchedule::from_persisted(None).is_disabled());
        assert!(BreakSchedule::from_persisted(Some(&PersistedSegments::default())).is_disabled());

        let malformed = PersistedSegments {
            exercises: vec![],
            breaks: vec![PersistedBreak {
                start_time: 40.0,
                end_time: 40.0,
                duration: 0.0,
                next_exercise_name: Some("Exercise 2".into()),
            }],
        };
        assert!(BreakSchedule::from_persisted(Some(&malformed)).is_disabled());
    }

    #[test]
    fn unknown_next_name_falls_back_to_following_exercise() {
        let persisted = PersistedSegments {
            exercises: vec![
                PersistedExercise {
                    name: "A".into(),
                    start_time: 0.0,
                    end_time: 30.0,
                },
                PersistedExercise {
                    name: "B".into(),
                    start_time: 42.0,
                    end_time: 70.0,
                },
            ],
            breaks: vec![PersistedBreak {
                start_time: 30.0,
                end_time: 40.0,
                duration: 10.0,
                next_exercise_name: Some("Renamed".into()),
            }],
        };
        let schedule = BreakSchedule::from_persisted(Some(&persisted));
        assert_eq!(schedule.breaks()[0].preview_start, 42.0);
    }
}
