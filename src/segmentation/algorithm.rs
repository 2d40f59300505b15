use anyhow::{bail, Result};

use crate::models::{Segment, SegmentList};
use crate::segmentation::config::GeneratorConfig;

/// Upper bound on generated segments for one video.
pub const MAX_SEGMENTS: usize = 10_000;

/// Deterministically split `[first_start, total_duration)` into alternating
/// exercise and break segments.
///
/// The result depends only on `config`; any change to it means regenerating
/// the whole list rather than patching a previous one.
pub fn generate(config: &GeneratorConfig) -> Result<SegmentList> {
    validate(config)?;

    let total = config.total_duration_secs;
    let mut cursor = config.first_start_secs.min(total - 1.0).max(0.0);
    let mut segments = Vec::new();
    let mut exercise_number = 0u32;

    while cursor < total {
        exercise_number += 1;
        let end = (cursor + config.exercise_secs).min(total);
        if end <= cursor {
            bail!(
                "exerciseSeconds {} is too small to advance past {cursor}s",
                config.exercise_secs
            );
        }
        segments.push(Segment::exercise(
            format!("{} {}", config.exercise_name_template, exercise_number),
            cursor,
            end,
        ));
        cursor = end;

        if cursor < total {
            let end = (cursor + config.break_secs).min(total);
            if end <= cursor {
                bail!(
                    "breakSeconds {} is too small to advance past {cursor}s",
                    config.break_secs
                );
            }
            segments.push(Segment::rest(config.break_name.clone(), cursor, end, None));
            cursor = end;
        }
    }

    link_next_labels(&mut segments);
    SegmentList::new(segments)
}

fn validate(config: &GeneratorConfig) -> Result<()> {
    let positive = [
        ("totalDurationSeconds", config.total_duration_secs),
        ("exerciseSeconds", config.exercise_secs),
        ("breakSeconds", config.break_secs),
    ];
    for (field, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            bail!("{field} must be a positive number, got {value}");
        }
    }
    if !config.first_start_secs.is_finite() || config.first_start_secs < 0.0 {
        bail!(
            "firstStartSeconds must be zero or positive, got {}",
            config.first_start_secs
        );
    }

    let cycles = config.total_duration_secs / (config.exercise_secs + config.break_secs);
    if cycles * 2.0 > MAX_SEGMENTS as f64 {
        bail!(
            "{}s of exercise and {}s of break would split {}s into more than {MAX_SEGMENTS} segments",
            config.exercise_secs,
            config.break_secs,
            config.total_duration_secs
        );
    }
    Ok(())
}

/// Point every break at the exercise that follows it.
pub(crate) fn link_next_labels(segments: &mut [Segment]) {
    let mut upcoming: Option<String> = None;
    for segment in segments.iter_mut().rev() {
        if segment.is_exercise() {
            upcoming = Some(segment.label.clone());
        } else {
            segment.next_label = upcoming.clone();
        }
    }
}
