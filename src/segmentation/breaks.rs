use anyhow::Result;

use crate::models::{Segment, SegmentList};

/// Build break segments from the gaps between consecutive exercises.
///
/// A break exists only where the next exercise starts strictly after the
/// previous one ends; it is labeled `break_name` and points at that exercise.
pub fn derive_breaks(exercises: &[Segment], break_name: &str) -> Vec<Segment> {
    exercises
        .windows(2)
        .filter(|pair| pair[1].start_time > pair[0].end_time)
        .map(|pair| {
            Segment::rest(
                break_name,
                pair[0].end_time,
                pair[1].start_time,
                Some(pair[1].label.clone()),
            )
        })
        .collect()
}

/// Interleave manually authored exercises with their derived breaks.
pub fn with_derived_breaks(mut exercises: Vec<Segment>, break_name: &str) -> Result<SegmentList> {
    exercises.retain(|s| s.is_exercise());
    exercises.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let breaks = derive_breaks(&exercises, break_name);
    let mut combined = Vec::with_capacity(exercises.len() + breaks.len());
    let mut breaks = breaks.into_iter().peekable();

    for exercise in exercises {
        while let Some(rest) = breaks.next_if(|b| b.end_time <= exercise.start_time) {
            combined.push(rest);
        }
        combined.push(exercise);
    }
    combined.extend(breaks);

    SegmentList::new(combined)
}
