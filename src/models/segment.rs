use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Exercise,
    Break,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Exercise => "exercise",
            SegmentKind::Break => "break",
        }
    }
}

/// A labeled `[start, end)` interval on a video timeline, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(rename = "name")]
    pub label: String,
    #[serde(rename = "start")]
    pub start_time: f64,
    #[serde(rename = "end")]
    pub end_time: f64,
    pub kind: SegmentKind,
    /// Name of the exercise that follows a break. Always `None` for exercises.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_label: Option<String>,
}

impl Segment {
    pub fn exercise(label: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            label: label.into(),
            start_time,
            end_time,
            kind: SegmentKind::Exercise,
            next_label: None,
        }
    }

    pub fn rest(
        label: impl Into<String>,
        start_time: f64,
        end_time: f64,
        next_label: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            start_time,
            end_time,
            kind: SegmentKind::Break,
            next_label,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn is_exercise(&self) -> bool {
        self.kind == SegmentKind::Exercise
    }

    pub fn is_break(&self) -> bool {
        self.kind == SegmentKind::Break
    }
}

/// Ordered, time-disjoint segments for a single video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SegmentList {
    segments: Vec<Segment>,
}

impl SegmentList {
    /// Build a list, rejecting empty intervals, unsorted input and overlaps.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        for (index, segment) in segments.iter().enumerate() {
            if !segment.start_time.is_finite() || !segment.end_time.is_finite() {
                bail!("segment {index} ('{}') has non-finite bounds", segment.label);
            }
            if segment.start_time < 0.0 {
                bail!("segment {index} ('{}') starts before 0", segment.label);
            }
            if segment.end_time <= segment.start_time {
                bail!(
                    "segment {index} ('{}') is empty: [{}, {})",
                    segment.label,
                    segment.start_time,
                    segment.end_time
                );
            }
        }

        for (index, pair) in segments.windows(2).enumerate() {
            if pair[1].start_time < pair[0].end_time {
                bail!(
                    "segment {} starts at {} before segment {} ends at {}",
                    index + 1,
                    pair[1].start_time,
                    index,
                    pair[0].end_time
                );
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn exercises(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_exercise())
    }

    pub fn breaks(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_break())
    }

    /// Rename the segment at `index`. Renaming an exercise also updates the
    /// `next_label` of the break directly before it; timing is untouched.
    pub fn rename(&mut self, index: usize, label: impl Into<String>) -> Result<()> {
        let label = label.into();
        let kind = self
            .segments
            .get(index)
            .map(|s| s.kind)
            .ok_or_else(|| anyhow!("no segment at index {index} (len {})", self.segments.len()))?;

        if kind == SegmentKind::Exercise && index > 0 {
            let previous = &mut self.segments[index - 1];
            if previous.is_break() {
                previous.next_label = Some(label.clone());
            }
        }

        self.segments[index].label = label;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlapping_segments() {
        let result = SegmentList::new(vec![
            Segment::exercise("A", 0.0, 10.0),
            Segment::exercise("B", 9.0, 20.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(SegmentList::new(vec![Segment::exercise("A", 5.0, 5.0)]).is_err());
    }

    #[test]
    fn renaming_exercise_updates_preceding_break() {
        let mut list = SegmentList::new(vec![
            Segment::exercise("Exercise 1", 0.0, 40.0),
            Segment::rest("Break", 40.0, 60.0, Some("Exercise 2".into())),
            Segment::exercise("Exercise 2", 60.0, 100.0),
        ])
        .unwrap();

        list.rename(2, "Squats").unwrap();

        assert_eq!(list.segments()[2].label, "Squats");
        assert_eq!(list.segments()[1].next_label.as_deref(), Some("Squats"));
        assert_eq!(list.segments()[2].start_time, 60.0);
        assert_eq!(list.segments()[2].end_time, 100.0);
    }

    #[test]
    fn rename_out_of_range_fails() {
        let mut list = SegmentList::new(vec![Segment::exercise("A", 0.0, 1.0)]).unwrap();
        assert!(list.rename(3, "B").is_err());
    }

    #[test]
    fn serializes_with_wire_names() {
        let segment = Segment::rest("Break", 40.0, 60.0, Some("Exercise 2".into()));
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["name"], "Break");
        assert_eq!(json["start"], 40.0);
        assert_eq!(json["end"], 60.0);
        assert_eq!(json["kind"], "break");
        assert_eq!(json["nextLabel"], "Exercise 2");
    }
}
