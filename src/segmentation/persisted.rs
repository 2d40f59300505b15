use serde::{Deserialize, Serialize};

use crate::models::SegmentList;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedExercise {
    pub name: String,
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBreak {
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub next_exercise_name: Option<String>,
}

/// Stored form of a video's segments, fetched back verbatim on later edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSegments {
    #[serde(default)]
    pub exercises: Vec<PersistedExercise>,
    #[serde(default)]
    pub breaks: Vec<PersistedBreak>,
}

impl PersistedSegments {
    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty() && self.breaks.is_empty()
    }

    pub fn first_exercise_start(&self) -> Option<f64> {
        self.exercises
            .iter()
            .map(|e| e.start_time)
            .filter(|start| start.is_finite() && *start >= 0.0)
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl From<&SegmentList> for PersistedSegments {
    fn from(list: &SegmentList) -> Self {
        Self {
            exercises: list
                .exercises()
                .map(|e| PersistedExercise {
                    name: e.label.clone(),
                    start_time: e.start_time,
                    end_time: e.end_time,
                })
                .collect(),
            breaks: list
                .breaks()
                .map(|b| PersistedBreak {
                    start_time: b.start_time,
                    end_time: b.end_time,
                    duration: b.duration(),
                    next_exercise_name: b.next_label.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::{generate, GeneratorConfig};

    #[test]
    fn converts_generated_list() {
        let list = generate(&GeneratorConfig::for_duration(185.0)).unwrap();
        let persisted = PersistedSegments::from(&list);

        assert_eq!(persisted.exercises.len(), 4);
        assert_eq!(persisted.breaks.len(), 3);
        assert_eq!(persisted.breaks[2].duration, 20.0);
        assert_eq!(
            persisted.breaks[2].next_exercise_name.as_deref(),
            Some("Exercise 4")
        );
        assert_eq!(persisted.first_exercise_start(), Some(0.0));
    }

    #[test]
    fn reads_stored_shape() {
        let raw = r#"{
            "exercises": [{"name": "Squats", "startTime": 5, "endTime": 35}],
            "breaks": [{"startTime": 35, "endTime": 50, "duration": 15, "nextExerciseName": "Lunges"}]
        }"#;
        let persisted: PersistedSegments = serde_json::from_str(raw).unwrap();
        assert_eq!(persisted.exercises[0].name, "Squats");
        assert_eq!(persisted.breaks[0].duration, 15.0);
        assert_eq!(persisted.first_exercise_start(), Some(5.0));
    }
}
