use serde::{Deserialize, Serialize};

/// Inputs for automatic exercise/break segmentation. All durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(rename = "totalDurationSeconds")]
    pub total_duration_secs: f64,

    #[serde(rename = "exerciseSeconds")]
    pub exercise_secs: f64,

    #[serde(rename = "breakSeconds")]
    pub break_secs: f64,

    /// Where the first exercise begins; clamped into the video.
    #[serde(rename = "firstStartSeconds")]
    pub first_start_secs: f64,

    /// Exercises are named "{template} {n}", n starting at 1.
    pub exercise_name_template: String,

    pub break_name: String,
}

impl GeneratorConfig {
    pub fn for_duration(total_duration_secs: f64) -> Self {
        Self {
            total_duration_secs,
            ..Self::default()
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            total_duration_secs: 0.0,
            exercise_secs: 40.0,
            break_secs: 20.0,
            first_start_secs: 0.0,
            exercise_name_template: "Exercise".into(),
            break_name: "Break".into(),
        }
    }
}
