use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Timer,
    Text,
    Image,
}

impl OverlayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Timer => "timer",
            OverlayKind::Text => "text",
            OverlayKind::Image => "image",
        }
    }
}

/// A time-windowed visual element. `x` and `y` are percentages of the frame.
///
/// Numbers keep the form they were written in and kind-specific fields are
/// carried verbatim, so an overlay serializes back to the bytes it was read
/// from and reaches the renderer unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub id: String,
    pub start_time: Number,
    pub end_time: Number,
    pub x: Number,
    pub y: Number,
    pub kind: OverlayKind,
    /// `text`, `fontSize`, `src` and anything else the kind carries, in order.
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

/// Whole seconds are stored as integers so authored values serialize as `12`,
/// not `12.0`.
fn to_number(value: f64, field: &str) -> Result<Number> {
    if !value.is_finite() {
        bail!("overlay {field} must be finite, got {value}");
    }
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        return Ok(Number::from(value as i64));
    }
    Number::from_f64(value).ok_or_else(|| anyhow!("overlay {field} is not representable: {value}"))
}

impl Overlay {
    pub fn new(
        start_time: f64,
        end_time: f64,
        x: f64,
        y: f64,
        kind: OverlayKind,
        props: Map<String, Value>,
    ) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            start_time: to_number(start_time, "startTime")?,
            end_time: to_number(end_time, "endTime")?,
            x: clamp_percent(to_number(x, "x")?),
            y: clamp_percent(to_number(y, "y")?),
            kind,
            props,
        })
    }

    pub fn timer(start_time: f64, end_time: f64, x: f64, y: f64) -> Result<Self> {
        let mut props = Map::new();
        props.insert("fontSize".into(), Value::from(48));
        props.insert("color".into(), Value::from("#ffffff"));
        Self::new(start_time, end_time, x, y, OverlayKind::Timer, props)
    }

    pub fn text(
        start_time: f64,
        end_time: f64,
        x: f64,
        y: f64,
        text: impl Into<String>,
    ) -> Result<Self> {
        let mut props = Map::new();
        props.insert("text".into(), Value::from(text.into()));
        props.insert("fontSize".into(), Value::from(32));
        props.insert("color".into(), Value::from("#ffffff"));
        Self::new(start_time, end_time, x, y, OverlayKind::Text, props)
    }

    pub fn start_secs(&self) -> f64 {
        self.start_time.as_f64().unwrap_or(f64::NAN)
    }

    pub fn end_secs(&self) -> f64 {
        self.end_time.as_f64().unwrap_or(f64::NAN)
    }

    pub fn x_percent(&self) -> f64 {
        self.x.as_f64().unwrap_or(0.0)
    }

    pub fn y_percent(&self) -> f64 {
        self.y.as_f64().unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.end_secs() - self.start_secs()
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }
}

fn clamp_percent(position: Number) -> Number {
    match position.as_f64() {
        Some(value) if value < 0.0 => Number::from(0),
        Some(value) if value > 100.0 => Number::from(100),
        _ => position,
    }
}
