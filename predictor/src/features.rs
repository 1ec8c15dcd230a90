use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One patient's measurements, as posted to `/predict`.
///
/// The body must be a JSON object and every field is required. Each accepts
/// a JSON number, a numeric string or a boolean, and must end up finite.
/// Unknown keys are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct FeatureRecord {
    pub age: f64,
    pub sex: f64,
    pub bmi: f64,
    pub bp: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
    pub s5: f64,
    pub s6: f64,
}

impl FeatureRecord {
    /// Returns the fields in the order the model was trained with (`forest::FEATURE_NAMES`).
    pub fn to_row(&self) -> [f64; 10] {
        [
            self.age, self.sex, self.bmi, self.bp, self.s1, self.s2, self.s3, self.s4, self.s5,
            self.s6,
        ]
    }
}

impl TryFrom<Map<String, Value>> for FeatureRecord {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let field = |name: &str| match fields.get(name) {
            Some(value) => coerce(value).map_err(|msg| format!("field `{name}`: {msg}")),
            None => Err(format!("missing field `{name}`")),
        };

        Ok(Self {
            age: field("age")?,
            sex: field("sex")?,
            bmi: field("bmi")?,
            bp: field("bp")?,
            s1: field("s1")?,
            s2: field("s2")?,
            s3: field("s3")?,
            s4: field("s4")?,
            s5: field("s5")?,
            s6: field("s6")?,
        })
    }
}

/// The response of `/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: f64,
}

impl Prediction {
    /// Wraps `value` rounded to 2 decimals.
    pub fn rounded(value: f64) -> Self {
        Self {
            prediction: round2(value),
        }
    }
}

/// Rounds to 2 decimals based on the exact binary value, so `2.675` becomes `2.67`.
///
/// Formatting is exact, so reparsing the formatted string gives the closest
/// `f64` to the correctly rounded decimal.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

fn coerce(value: &Value) -> Result<f64, String> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    match number {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(format!("{v} is not a finite number")),
        None => Err(format!("expected a number or a numeric string, got {value}")),
    }
}
