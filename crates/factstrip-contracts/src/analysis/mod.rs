mod explanation;
mod verdict;

use serde_json::{Map, Value};

pub use explanation::Explanation;
pub use verdict::{FactAnalysis, Mood, MoodReading, Verdict};

/// Shape violations in structured text-service output.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl SchemaError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, SchemaError> {
    match object.get(field) {
        Some(Value::Null) | None => Err(SchemaError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn required_text(object: &Map<String, Value>, field: &'static str) -> Result<String, SchemaError> {
    let text = required(object, field)?
        .as_str()
        .ok_or_else(|| SchemaError::invalid(field, "expected a string"))?
        .trim();
    if text.is_empty() {
        return Err(SchemaError::invalid(field, "must not be empty"));
    }
    Ok(text.to_string())
}

/// Accepts integers, floats and numeric strings, clamped to 0..=100.
fn percentage(value: &Value, field: &'static str) -> Result<u8, SchemaError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(parsed) = parsed.filter(|value| value.is_finite()) else {
        return Err(SchemaError::invalid(field, format!("expected a number, got {value}")));
    };
    Ok(parsed.round().clamp(0.0, 100.0) as u8)
}
