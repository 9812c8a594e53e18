//! Helpers for turning raw API values into clean text and numbers.

use serde_json::Value;

use crate::error::InvalidDataError;

/// Trim the ends and collapse every inner whitespace run to a single space.
pub fn sanitize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Coerce a raw value into a finite `f64`.
///
/// Accepts JSON numbers and numeric text (surrounding whitespace allowed).
/// `name` only appears in the error message.
pub fn to_float(name: &str, value: &Value) -> Result<f64, InvalidDataError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| InvalidDataError::new(format!("{name} must be a number.")))
}
