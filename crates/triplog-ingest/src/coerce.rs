// SPDX-FileCopyrightText: 2026 Triplog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Numeric-first coercion of raw text values.

use chrono::NaiveDateTime;

use crate::datetime::parse_device_time;

/// Token loggers write when a sensor has no reading.
pub const NO_READING: &str = "-";

/// A raw value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Coerce a raw value: number, then date/time, then text.
///
/// Integers are numbers too (`"42"` parses as a float). The [`NO_READING`]
/// token becomes `0.0`. Non-finite numbers (`NaN`, `inf`) are kept as text.
pub fn coerce(raw: &str) -> Value {
    let text = raw.trim();
    if text == NO_READING {
        return Value::Number(0.0);
    }
    if let Some(n) = text.parse::<f64>().ok().filter(|n| n.is_finite()) {
        return Value::Number(n);
    }
    if let Ok(dt) = parse_device_time(text) {
        return Value::DateTime(dt);
    }
    Value::Text(text.to_string())
}

/// Read an explicit fix flag (`true`/`false`/`yes`/`no` or a number).
pub fn coerce_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        other => coerce(other).as_f64().map(|n| n != 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_come_first() {
        assert_eq!(coerce("12.5"), Value::Number(12.5));
        assert_eq!(coerce(" 42 "), Value::Number(42.0));
        assert_eq!(coerce("-3.25"), Value::Number(-3.25));
    }

    #[test]
    fn dash_means_zero() {
        assert_eq!(coerce("-"), Value::Number(0.0));
        assert_eq!(coerce(" - "), Value::Number(0.0));
    }

    #[test]
    fn dates_then_text() {
        assert!(matches!(coerce("11-mai-2016 20:23:42.000"), Value::DateTime(_)));
        assert_eq!(coerce("NaN"), Value::Text("NaN".into()));
        assert_eq!(coerce("n/a"), Value::Text("n/a".into()));
        assert_eq!(coerce("n/a").as_f64(), None);
    }

    #[test]
    fn flags() {
        assert_eq!(coerce_flag("TRUE"), Some(true));
        assert_eq!(coerce_flag("0"), Some(false));
        assert_eq!(coerce_flag("1"), Some(true));
        assert_eq!(coerce_flag("maybe"), None);
    }
}
