//! Raw-to-typed value coercion
//!
//! Coercion is strict: integers must arrive as integral numbers, text as
//! strings. No numeric widening and no implicit stringification; silent
//! conversions hide bugs. Container pairs are coerced independently, and a
//! failing pair carries its key so the pipeline can report a dotted path.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::field::FieldType;
use crate::value::{json_type_name, FieldValue, RawValue};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a raw value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CoerceError {
    /// Offending container key, when the failure is inside a keyed
    /// container.
    pub key: Option<String>,
    pub message: String,
}

impl CoerceError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            key: None,
            message: message.into(),
        }
    }
}

fn mismatch(expected: &str, raw: &RawValue) -> CoerceError {
    CoerceError::new(format!("expected {}, got {}", expected, raw.type_name()))
}

/// Coerce a raw value to the target type.
pub(crate) fn coerce(raw: &RawValue, target: &FieldType) -> Result<FieldValue, CoerceError> {
    match target {
        FieldType::Integer => coerce_integer(raw),
        FieldType::Boolean => coerce_boolean(raw),
        FieldType::Text => coerce_text(raw),
        FieldType::Date => coerce_date(raw),
        FieldType::KeyedContainer => coerce_entries(raw),
        FieldType::Opaque => match raw {
            RawValue::Opaque(value) => Ok(FieldValue::Opaque(value.clone())),
            other => Err(mismatch("an externally-defined value", other)),
        },
        FieldType::Optional(inner) => match raw {
            RawValue::Json(Value::Null) => Ok(FieldValue::Absent),
            other => coerce(other, inner),
        },
        FieldType::Union(members) => {
            for member in members {
                if let Ok(value) = coerce(raw, member) {
                    return Ok(value);
                }
            }
            Err(CoerceError::new(format!(
                "expected {}, got {}",
                target.name(),
                raw.type_name()
            )))
        }
    }
}

/// Strict integral read of a JSON value.
fn as_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) if n.is_f64() => {
            Err("expected an integer, got a floating-point number".to_string())
        }
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| "integer out of range".to_string()),
        other => Err(format!("expected an integer, got {}", json_type_name(other))),
    }
}

fn coerce_integer(raw: &RawValue) -> Result<FieldValue, CoerceError> {
    match raw {
        RawValue::Json(value) => as_integer(value)
            .map(FieldValue::Integer)
            .map_err(CoerceError::new),
        other => Err(mismatch("an integer", other)),
    }
}

fn coerce_boolean(raw: &RawValue) -> Result<FieldValue, CoerceError> {
    match raw {
        RawValue::Json(Value::Bool(value)) => Ok(FieldValue::Boolean(*value)),
        other => Err(mismatch("a boolean", other)),
    }
}

fn coerce_text(raw: &RawValue) -> Result<FieldValue, CoerceError> {
    match raw {
        RawValue::Json(Value::String(value)) => Ok(FieldValue::Text(value.clone())),
        other => Err(mismatch("a string", other)),
    }
}

fn coerce_date(raw: &RawValue) -> Result<FieldValue, CoerceError> {
    match raw {
        RawValue::Json(Value::String(text)) => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(FieldValue::Date)
            .map_err(|_| {
                CoerceError::new(format!("expected a {} date, got {:?}", DATE_FORMAT, text))
            }),
        other => Err(mismatch("a date string", other)),
    }
}

/// Coerce every key/value pair independently. All pairs are examined even
/// after a failure; the first failing pair (in key order) is reported.
fn coerce_entries(raw: &RawValue) -> Result<FieldValue, CoerceError> {
    let RawValue::Json(Value::Object(entries)) = raw else {
        return Err(mismatch("an object", raw));
    };

    let mut coerced = BTreeMap::new();
    let mut first_error: Option<CoerceError> = None;
    for (key, value) in entries {
        match as_integer(value) {
            Ok(number) => {
                coerced.insert(key.clone(), number);
            }
            Err(message) if first_error.is_none() => {
                first_error = Some(CoerceError {
                    key: Some(key.clone()),
                    message,
                });
            }
            Err(_) => {}
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(FieldValue::Entries(coerced)),
    }
}
