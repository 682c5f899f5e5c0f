//! Raw and coerced value representations
//!
//! Callers hand the engine raw values as in-memory JSON
//! (`serde_json::Value`) or as opaque externally-defined values exposing
//! only the [`Ranked`] capability. Coercion produces [`FieldValue`]s, which
//! are assembled into a typed [`Instance`] on success.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

/// Capability boundary for opaque externally-defined values.
///
/// The engine knows nothing about the collaborator's representation beyond
/// its dimensionality. Range and membership constraints on an opaque field
/// apply to this rank.
pub trait Ranked: fmt::Debug + Send + Sync {
    /// Number of dimensions of the value.
    fn rank(&self) -> usize;
}

/// A raw, untyped field value supplied by the caller.
#[derive(Debug, Clone)]
pub enum RawValue {
    /// An in-memory JSON value (null, bool, number, string, object).
    Json(Value),
    /// An opaque externally-defined value with a queryable rank.
    Opaque(Arc<dyn Ranked>),
}

impl RawValue {
    /// The explicit absence marker.
    pub fn null() -> Self {
        RawValue::Json(Value::Null)
    }

    /// Short type name used in mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Json(value) => json_type_name(value),
            RawValue::Opaque(_) => "opaque value",
        }
    }
}

/// Short type name of a JSON value for mismatch messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::Json(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Json(Value::from(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Json(Value::from(value))
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Json(Value::from(value))
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Json(Value::from(value))
    }
}

impl From<Arc<dyn Ranked>> for RawValue {
    fn from(value: Arc<dyn Ranked>) -> Self {
        RawValue::Opaque(value)
    }
}

/// A raw record: field name mapped to raw value.
///
/// Field iteration order never matters here; validation follows the
/// schema's declared order, and unknown keys are ignored.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    values: HashMap<String, RawValue>,
}

impl RawRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field value, chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a field value.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    /// Whether the record carries the field at all. An explicit null is
    /// present; a missing key is not.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of supplied fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a record from a JSON object. Returns `None` for any other
    /// JSON shape.
    pub fn from_json(value: &Value) -> Option<Self> {
        let Value::Object(entries) = value else {
            return None;
        };
        let values = entries
            .iter()
            .map(|(name, value)| (name.clone(), RawValue::Json(value.clone())))
            .collect();
        Some(Self { values })
    }
}

/// A successfully coerced field value.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Strict integral number.
    Integer(i64),
    Boolean(bool),
    /// Unicode text.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Keyed-container entries, deterministically ordered by key.
    Entries(BTreeMap<String, i64>),
    /// Opaque externally-defined value.
    Opaque(Arc<dyn Ranked>),
    /// Explicit absence of an optional field.
    Absent,
}

impl FieldValue {
    /// Short type name used in mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "integer",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Text(_) => "string",
            FieldValue::Date(_) => "date",
            FieldValue::Entries(_) => "keyed container",
            FieldValue::Opaque(_) => "opaque value",
            FieldValue::Absent => "absent",
        }
    }

    /// Whether this value denotes absence.
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => a == b,
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            (FieldValue::Entries(a), FieldValue::Entries(b)) => a == b,
            // Opaque values have no structural identity; compare by pointer.
            (FieldValue::Opaque(a), FieldValue::Opaque(b)) => Arc::ptr_eq(a, b),
            (FieldValue::Absent, FieldValue::Absent) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Boolean(value) => write!(f, "{}", value),
            FieldValue::Text(value) => write!(f, "{:?}", value),
            FieldValue::Date(value) => write!(f, "{}", value),
            FieldValue::Entries(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            FieldValue::Opaque(value) => write!(f, "opaque(rank {})", value.rank()),
            FieldValue::Absent => write!(f, "absent"),
        }
    }
}

/// A fully validated, typed record.
///
/// Exists only transiently during one validation call; the caller either
/// receives it whole or receives a report instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    values: BTreeMap<String, FieldValue>,
}

impl Instance {
    pub(crate) fn new(values: BTreeMap<String, FieldValue>) -> Self {
        Self { values }
    }

    /// Look up a field's final value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Integer value of a field, if it holds one.
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// Boolean value of a field, if it holds one.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(FieldValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }

    /// Text value of a field, if it holds one.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Date value of a field, if it holds one.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.values.get(name) {
            Some(FieldValue::Date(value)) => Some(*value),
            _ => None,
        }
    }

    /// Container entries of a field, if it holds them.
    pub fn entries(&self, name: &str) -> Option<&BTreeMap<String, i64>> {
        match self.values.get(name) {
            Some(FieldValue::Entries(value)) => Some(value),
            _ => None,
        }
    }

    /// Opaque value of a field, if it holds one.
    pub fn opaque(&self, name: &str) -> Option<&Arc<dyn Ranked>> {
        match self.values.get(name) {
            Some(FieldValue::Opaque(value)) => Some(value),
            _ => None,
        }
    }

    /// Whether a field's final value denotes absence.
    pub fn is_absent(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FieldValue::Absent))
    }

    /// Number of fields in the instance.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the instance has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over fields and their final values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.values.iter()
    }
}
