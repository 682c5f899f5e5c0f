//! Post-coercion constraint evaluation
//!
//! Pure checks of one coerced value against one declared constraint.
//! Constraints are declared as plain data on a field descriptor and
//! compiled when the schema is built, so malformed declarations (a bad
//! regex, a range admitting no values) surface at build time and never at
//! validation time.
//!
//! Constraints attached to a field run in declared order; evaluation stops
//! at the first violation, so a field contributes at most one error per
//! validation pass.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Result, SchemaError};
use crate::field::FieldType;
use crate::value::FieldValue;

/// One end of a numeric range, with its own inclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub value: i64,
    pub inclusive: bool,
}

impl Bound {
    /// A bound the value may equal.
    pub fn inclusive(value: i64) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    /// A bound the value must stay strictly beyond.
    pub fn exclusive(value: i64) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// Numeric range check with independently configurable inclusivity per
/// bound. Either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeCheck {
    min: Option<Bound>,
    max: Option<Bound>,
}

impl RangeCheck {
    /// An unbounded range; narrow it with [`RangeCheck::min`] and
    /// [`RangeCheck::max`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive on both ends.
    pub fn closed(min: i64, max: i64) -> Self {
        Self {
            min: Some(Bound::inclusive(min)),
            max: Some(Bound::inclusive(max)),
        }
    }

    /// Set the lower bound.
    pub fn min(mut self, bound: Bound) -> Self {
        self.min = Some(bound);
        self
    }

    /// Set the upper bound.
    pub fn max(mut self, bound: Bound) -> Self {
        self.max = Some(bound);
        self
    }

    /// Whether any integer satisfies the bounds.
    pub(crate) fn admits_any(&self) -> bool {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return true;
        };
        let lo = if min.inclusive {
            min.value
        } else {
            min.value.saturating_add(1)
        };
        let hi = if max.inclusive {
            max.value
        } else {
            max.value.saturating_sub(1)
        };
        lo <= hi
    }

    /// Check a value against the bounds.
    pub fn check(&self, value: i64) -> std::result::Result<(), String> {
        if let Some(min) = self.min {
            let ok = if min.inclusive {
                value >= min.value
            } else {
                value > min.value
            };
            if !ok {
                let phrase = if min.inclusive { "at least" } else { "greater than" };
                return Err(format!("must be {} {}, got {}", phrase, min.value, value));
            }
        }
        if let Some(max) = self.max {
            let ok = if max.inclusive {
                value <= max.value
            } else {
                value < max.value
            };
            if !ok {
                let phrase = if max.inclusive { "at most" } else { "less than" };
                return Err(format!("must be {} {}, got {}", phrase, max.value, value));
            }
        }
        Ok(())
    }
}

/// Length bounds counted in Unicode code points, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LengthCheck {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthCheck {
    /// Inclusive on both ends.
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Lower bound only.
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Upper bound only.
    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub(crate) fn admits_any(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }

    /// Check a string's code-point count against the bounds.
    pub fn check(&self, value: &str) -> std::result::Result<(), String> {
        let count = value.chars().count();
        if let Some(min) = self.min {
            if count < min {
                return Err(format!(
                    "must be at least {} characters long, got {}",
                    min, count
                ));
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return Err(format!(
                    "must be at most {} characters long, got {}",
                    max, count
                ));
            }
        }
        Ok(())
    }
}

/// Per-entry checks for a keyed container: pattern and length applied to
/// every key, range applied to every value.
#[derive(Debug, Clone, Default)]
pub struct EntryCheck {
    pub(crate) key_pattern: Option<String>,
    pub(crate) key_length: Option<LengthCheck>,
    pub(crate) value_range: Option<RangeCheck>,
}

impl EntryCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchored pattern every key must match.
    pub fn key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = Some(pattern.into());
        self
    }

    /// Length bounds every key must satisfy.
    pub fn key_length(mut self, length: LengthCheck) -> Self {
        self.key_length = Some(length);
        self
    }

    /// Range every value must satisfy.
    pub fn value_range(mut self, range: RangeCheck) -> Self {
        self.value_range = Some(range);
        self
    }
}

/// A declared post-coercion constraint.
///
/// Declarations are plain data; the schema builder compiles them and
/// rejects malformed ones.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Numeric bounds. On opaque fields the bounds apply to the rank.
    Range(RangeCheck),
    /// Regex over the whole string, anchored at both ends; a partial match
    /// never satisfies the check.
    Pattern(String),
    /// Length bounds counted in Unicode code points.
    Length(LengthCheck),
    /// Integer set membership. On opaque fields membership applies to the
    /// rank.
    OneOf(Vec<i64>),
    /// Per-entry checks for a keyed container.
    Entries(EntryCheck),
}

impl Constraint {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Constraint::Range(_) => "range",
            Constraint::Pattern(_) => "pattern",
            Constraint::Length(_) => "length",
            Constraint::OneOf(_) => "one-of",
            Constraint::Entries(_) => "entries",
        }
    }

    /// Whether the constraint can ever apply to a field of the given type.
    pub(crate) fn applies_to(&self, field_type: &FieldType) -> bool {
        match field_type {
            FieldType::Optional(inner) => self.applies_to(inner),
            FieldType::Union(members) => members.iter().any(|member| self.applies_to(member)),
            _ => match self {
                Constraint::Range(_) | Constraint::OneOf(_) => {
                    matches!(field_type, FieldType::Integer | FieldType::Opaque)
                }
                Constraint::Pattern(_) | Constraint::Length(_) => {
                    matches!(field_type, FieldType::Text)
                }
                Constraint::Entries(_) => matches!(field_type, FieldType::KeyedContainer),
            },
        }
    }

    /// Compile the declaration, surfacing every malformation as a
    /// definition-time error.
    pub(crate) fn compile(&self, field: &str) -> Result<CompiledConstraint> {
        match self {
            Constraint::Range(range) => {
                if !range.admits_any() {
                    return Err(SchemaError::EmptyRange {
                        field: field.to_string(),
                    });
                }
                Ok(CompiledConstraint::Range(*range))
            }
            Constraint::Pattern(pattern) => Ok(CompiledConstraint::Pattern(
                PatternCheck::compile(field, pattern)?,
            )),
            Constraint::Length(length) => {
                if !length.admits_any() {
                    return Err(SchemaError::EmptyLength {
                        field: field.to_string(),
                    });
                }
                Ok(CompiledConstraint::Length(*length))
            }
            Constraint::OneOf(members) => {
                if members.is_empty() {
                    return Err(SchemaError::EmptySet {
                        field: field.to_string(),
                    });
                }
                Ok(CompiledConstraint::OneOf(members.clone()))
            }
            Constraint::Entries(entries) => {
                let key_pattern = match &entries.key_pattern {
                    Some(pattern) => Some(PatternCheck::compile(field, pattern)?),
                    None => None,
                };
                if let Some(length) = &entries.key_length {
                    if !length.admits_any() {
                        return Err(SchemaError::EmptyLength {
                            field: field.to_string(),
                        });
                    }
                }
                if let Some(range) = &entries.value_range {
                    if !range.admits_any() {
                        return Err(SchemaError::EmptyRange {
                            field: field.to_string(),
                        });
                    }
                }
                Ok(CompiledConstraint::Entries(CompiledEntries {
                    key_pattern,
                    key_length: entries.key_length,
                    value_range: entries.value_range,
                }))
            }
        }
    }
}

/// Failure of one constraint check. Container failures carry the offending
/// key so the pipeline can report a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConstraintFailure {
    pub key: Option<String>,
    pub message: String,
}

impl ConstraintFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            key: None,
            message: message.into(),
        }
    }
}

/// Full-match regex check, compiled at schema-build time.
#[derive(Debug, Clone)]
pub(crate) struct PatternCheck {
    pattern: String,
    regex: Regex,
}

impl PatternCheck {
    /// Compile a pattern, anchoring it at both ends.
    fn compile(field: &str, pattern: &str) -> Result<Self> {
        let regex =
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| SchemaError::InvalidPattern {
                field: field.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    fn check(&self, value: &str) -> std::result::Result<(), String> {
        if self.regex.is_match(value) {
            Ok(())
        } else {
            Err(format!("{:?} does not match pattern {}", value, self.pattern))
        }
    }
}

/// Compiled form of [`EntryCheck`].
#[derive(Debug, Clone)]
pub(crate) struct CompiledEntries {
    key_pattern: Option<PatternCheck>,
    key_length: Option<LengthCheck>,
    value_range: Option<RangeCheck>,
}

impl CompiledEntries {
    /// Every entry is examined, in key order; the first offending entry
    /// becomes the failure.
    fn check(&self, entries: &BTreeMap<String, i64>) -> std::result::Result<(), ConstraintFailure> {
        let mut first: Option<ConstraintFailure> = None;
        for (key, value) in entries {
            if let Err(message) = self.check_entry(key, *value) {
                if first.is_none() {
                    first = Some(ConstraintFailure {
                        key: Some(key.clone()),
                        message,
                    });
                }
            }
        }
        match first {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn check_entry(&self, key: &str, value: i64) -> std::result::Result<(), String> {
        if let Some(pattern) = &self.key_pattern {
            pattern.check(key).map_err(|m| format!("key {}", m))?;
        }
        if let Some(length) = &self.key_length {
            length.check(key).map_err(|m| format!("key {}", m))?;
        }
        if let Some(range) = &self.value_range {
            range.check(value).map_err(|m| format!("value {}", m))?;
        }
        Ok(())
    }
}

/// A compiled constraint, ready for evaluation.
#[derive(Debug, Clone)]
pub(crate) enum CompiledConstraint {
    Range(RangeCheck),
    Pattern(PatternCheck),
    Length(LengthCheck),
    OneOf(Vec<i64>),
    Entries(CompiledEntries),
}

impl CompiledConstraint {
    /// Check one coerced value. A constraint vacuously passes values of a
    /// kind it does not address, which only arises under union-typed
    /// fields.
    pub(crate) fn check(&self, value: &FieldValue) -> std::result::Result<(), ConstraintFailure> {
        match (self, value) {
            (CompiledConstraint::Range(range), FieldValue::Integer(n)) => {
                range.check(*n).map_err(ConstraintFailure::new)
            }
            (CompiledConstraint::Range(range), FieldValue::Opaque(v)) => range
                .check(v.rank() as i64)
                .map_err(|m| ConstraintFailure::new(format!("rank {}", m))),
            (CompiledConstraint::Pattern(pattern), FieldValue::Text(s)) => {
                pattern.check(s).map_err(ConstraintFailure::new)
            }
            (CompiledConstraint::Length(length), FieldValue::Text(s)) => {
                length.check(s).map_err(ConstraintFailure::new)
            }
            (CompiledConstraint::OneOf(members), FieldValue::Integer(n)) => {
                check_membership(members, *n).map_err(ConstraintFailure::new)
            }
            (CompiledConstraint::OneOf(members), FieldValue::Opaque(v)) => {
                check_membership(members, v.rank() as i64)
                    .map_err(|m| ConstraintFailure::new(format!("rank {}", m)))
            }
            (CompiledConstraint::Entries(entries), FieldValue::Entries(map)) => entries.check(map),
            _ => Ok(()),
        }
    }
}

fn check_membership(members: &[i64], value: i64) -> std::result::Result<(), String> {
    if members.contains(&value) {
        Ok(())
    } else {
        Err(format!("must be one of {:?}, got {}", members, value))
    }
}
