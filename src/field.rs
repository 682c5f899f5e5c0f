//! Field descriptors and target types
//!
//! A [`FieldDescriptor`] is the unit of schema: name, target type,
//! optionality and default, ordered before/after hooks, and ordered
//! constraints. Hooks are explicit ordered lists of callbacks registered at
//! schema-build time; the engine never discovers them by reflection.

use std::fmt;
use std::sync::Arc;

use crate::constraint::Constraint;
use crate::value::{FieldValue, RawValue};

/// Target type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Strict integral number; string digits, floats, and booleans are
    /// rejected.
    Integer,
    Boolean,
    /// Unicode text; numbers are never implicitly stringified.
    Text,
    /// Calendar date in `%Y-%m-%d` form.
    Date,
    /// String keys mapped to strict integers.
    KeyedContainer,
    /// Externally-defined value exposing only its rank.
    Opaque,
    /// Wrapped type that also admits explicit absence.
    Optional(Box<FieldType>),
    /// Disjoint union; members are tried in declared order.
    Union(Vec<FieldType>),
}

impl FieldType {
    /// Wrap a type so it also admits explicit absence.
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    /// Name used in mismatch messages.
    pub fn name(&self) -> String {
        match self {
            FieldType::Integer => "integer".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Text => "string".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::KeyedContainer => "keyed container".to_string(),
            FieldType::Opaque => "opaque value".to_string(),
            FieldType::Optional(inner) => format!("optional {}", inner.name()),
            FieldType::Union(members) => members
                .iter()
                .map(FieldType::name)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }

    /// Whether a coerced value is of this type. Used to vet declared
    /// defaults at build time.
    pub(crate) fn admits(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldType::Integer, FieldValue::Integer(_)) => true,
            (FieldType::Boolean, FieldValue::Boolean(_)) => true,
            (FieldType::Text, FieldValue::Text(_)) => true,
            (FieldType::Date, FieldValue::Date(_)) => true,
            (FieldType::KeyedContainer, FieldValue::Entries(_)) => true,
            (FieldType::Opaque, FieldValue::Opaque(_)) => true,
            (FieldType::Optional(_), FieldValue::Absent) => true,
            (FieldType::Optional(inner), value) => inner.admits(value),
            (FieldType::Union(members), value) => {
                members.iter().any(|member| member.admits(value))
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Hook run on the raw value before coercion. May replace the raw value or
/// reject it with a message.
pub type BeforeHook = Arc<dyn Fn(RawValue) -> Result<RawValue, String> + Send + Sync>;

/// Hook run on the coerced value before constraints. May transform the
/// value (clamping, normalization) or reject it with a message.
pub type AfterHook = Arc<dyn Fn(FieldValue) -> Result<FieldValue, String> + Send + Sync>;

/// Schema entry describing one named value's type, constraints, default,
/// and hooks.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) field_type: FieldType,
    pub(crate) required: bool,
    pub(crate) default: Option<FieldValue>,
    pub(crate) before_hooks: Vec<BeforeHook>,
    pub(crate) after_hooks: Vec<AfterHook>,
    pub(crate) constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    /// A required field with no default, hooks, or constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            default: None,
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Mark the field as not required; a missing value coerces to absence.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a default used when the field is missing from the record.
    /// Defaults are already-typed values and bypass hooks and constraints.
    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    /// Register a before-coercion hook. Hooks run in registration order on
    /// the exact raw input; the first failure halts the field.
    pub fn before_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(RawValue) -> Result<RawValue, String> + Send + Sync + 'static,
    {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    /// Register an after-coercion hook. Hooks run in registration order on
    /// the coerced, pre-constraint value.
    pub fn after_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(FieldValue) -> Result<FieldValue, String> + Send + Sync + 'static,
    {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    /// Attach a constraint. Constraints run in registration order and stop
    /// at the first violation.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Field name, unique within its schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared target type.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Whether a missing value is an error.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("before_hooks", &self.before_hooks.len())
            .field("after_hooks", &self.after_hooks.len())
            .field("constraints", &self.constraints)
            .finish()
    }
}
