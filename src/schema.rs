//! Schema definition and the validation entry point
//!
//! A [`Schema`] is built once, is immutable thereafter, and may be shared
//! and invoked concurrently without locking. Field registration order is
//! significant: it is validation order and therefore error-report order.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::constraint::CompiledConstraint;
use crate::error::{Result, SchemaError};
use crate::field::{FieldDescriptor, FieldType};
use crate::pipeline;
use crate::report::{ErrorKind, ValidationError, ValidationReport};
use crate::value::{Instance, RawRecord};

/// A named whole-record check, run only after every field individually
/// passed. The first failing validator aborts the chain.
#[derive(Clone)]
pub struct ModelValidator {
    pub(crate) name: String,
    pub(crate) check: Arc<dyn Fn(&Instance) -> std::result::Result<(), String> + Send + Sync>,
}

impl ModelValidator {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Instance) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ModelValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelValidator")
            .field("name", &self.name)
            .finish()
    }
}

/// A field descriptor with its constraints compiled at build time.
#[derive(Debug, Clone)]
pub(crate) struct CompiledField {
    pub(crate) descriptor: FieldDescriptor,
    pub(crate) constraints: Vec<CompiledConstraint>,
}

/// An immutable validation schema.
///
/// Built via [`Schema::builder`]; the sole runtime entry point is
/// [`Schema::validate`].
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) fields: Vec<CompiledField>,
    pub(crate) validators: Vec<ModelValidator>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declared field descriptors, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().map(|field| &field.descriptor)
    }

    /// Validate a raw record, producing a typed instance or a report of
    /// every independently broken field.
    pub fn validate(&self, record: &RawRecord) -> std::result::Result<Instance, ValidationReport> {
        pipeline::run(self, record)
    }

    /// Validate a JSON object directly.
    pub fn validate_json(
        &self,
        value: &serde_json::Value,
    ) -> std::result::Result<Instance, ValidationReport> {
        match RawRecord::from_json(value) {
            Some(record) => self.validate(&record),
            None => {
                let mut report = ValidationReport::new();
                report.push_field_error(ValidationError::new(
                    "",
                    ErrorKind::TypeMismatch,
                    format!(
                        "expected a JSON object, got {}",
                        crate::value::json_type_name(value)
                    ),
                ));
                Err(report)
            }
        }
    }
}

/// Ordered schema construction.
///
/// Definition errors (duplicate names, contradictory constraints, bad
/// patterns) are reported by [`SchemaBuilder::build`], never at validation
/// time.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldDescriptor>,
    validators: Vec<ModelValidator>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field. Fields validate in registration order.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Register a whole-record validator. Validators run in registration
    /// order and stop at the first failure.
    pub fn model_validator<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Instance) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(ModelValidator::new(name, check));
        self
    }

    /// Compile the schema, surfacing every definition error.
    pub fn build(self) -> Result<Schema> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for descriptor in self.fields {
            if !seen.insert(descriptor.name.clone()) {
                return Err(SchemaError::DuplicateField(descriptor.name));
            }

            check_type_well_formed(&descriptor.name, &descriptor.field_type)?;

            if let Some(default) = &descriptor.default {
                if !descriptor.field_type.admits(default) {
                    return Err(SchemaError::DefaultMismatch {
                        field: descriptor.name.clone(),
                        expected: descriptor.field_type.name(),
                        actual: default.type_name().to_string(),
                    });
                }
            }

            let mut constraints = Vec::with_capacity(descriptor.constraints.len());
            for constraint in &descriptor.constraints {
                if !constraint.applies_to(&descriptor.field_type) {
                    return Err(SchemaError::ConstraintMismatch {
                        field: descriptor.name.clone(),
                        constraint: constraint.name(),
                        field_type: descriptor.field_type.name(),
                    });
                }
                constraints.push(constraint.compile(&descriptor.name)?);
            }

            fields.push(CompiledField {
                descriptor,
                constraints,
            });
        }

        Ok(Schema {
            fields,
            validators: self.validators,
        })
    }
}

/// Reject union types with no members, at any nesting depth.
fn check_type_well_formed(field: &str, field_type: &FieldType) -> Result<()> {
    match field_type {
        FieldType::Optional(inner) => check_type_well_formed(field, inner),
        FieldType::Union(members) => {
            if members.is_empty() {
                return Err(SchemaError::EmptyUnion {
                    field: field.to_string(),
                });
            }
            for member in members {
                check_type_well_formed(field, member)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
