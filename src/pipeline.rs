//! Per-field validation pipeline and cross-field aggregation
//!
//! Each field runs a small state machine: before hooks, coercion, the
//! optional-absence short-circuit, after hooks, then constraints. Every
//! declared field is attempted regardless of earlier fields' outcomes, so
//! the report carries the complete set of problems in one pass. Model
//! validators run only on a clean field pass and stop at the first
//! failure.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::coerce;
use crate::report::{ErrorKind, ValidationError, ValidationReport};
use crate::schema::{CompiledField, Schema};
use crate::value::{FieldValue, Instance, RawRecord, RawValue};

/// Terminal state of one field's pipeline.
enum FieldOutcome {
    Coerced(FieldValue),
    Failed(ValidationError),
}

pub(crate) fn run(schema: &Schema, record: &RawRecord) -> Result<Instance, ValidationReport> {
    let mut report = ValidationReport::new();
    let mut values = BTreeMap::new();

    for field in &schema.fields {
        let name = field.descriptor.name();
        match run_field(field, record.get(name)) {
            FieldOutcome::Coerced(value) => {
                trace!(field = name, "field coerced");
                values.insert(name.to_string(), value);
            }
            FieldOutcome::Failed(error) => {
                trace!(field = name, error = %error, "field failed");
                report.push_field_error(error);
            }
        }
    }

    if !report.is_empty() {
        debug!(errors = report.len(), "record failed field validation");
        return Err(report);
    }

    let instance = Instance::new(values);
    for validator in &schema.validators {
        if let Err(message) = (validator.check.as_ref())(&instance) {
            debug!(validator = validator.name(), "model validator rejected record");
            report.set_model_error(ValidationError::new(
                validator.name(),
                ErrorKind::ConstraintViolation,
                message,
            ));
            return Err(report);
        }
    }

    Ok(instance)
}

fn run_field(field: &CompiledField, raw: Option<&RawValue>) -> FieldOutcome {
    let descriptor = &field.descriptor;
    let name = descriptor.name();

    // Missing field: default, required error, or absence.
    let Some(raw) = raw else {
        if let Some(default) = &descriptor.default {
            return FieldOutcome::Coerced(default.clone());
        }
        if descriptor.is_required() {
            return FieldOutcome::Failed(ValidationError::new(
                name,
                ErrorKind::TypeMismatch,
                "missing required field",
            ));
        }
        return FieldOutcome::Coerced(FieldValue::Absent);
    };

    // Before-coercion hooks see the exact raw input, in registration
    // order. The first failure halts the field.
    let mut raw = raw.clone();
    for hook in &descriptor.before_hooks {
        match (hook.as_ref())(raw) {
            Ok(next) => raw = next,
            Err(message) => {
                return FieldOutcome::Failed(ValidationError::new(
                    name,
                    ErrorKind::TypeMismatch,
                    message,
                ))
            }
        }
    }

    // Strict coercion to the declared target type.
    let mut value = match coerce::coerce(&raw, descriptor.field_type()) {
        Ok(value) => value,
        Err(error) => {
            let path = match &error.key {
                Some(key) => format!("{}.{}", name, key),
                None => name.to_string(),
            };
            return FieldOutcome::Failed(ValidationError::new(
                path,
                ErrorKind::TypeMismatch,
                error.message,
            ));
        }
    };

    // Explicit absence of an optional field succeeds immediately; after
    // hooks and constraints never see it.
    if value.is_absent() {
        return FieldOutcome::Coerced(value);
    }

    // After-coercion hooks may transform or reject, in registration order.
    for hook in &descriptor.after_hooks {
        match (hook.as_ref())(value) {
            Ok(next) => value = next,
            Err(message) => {
                return FieldOutcome::Failed(ValidationError::new(
                    name,
                    ErrorKind::ConstraintViolation,
                    message,
                ))
            }
        }
    }

    // Declared constraints in order; the first violation wins.
    for constraint in &field.constraints {
        if let Err(failure) = constraint.check(&value) {
            let path = match failure.key {
                Some(key) => format!("{}.{}", name, key),
                None => name.to_string(),
            };
            return FieldOutcome::Failed(ValidationError::new(
                path,
                ErrorKind::ConstraintViolation,
                failure.message,
            ));
        }
    }

    FieldOutcome::Coerced(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::constraint::{Constraint, RangeCheck};
    use crate::field::{FieldDescriptor, FieldType};
    use crate::report::ErrorKind;
    use crate::schema::Schema;
    use crate::value::{FieldValue, RawRecord, RawValue};

    #[test]
    fn test_before_hooks_run_in_order_on_the_raw_value() {
        // The first hook rewrites the raw value; the second sees the
        // rewritten one.
        let schema = Schema::builder()
            .field(
                FieldDescriptor::new("id", FieldType::Integer)
                    .before_hook(|_raw| Ok(RawValue::from(7)))
                    .before_hook(|raw| {
                        let RawValue::Json(value) = &raw else {
                            return Err("expected json".into());
                        };
                        if value == &json!(7) {
                            Ok(raw)
                        } else {
                            Err("hook ordering broken".into())
                        }
                    }),
            )
            .build()
            .unwrap();

        let record = RawRecord::new().with("id", "anything");
        let instance = schema.validate(&record).unwrap();
        assert_eq!(instance.integer("id"), Some(7));
    }

    #[test]
    fn test_before_hook_failure_skips_coercion() {
        let schema = Schema::builder()
            .field(
                FieldDescriptor::new("id", FieldType::Integer)
                    .before_hook(|_raw| Err("rejected early".into())),
            )
            .build()
            .unwrap();

        // The raw value would coerce fine; the hook must win.
        let record = RawRecord::new().with("id", 5);
        let report = schema.validate(&record).unwrap_err();
        let error = &report.field_errors()[0];
        assert_eq!(error.kind, ErrorKind::TypeMismatch);
        assert_eq!(error.message, "rejected early");
    }

    #[test]
    fn test_after_hook_transforms_before_constraints() {
        // The hook clamps to 100, so the range constraint passes.
        let schema = Schema::builder()
            .field(
                FieldDescriptor::new("score", FieldType::Integer)
                    .after_hook(|value| {
                        let FieldValue::Integer(n) = value else {
                            return Ok(value);
                        };
                        Ok(FieldValue::Integer(n.min(100)))
                    })
                    .constraint(Constraint::Range(RangeCheck::closed(0, 100))),
            )
            .build()
            .unwrap();

        let record = RawRecord::new().with("score", 250);
        let instance = schema.validate(&record).unwrap();
        assert_eq!(instance.integer("score"), Some(100));
    }

    #[test]
    fn test_after_hook_rejection_is_a_constraint_violation() {
        let schema = Schema::builder()
            .field(
                FieldDescriptor::new("score", FieldType::Integer)
                    .after_hook(|_value| Err("not acceptable".into())),
            )
            .build()
            .unwrap();

        let record = RawRecord::new().with("score", 5);
        let report = schema.validate(&record).unwrap_err();
        assert_eq!(
            report.field_errors()[0].kind,
            ErrorKind::ConstraintViolation
        );
    }

    #[test]
    fn test_absent_optional_skips_after_hooks_and_constraints() {
        let schema = Schema::builder()
            .field(
                FieldDescriptor::new("score", FieldType::optional(FieldType::Integer))
                    .after_hook(|_value| Err("after hook must not run".into()))
                    .constraint(Constraint::Range(RangeCheck::closed(0, 10))),
            )
            .build()
            .unwrap();

        let record = RawRecord::new().with("score", serde_json::Value::Null);
        let instance = schema.validate(&record).unwrap();
        assert!(instance.is_absent("score"));
    }

    #[test]
    fn test_every_field_is_attempted() {
        let schema = Schema::builder()
            .field(FieldDescriptor::new("a", FieldType::Integer))
            .field(FieldDescriptor::new("b", FieldType::Text))
            .field(FieldDescriptor::new("c", FieldType::Boolean))
            .build()
            .unwrap();

        let record = RawRecord::new()
            .with("a", "not a number")
            .with("b", 42)
            .with("c", true);
        let report = schema.validate(&record).unwrap_err();
        let paths: Vec<_> = report.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_required_field() {
        let schema = Schema::builder()
            .field(FieldDescriptor::new("id", FieldType::Integer))
            .build()
            .unwrap();

        let report = schema.validate(&RawRecord::new()).unwrap_err();
        let error = &report.field_errors()[0];
        assert_eq!(error.path, "id");
        assert_eq!(error.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_missing_field_uses_default_without_validation() {
        // The default violates the declared range; defaults bypass
        // constraints.
        let schema = Schema::builder()
            .field(
                FieldDescriptor::new("id", FieldType::Integer)
                    .with_default(FieldValue::Integer(0))
                    .constraint(Constraint::Range(RangeCheck::closed(1, 100))),
            )
            .build()
            .unwrap();

        let instance = schema.validate(&RawRecord::new()).unwrap();
        assert_eq!(instance.integer("id"), Some(0));
    }
}
