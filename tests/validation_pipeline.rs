//! Validation Pipeline Tests
//!
//! Cross-field aggregation, model-validator gating and ordering, opaque
//! rank checks through the capability boundary, unions, and report
//! determinism.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::json;

use stricture::{
    Constraint, ErrorKind, FieldDescriptor, FieldType, FieldValue, RangeCheck, Ranked,
    RawRecord, RawValue, Schema,
};

// =============================================================================
// Flag records with a whole-record rule
// =============================================================================

fn flags_schema() -> Schema {
    Schema::builder()
        .field(
            FieldDescriptor::new("is_flip", FieldType::Boolean)
                .with_default(FieldValue::Boolean(true)),
        )
        .field(
            FieldDescriptor::new("is_zoom", FieldType::Boolean)
                .with_default(FieldValue::Boolean(true)),
        )
        .model_validator("at_least_one_flag", |instance| {
            if instance.boolean("is_flip") == Some(false)
                && instance.boolean("is_zoom") == Some(false)
            {
                Err("must have one true field".to_string())
            } else {
                Ok(())
            }
        })
        .build()
        .unwrap()
}

#[test]
fn test_flags_defaults_pass() {
    let instance = flags_schema().validate(&RawRecord::new()).unwrap();
    assert_eq!(instance.boolean("is_flip"), Some(true));
    assert_eq!(instance.boolean("is_zoom"), Some(true));
}

#[test]
fn test_flags_one_true_passes() {
    let record = RawRecord::new().with("is_flip", false).with("is_zoom", true);
    assert!(flags_schema().validate(&record).is_ok());

    let record = RawRecord::new().with("is_flip", true).with("is_zoom", false);
    assert!(flags_schema().validate(&record).is_ok());
}

#[test]
fn test_flags_both_false_fails_the_model_rule() {
    let record = RawRecord::new()
        .with("is_flip", false)
        .with("is_zoom", false);
    let report = flags_schema().validate(&record).unwrap_err();

    // The model error stands alone: no field errors mixed in.
    assert!(report.field_errors().is_empty());
    let error = report.model_error().unwrap();
    assert_eq!(error.path, "at_least_one_flag");
    assert_eq!(error.kind, ErrorKind::ConstraintViolation);
    assert_eq!(report.len(), 1);
}

#[test]
fn test_model_validators_only_run_on_a_clean_field_pass() {
    let ran = Arc::new(AtomicBool::new(false));
    let witness = ran.clone();
    let schema = Schema::builder()
        .field(FieldDescriptor::new("is_flip", FieldType::Boolean))
        .model_validator("never_reached", move |_instance| {
            witness.store(true, Ordering::SeqCst);
            Err("should not run".to_string())
        })
        .build()
        .unwrap();

    let record = RawRecord::new().with("is_flip", "not a boolean");
    let report = schema.validate(&record).unwrap_err();
    assert_eq!(report.field_errors().len(), 1);
    assert!(report.model_error().is_none());
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_model_validators_fail_fast_in_order() {
    let second_ran = Arc::new(AtomicBool::new(false));
    let witness = second_ran.clone();
    let schema = Schema::builder()
        .field(FieldDescriptor::new("is_flip", FieldType::Boolean))
        .model_validator("first", |_instance| Err("first failure".to_string()))
        .model_validator("second", move |_instance| {
            witness.store(true, Ordering::SeqCst);
            Ok(())
        })
        .build()
        .unwrap();

    let record = RawRecord::new().with("is_flip", true);
    let report = schema.validate(&record).unwrap_err();
    assert_eq!(report.model_error().unwrap().path, "first");
    assert!(!second_ran.load(Ordering::SeqCst));
}

// =============================================================================
// Cross-field aggregation
// =============================================================================

#[test]
fn test_two_broken_fields_report_two_errors_in_schema_order() {
    let schema = Schema::builder()
        .field(
            FieldDescriptor::new("id", FieldType::Integer)
                .constraint(Constraint::Range(RangeCheck::closed(1, 100))),
        )
        .field(FieldDescriptor::new("name", FieldType::Text))
        .build()
        .unwrap();

    let record = RawRecord::new().with("id", 0).with("name", 42);
    let report = schema.validate(&record).unwrap_err();

    assert_eq!(report.len(), 2);
    assert_eq!(report.field_errors()[0].path, "id");
    assert_eq!(report.field_errors()[0].kind, ErrorKind::ConstraintViolation);
    assert_eq!(report.field_errors()[1].path, "name");
    assert_eq!(report.field_errors()[1].kind, ErrorKind::TypeMismatch);
}

#[test]
fn test_reports_are_deterministic() {
    let schema = Schema::builder()
        .field(FieldDescriptor::new("a", FieldType::Integer))
        .field(FieldDescriptor::new("b", FieldType::Text))
        .field(FieldDescriptor::new("c", FieldType::Boolean))
        .build()
        .unwrap();

    let record = RawRecord::new()
        .with("a", "x")
        .with("b", 1)
        .with("c", "y");
    let first = schema.validate(&record).unwrap_err();
    let second = schema.validate(&record).unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let schema = Schema::builder()
        .field(FieldDescriptor::new("id", FieldType::Integer))
        .build()
        .unwrap();

    let record = RawRecord::new().with("id", 1).with("extra", "noise");
    assert!(schema.validate(&record).is_ok());
}

// =============================================================================
// Opaque values through the rank capability
// =============================================================================

#[derive(Debug)]
struct StubTensor {
    rank: usize,
}

impl Ranked for StubTensor {
    fn rank(&self) -> usize {
        self.rank
    }
}

fn tensor(rank: usize) -> RawValue {
    RawValue::Opaque(Arc::new(StubTensor { rank }))
}

fn tensor_schema() -> Schema {
    Schema::builder()
        .field(
            FieldDescriptor::new("tensor", FieldType::Opaque)
                .constraint(Constraint::OneOf(vec![3, 4, 5])),
        )
        .build()
        .unwrap()
}

#[test]
fn test_tensor_allowed_ranks() {
    for rank in [3, 4, 5] {
        let record = RawRecord::new().with("tensor", tensor(rank));
        let instance = tensor_schema().validate(&record).unwrap();
        assert_eq!(instance.opaque("tensor").unwrap().rank(), rank);
    }
}

#[test]
fn test_tensor_disallowed_ranks() {
    for rank in [2, 6] {
        let record = RawRecord::new().with("tensor", tensor(rank));
        let report = tensor_schema().validate(&record).unwrap_err();
        let error = &report.field_errors()[0];
        assert_eq!(error.path, "tensor");
        assert_eq!(error.kind, ErrorKind::ConstraintViolation);
    }
}

#[test]
fn test_tensor_range_applies_to_rank() {
    let schema = Schema::builder()
        .field(
            FieldDescriptor::new("tensor", FieldType::Opaque)
                .constraint(Constraint::Range(RangeCheck::closed(3, 5))),
        )
        .build()
        .unwrap();

    assert!(schema
        .validate(&RawRecord::new().with("tensor", tensor(4)))
        .is_ok());
    assert!(schema
        .validate(&RawRecord::new().with("tensor", tensor(2)))
        .is_err());
}

#[test]
fn test_tensor_requires_an_opaque_value() {
    let record = RawRecord::new().with("tensor", json!({"shape": [9, 9]}));
    let report = tensor_schema().validate(&record).unwrap_err();
    assert_eq!(report.field_errors()[0].kind, ErrorKind::TypeMismatch);
}

// =============================================================================
// Union-typed fields
// =============================================================================

#[test]
fn test_union_field_accepts_either_member() {
    let schema = Schema::builder()
        .field(
            FieldDescriptor::new(
                "payload",
                FieldType::Union(vec![FieldType::Integer, FieldType::Text]),
            )
            .constraint(Constraint::Range(RangeCheck::closed(0, 100))),
        )
        .build()
        .unwrap();

    let instance = schema
        .validate(&RawRecord::new().with("payload", 42))
        .unwrap();
    assert_eq!(instance.integer("payload"), Some(42));

    // The range constraint does not address text; the string arm passes.
    let instance = schema
        .validate(&RawRecord::new().with("payload", "forty-two"))
        .unwrap();
    assert_eq!(instance.text("payload"), Some("forty-two"));

    // The integer arm is still range-checked.
    let report = schema
        .validate(&RawRecord::new().with("payload", 200))
        .unwrap_err();
    assert_eq!(report.field_errors()[0].kind, ErrorKind::ConstraintViolation);

    // No member admits a boolean.
    let report = schema
        .validate(&RawRecord::new().with("payload", true))
        .unwrap_err();
    assert_eq!(report.field_errors()[0].kind, ErrorKind::TypeMismatch);
}

// =============================================================================
// Concurrent use of one schema
// =============================================================================

#[test]
fn test_schema_is_shared_across_threads() {
    let schema = Arc::new(flags_schema());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = schema.clone();
            thread::spawn(move || {
                let record = RawRecord::new()
                    .with("is_flip", i % 2 == 0)
                    .with("is_zoom", true);
                schema.validate(&record).is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
