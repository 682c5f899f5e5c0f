//! Error aggregation and reporting
//!
//! Field-level failures accumulate across the whole record so a caller
//! sees every independently broken field in one pass, in schema-declared
//! order. A model-level failure is kept separately and is only reachable
//! when zero field errors occurred.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The raw value cannot be interpreted as the declared type, including
    /// a before-coercion hook's structural rejection.
    TypeMismatch,
    /// A correctly-typed value fails a declared bound, pattern, length,
    /// entry, or model rule.
    ConstraintViolation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeMismatch => write!(f, "type mismatch"),
            ErrorKind::ConstraintViolation => write!(f, "constraint violation"),
        }
    }
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field path, dotted for container entries. Model-level errors carry
    /// the validator name.
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path, self.kind, self.message)
    }
}

/// Ordered collection of failures from one validation call.
///
/// Field errors preserve schema-declared order, so reports are
/// deterministic and diffable across runs with identical invalid input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    field_errors: Vec<ValidationError>,
    model_error: Option<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_field_error(&mut self, error: ValidationError) {
        self.field_errors.push(error);
    }

    pub(crate) fn set_model_error(&mut self, error: ValidationError) {
        self.model_error = Some(error);
    }

    /// Whether the validation call succeeded.
    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty() && self.model_error.is_none()
    }

    /// Total number of errors.
    pub fn len(&self) -> usize {
        self.field_errors.len() + usize::from(self.model_error.is_some())
    }

    /// Field-level errors, in schema-declared order.
    pub fn field_errors(&self) -> &[ValidationError] {
        &self.field_errors
    }

    /// The record-level error, present only when zero field errors
    /// occurred.
    pub fn model_error(&self) -> Option<&ValidationError> {
        self.model_error.as_ref()
    }

    /// Iterate over every error, field errors first.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.field_errors.iter().chain(self.model_error.iter())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed with {} error(s)", self.len())?;
        for error in self.iter() {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
