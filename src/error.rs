//! Definition-time error types
//!
//! Every schema-construction failure surfaces through [`SchemaError`] when
//! the schema is built; validation itself never raises these. Runtime
//! validation failures travel as a
//! [`ValidationReport`](crate::report::ValidationReport) value instead.

use thiserror::Error;

/// Result type for schema definition operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema definition errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    #[error("field '{field}': invalid pattern: {source}")]
    InvalidPattern { field: String, source: regex::Error },

    #[error("field '{field}': range bounds admit no values")]
    EmptyRange { field: String },

    #[error("field '{field}': length bounds admit no values")]
    EmptyLength { field: String },

    #[error("field '{field}': membership set is empty")]
    EmptySet { field: String },

    #[error("field '{field}': union has no member types")]
    EmptyUnion { field: String },

    #[error("field '{field}': {constraint} constraint cannot apply to type {field_type}")]
    ConstraintMismatch {
        field: String,
        constraint: &'static str,
        field_type: String,
    },

    #[error("field '{field}': default value has type {actual}, expected {expected}")]
    DefaultMismatch {
        field: String,
        expected: String,
        actual: String,
    },
}
