//! Stricture
//!
//! A strict, declarative record validation engine. A [`Schema`] describes
//! typed fields with constraints and custom validation hooks; validating a
//! raw record converts it into a strongly-typed, constraint-satisfying
//! [`Instance`], or reports precisely why it could not.
//!
//! ## Features
//!
//! - **Strict Coercion**: integers must arrive as integral numbers and text
//!   as strings; no widening, no implicit stringification
//! - **Ordered Hooks**: before-coercion and after-coercion callbacks run in
//!   registration order, registered explicitly on the field descriptor
//! - **Complete Reports**: every independently broken field is reported in
//!   one pass, in schema-declared order
//! - **Whole-Record Validators**: named model-level checks run only after
//!   every field individually passed, and fail fast
//! - **Capability Boundary**: opaque external values validate through a
//!   single queryable rank
//!
//! ## Validation order
//!
//! ```text
//! raw value ── before hooks ── coercion ── after hooks ── constraints
//!                  │               │            │              │
//!                  └── TypeMismatch┘            └── ConstraintViolation
//! ```
//!
//! Field failures aggregate across the record; model validators run only
//! on a clean field pass and stop at the first failure.
//!
//! ## Example
//!
//! ```
//! use stricture::{Constraint, FieldDescriptor, FieldType, RangeCheck, RawRecord, Schema};
//!
//! let schema = Schema::builder()
//!     .field(
//!         FieldDescriptor::new("id", FieldType::Integer)
//!             .constraint(Constraint::Range(RangeCheck::closed(1, 100))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let record = RawRecord::new().with("id", 42);
//! let instance = schema.validate(&record).unwrap();
//! assert_eq!(instance.integer("id"), Some(42));
//!
//! let report = schema.validate(&RawRecord::new().with("id", 0)).unwrap_err();
//! assert_eq!(report.field_errors()[0].path, "id");
//! ```

pub mod constraint;
pub mod error;
pub mod field;
pub mod report;
pub mod schema;
pub mod value;

mod coerce;
mod pipeline;

pub use constraint::{Bound, Constraint, EntryCheck, LengthCheck, RangeCheck};
pub use error::{Result, SchemaError};
pub use field::{AfterHook, BeforeHook, FieldDescriptor, FieldType};
pub use report::{ErrorKind, ValidationError, ValidationReport};
pub use schema::{ModelValidator, Schema, SchemaBuilder};
pub use value::{FieldValue, Instance, Ranked, RawRecord, RawValue};
