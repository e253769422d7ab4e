//! Guard error types
//!
//! Error codes:
//! - GUARD_INVALID_SPECIFICATION (declaration time, fatal for the schema)
//! - GUARD_SCHEMA_MISSING
//! - GUARD_SCHEMA_IMMUTABLE
//! - GUARD_UNKNOWN_FIELD
//! - GUARD_TYPE_MISMATCH
//! - GUARD_IMMUTABLE_VIOLATION
//! - GUARD_MISSING_REQUIRED
//! - GUARD_INVALID_CHOICE
//! - GUARD_PREDICATE_TYPE_ERROR
//! - GUARD_PREDICATE_REJECTED
//! - GUARD_UNSERIALIZABLE_VALUE

use thiserror::Error;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors raised by field specifications, schemas and guarded objects.
///
/// Every error is raised at the point of violation and leaves the
/// object it was raised against untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardError {
    #[error("invalid field specification: {0}")]
    InvalidSpecification(String),

    #[error("no schema declared for variant '{0}'")]
    SchemaMissing(String),

    #[error("schema for variant '{0}' is already declared and cannot be replaced")]
    SchemaImmutable(String),

    #[error("field '{field}' is not declared; available fields are {available:?}")]
    UnknownField { field: String, available: Vec<String> },

    #[error("field '{field}' must be {expected}, but a value of type {actual} was provided: {value}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
        value: String,
    },

    #[error("field '{0}' is immutable; it can't be changed or deleted")]
    ImmutableViolation(String),

    #[error("missing required fields {0:?}")]
    MissingRequired(Vec<String>),

    #[error("field '{field}' was given {value}, which is not one of the valid choices {choices}")]
    InvalidChoice {
        field: String,
        value: String,
        choices: String,
    },

    #[error("validate_fn for field '{field}' must return a bool, but returned a value of type {returned}")]
    PredicateTypeError { field: String, returned: String },

    #[error("field '{field}' failed its validate_fn with value {value}")]
    PredicateRejected { field: String, value: String },

    #[error("value for field '{field}' could not be converted to an attribute value: {reason}")]
    UnserializableValue { field: String, reason: String },
}

impl GuardError {
    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        GuardError::InvalidSpecification(reason.into())
    }

    /// Returns the stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::InvalidSpecification(_) => "GUARD_INVALID_SPECIFICATION",
            GuardError::SchemaMissing(_) => "GUARD_SCHEMA_MISSING",
            GuardError::SchemaImmutable(_) => "GUARD_SCHEMA_IMMUTABLE",
            GuardError::UnknownField { .. } => "GUARD_UNKNOWN_FIELD",
            GuardError::TypeMismatch { .. } => "GUARD_TYPE_MISMATCH",
            GuardError::ImmutableViolation(_) => "GUARD_IMMUTABLE_VIOLATION",
            GuardError::MissingRequired(_) => "GUARD_MISSING_REQUIRED",
            GuardError::InvalidChoice { .. } => "GUARD_INVALID_CHOICE",
            GuardError::PredicateTypeError { .. } => "GUARD_PREDICATE_TYPE_ERROR",
            GuardError::PredicateRejected { .. } => "GUARD_PREDICATE_REJECTED",
            GuardError::UnserializableValue { .. } => "GUARD_UNSERIALIZABLE_VALUE",
        }
    }

    /// Returns the single field this error concerns, if any.
    ///
    /// `MissingRequired` may name several fields and returns `None`;
    /// use [`GuardError::missing_fields`] for it.
    pub fn field(&self) -> Option<&str> {
        match self {
            GuardError::UnknownField { field, .. }
            | GuardError::TypeMismatch { field, .. }
            | GuardError::InvalidChoice { field, .. }
            | GuardError::PredicateTypeError { field, .. }
            | GuardError::PredicateRejected { field, .. }
            | GuardError::UnserializableValue { field, .. } => Some(field),
            GuardError::ImmutableViolation(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the unmet required fields of a `MissingRequired` error
    pub fn missing_fields(&self) -> &[String] {
        match self {
            GuardError::MissingRequired(fields) => fields,
            _ => &[],
        }
    }

    /// Returns true if the error was raised while declaring a schema
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            GuardError::InvalidSpecification(_) | GuardError::SchemaImmutable(_)
        )
    }
}
