//! Write-path enforcement
//!
//! Every write against a guarded object runs through
//! [`FieldValidator::validate_write`], in this order:
//! 1. the field must be declared
//! 2. the value must be a member of the declared type(s)
//! 3. an immutable field must not already hold an explicit value
//! 4. the value must be one of the declared choices (numbers compare by
//!    value, so `2.0` matches a choice of `2`; booleans never match numbers)
//! 5. the predicate must return `true` (and must return a bool at all)
//!
//! Bare type constraints stop after step 2. The validator never mutates;
//! the caller stores the value only after every check has passed.

use serde_json::Value;

use super::errors::{GuardError, GuardResult};
use super::types::{Constraint, FieldDecl, FieldState, Schema, ValueType};

/// Enforces a schema's field contracts on candidate writes and deletes.
pub struct FieldValidator<'a> {
    schema: &'a Schema,
}

impl<'a> FieldValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates writing `value` into `field`, whose current state is `state`.
    ///
    /// # Errors
    ///
    /// - `UnknownField` if the field is not declared
    /// - `TypeMismatch` if the value is not a member of the declared type
    /// - `ImmutableViolation` if an immutable field already holds an explicit value
    /// - `InvalidChoice` if the value is outside the declared choices
    /// - `PredicateTypeError` / `PredicateRejected` if the predicate fails
    pub fn validate_write(
        &self,
        field: &str,
        value: &Value,
        state: FieldState,
    ) -> GuardResult<&'a FieldDecl> {
        let decl = self.schema.require_field(field)?;
        check_type(field, decl.constraint(), value)?;

        if let Constraint::Spec(spec) = decl.constraint() {
            // A value still coming from the schema default does not count as
            // set: the first explicit write goes through, the next one fails.
            if spec.is_immutable() && state == FieldState::Explicit {
                return Err(GuardError::ImmutableViolation(field.to_string()));
            }
        }

        check_choices_and_predicate(field, decl.constraint(), value)?;
        Ok(decl)
    }

    /// Validates deleting `field`. Immutable fields can never be deleted,
    /// whether or not they currently hold a value.
    pub fn validate_delete(&self, field: &str) -> GuardResult<&'a FieldDecl> {
        let decl = self.schema.require_field(field)?;
        if decl.constraint().is_immutable() {
            return Err(GuardError::ImmutableViolation(field.to_string()));
        }
        Ok(decl)
    }

    /// Returns every required field, in schema order, for which `resolves`
    /// reports no value.
    pub fn missing_required<F>(&self, resolves: F) -> Vec<String>
    where
        F: Fn(&FieldDecl) -> bool,
    {
        self.schema
            .fields()
            .filter(|decl| decl.constraint().is_required() && !resolves(decl))
            .map(|decl| decl.name().to_string())
            .collect()
    }
}

/// Checks a value against a constraint without any state: type, choices
/// and predicate. Used for schema defaults at declaration time.
pub(crate) fn check_value(field: &str, constraint: &Constraint, value: &Value) -> GuardResult<()> {
    check_type(field, constraint, value)?;
    check_choices_and_predicate(field, constraint, value)
}

fn check_type(field: &str, constraint: &Constraint, value: &Value) -> GuardResult<()> {
    let type_spec = constraint.type_spec();
    if type_spec.matches(value) {
        return Ok(());
    }
    Err(GuardError::TypeMismatch {
        field: field.to_string(),
        expected: type_spec.describe(),
        actual: ValueType::of(value).to_string(),
        value: value.to_string(),
    })
}

fn check_choices_and_predicate(field: &str, constraint: &Constraint, value: &Value) -> GuardResult<()> {
    let Some(spec) = constraint.as_spec() else {
        return Ok(());
    };

    if let Some(choices) = spec.choices() {
        if !choices.iter().any(|choice| same_choice(choice, value)) {
            return Err(GuardError::InvalidChoice {
                field: field.to_string(),
                value: value.to_string(),
                choices: Value::Array(choices.to_vec()).to_string(),
            });
        }
    }

    if let Some(predicate) = spec.validate_fn() {
        match predicate.call(value) {
            Value::Bool(true) => {}
            Value::Bool(false) => {
                return Err(GuardError::PredicateRejected {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
            other => {
                return Err(GuardError::PredicateTypeError {
                    field: field.to_string(),
                    returned: ValueType::of(&other).to_string(),
                });
            }
        }
    }

    Ok(())
}

fn same_choice(choice: &Value, value: &Value) -> bool {
    match (choice, value) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => choice == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Predicate};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder("account")
            .field("nickname", ValueType::String)
            .field(
                "id",
                FieldSpec::builder(ValueType::Int)
                    .required(true)
                    .immutable(true)
                    .build()
                    .unwrap(),
            )
            .field(
                "tier",
                FieldSpec::builder(ValueType::String)
                    .choices(["free", "pro"])
                    .predicate(Predicate::from_bool(|v| v.as_str() != Some("pro")))
                    .build()
                    .unwrap(),
            )
            .field(
                "score",
                FieldSpec::builder(ValueType::Int)
                    .choices([1, 2, 3])
                    .validate_fn(|v| json!(v.to_string()))
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_unknown_field() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        let err = validator
            .validate_write("email", &json!("a@b"), FieldState::Unset)
            .unwrap_err();
        assert_eq!(err.code(), "GUARD_UNKNOWN_FIELD");
    }

    #[test]
    fn test_bare_type_only_checks_membership() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        assert!(validator
            .validate_write("nickname", &json!("neo"), FieldState::Explicit)
            .is_ok());
        let err = validator
            .validate_write("nickname", &json!(7), FieldState::Unset)
            .unwrap_err();
        match err {
            GuardError::TypeMismatch { field, expected, actual, .. } => {
                assert_eq!(field, "nickname");
                assert_eq!(expected, "of type string");
                assert_eq!(actual, "int");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_immutable_depends_on_state() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        assert!(validator.validate_write("id", &json!(1), FieldState::Unset).is_ok());
        assert!(validator.validate_write("id", &json!(1), FieldState::FromDefault).is_ok());
        assert_eq!(
            validator
                .validate_write("id", &json!(1), FieldState::Explicit)
                .unwrap_err(),
            GuardError::ImmutableViolation("id".into())
        );
    }

    #[test]
    fn test_type_checked_before_immutability() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        let err = validator
            .validate_write("id", &json!("one"), FieldState::Explicit)
            .unwrap_err();
        assert_eq!(err.code(), "GUARD_TYPE_MISMATCH");
    }

    #[test]
    fn test_choice_independent_of_type() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        let err = validator
            .validate_write("tier", &json!("enterprise"), FieldState::Unset)
            .unwrap_err();
        assert_eq!(err.code(), "GUARD_INVALID_CHOICE");
    }

    #[test]
    fn test_numeric_choices_compare_by_value() {
        let schema = Schema::builder("measure")
            .field(
                "step",
                FieldSpec::builder([ValueType::Int, ValueType::Float])
                    .choices([1, 2])
                    .build()
                    .unwrap(),
            )
            .field(
                "flag",
                FieldSpec::builder([ValueType::Bool, ValueType::Int])
                    .choices([1])
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let validator = FieldValidator::new(&schema);

        assert!(validator.validate_write("step", &json!(2.0), FieldState::Unset).is_ok());
        assert!(validator.validate_write("step", &json!(1), FieldState::Unset).is_ok());
        assert_eq!(
            validator
                .validate_write("step", &json!(2.5), FieldState::Unset)
                .unwrap_err()
                .code(),
            "GUARD_INVALID_CHOICE"
        );

        assert!(validator.validate_write("flag", &json!(1), FieldState::Unset).is_ok());
        assert_eq!(
            validator
                .validate_write("flag", &json!(true), FieldState::Unset)
                .unwrap_err()
                .code(),
            "GUARD_INVALID_CHOICE"
        );
    }

    #[test]
    fn test_predicate_rejects() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        assert!(validator.validate_write("tier", &json!("free"), FieldState::Unset).is_ok());
        let err = validator
            .validate_write("tier", &json!("pro"), FieldState::Unset)
            .unwrap_err();
        assert_eq!(err.code(), "GUARD_PREDICATE_REJECTED");
    }

    #[test]
    fn test_predicate_non_bool_result() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        let err = validator
            .validate_write("score", &json!(2), FieldState::Unset)
            .unwrap_err();
        assert_eq!(
            err,
            GuardError::PredicateTypeError {
                field: "score".into(),
                returned: "string".into(),
            }
        );
    }

    #[test]
    fn test_delete_immutable_always_fails() {
        let schema = schema();
        let validator = FieldValidator::new(&schema);
        assert_eq!(
            validator.validate_delete("id").unwrap_err().code(),
            "GUARD_IMMUTABLE_VIOLATION"
        );
        assert!(validator.validate_delete("nickname").is_ok());
        assert!(validator.validate_delete("missing").is_err());
    }

    #[test]
    fn test_missing_required_in_schema_order() {
        let schema = Schema::builder("pair")
            .field("b", FieldSpec::builder(ValueType::Int).required(true).build().unwrap())
            .field("a", FieldSpec::builder(ValueType::Int).required(true).build().unwrap())
            .field("c", ValueType::Int)
            .build()
            .unwrap();
        let validator = FieldValidator::new(&schema);
        assert_eq!(validator.missing_required(|_| false), vec!["b", "a"]);
        assert!(validator.missing_required(|_| true).is_empty());
    }
}
