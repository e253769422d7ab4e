//! Field specifications
//!
//! A `FieldSpec` describes everything a single field enforces beyond its
//! type: requiredness, immutability, a closed set of choices and a
//! one-argument predicate. Specs are validated when they are built, so a
//! malformed spec fails before any object using it exists.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::errors::{GuardError, GuardResult};
use super::types::TypeSpec;
use crate::config::GuardConfig;
use crate::observability::{Event, Logger};

/// A one-argument validation function.
///
/// The function returns a `Value` rather than a `bool` so that a
/// predicate producing anything other than a JSON boolean can be
/// detected and reported at write time.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    /// Wraps a predicate that always answers with a boolean
    pub fn from_bool<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(move |value| Value::Bool(f(value))))
    }

    pub fn call(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Constraint descriptor for a single field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    type_spec: TypeSpec,
    required: bool,
    immutable: bool,
    choices: Option<Vec<Value>>,
    validate_fn: Option<Predicate>,
}

impl FieldSpec {
    /// Starts a spec whose values must be members of `type_spec`
    pub fn builder(type_spec: impl Into<TypeSpec>) -> FieldSpecBuilder {
        FieldSpecBuilder {
            type_spec: type_spec.into(),
            required: false,
            immutable: false,
            choices: None,
            validate_fn: None,
        }
    }

    pub fn type_spec(&self) -> &TypeSpec {
        &self.type_spec
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    pub fn choices(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    pub fn validate_fn(&self) -> Option<&Predicate> {
        self.validate_fn.as_ref()
    }
}

/// Builder for [`FieldSpec`]
#[derive(Debug)]
pub struct FieldSpecBuilder {
    type_spec: TypeSpec,
    required: bool,
    immutable: bool,
    choices: Option<Vec<Value>>,
    validate_fn: Option<Predicate>,
}

impl FieldSpecBuilder {
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// Restricts legal values to the given ordered set
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.validate_fn = Some(Predicate::new(f));
        self
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.validate_fn = Some(predicate);
        self
    }

    pub fn build(self) -> GuardResult<FieldSpec> {
        self.build_with(&GuardConfig::default())
    }

    pub fn build_with(self, config: &GuardConfig) -> GuardResult<FieldSpec> {
        if let Err(err) = self.check(config) {
            Logger::event(Event::SpecRejected, &[("reason", err.to_string().as_str())]);
            return Err(err);
        }

        Ok(FieldSpec {
            type_spec: self.type_spec,
            required: self.required,
            immutable: self.immutable,
            choices: self.choices,
            validate_fn: self.validate_fn,
        })
    }

    fn check(&self, config: &GuardConfig) -> GuardResult<()> {
        self.type_spec.ensure_usable()?;

        if self.validate_fn.is_some() && self.choices.is_none() && config.predicate_requires_choices {
            return Err(GuardError::invalid_spec(
                "\"choices\" must be provided alongside \"validate_fn\"",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture_events;
    use crate::schema::ValueType;
    use serde_json::json;

    #[test]
    fn test_defaults_are_permissive() {
        let spec = FieldSpec::builder(ValueType::String).build().unwrap();
        assert!(!spec.is_required());
        assert!(!spec.is_immutable());
        assert!(spec.choices().is_none());
        assert!(spec.validate_fn().is_none());
    }

    #[test]
    fn test_full_spec() {
        let spec = FieldSpec::builder([ValueType::Int, ValueType::String])
            .required(true)
            .immutable(true)
            .choices([21, 22, 23])
            .validate_fn(|v| json!(v.as_i64().map_or(false, |n| n > 20)))
            .build()
            .unwrap();

        assert!(spec.is_required());
        assert!(spec.is_immutable());
        assert_eq!(spec.choices().unwrap(), &[json!(21), json!(22), json!(23)]);
        assert_eq!(spec.validate_fn().unwrap().call(&json!(22)), json!(true));
        assert_eq!(spec.validate_fn().unwrap().call(&json!(3)), json!(false));
    }

    #[test]
    fn test_empty_type_tuple_rejected() {
        let err = FieldSpec::builder(TypeSpec::any_of(Vec::<ValueType>::new())).build().unwrap_err();
        assert!(matches!(err, GuardError::InvalidSpecification(_)));
    }

    #[test]
    fn test_predicate_without_choices_rejected_by_default() {
        let err = FieldSpec::builder(ValueType::Int)
            .predicate(Predicate::from_bool(|_| true))
            .build()
            .unwrap_err();
        assert!(matches!(err, GuardError::InvalidSpecification(_)));
        assert!(err.to_string().contains("choices"));
    }

    #[test]
    fn test_predicate_only_allowed_when_coupling_disabled() {
        let config = GuardConfig::predicate_only();
        let spec = FieldSpec::builder(ValueType::Int)
            .predicate(Predicate::from_bool(|v| v.as_i64() == Some(1)))
            .build_with(&config)
            .unwrap();
        assert!(spec.choices().is_none());
        assert!(spec.validate_fn().is_some());
    }

    #[test]
    fn test_empty_choices_are_legal() {
        let spec = FieldSpec::builder(ValueType::String)
            .choices(Vec::<Value>::new())
            .build()
            .unwrap();
        assert_eq!(spec.choices().map(<[Value]>::len), Some(0));
    }

    #[test]
    fn test_from_bool_wraps_result() {
        let p = Predicate::from_bool(|v| v.is_string());
        assert_eq!(p.call(&json!("a")), json!(true));
        assert_eq!(p.call(&json!(1)), json!(false));
        assert_eq!(format!("{:?}", p), "Predicate(..)");
    }

    #[test]
    fn test_rejected_spec_emits_event() {
        let events = capture_events(|| {
            let result = FieldSpec::builder(ValueType::Int)
                .validate_fn(|_| json!(true))
                .build();
            assert!(result.is_err());
        });

        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], "SPEC_REJECTED");
        assert_eq!(events[0]["severity"], "WARN");
        assert!(events[0]["reason"].as_str().unwrap().contains("choices"));
    }
}
