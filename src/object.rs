//! Guarded objects
//!
//! A `GuardedObject` is an attribute bag bound to a schema. Every
//! construction, write and delete goes through the schema's
//! [`FieldValidator`]; reads of undeclared fields are rejected too.
//!
//! Per-field state:
//!
//! ```text
//! UNSET ──write──▶ SET-EXPLICIT
//! SET-FROM-DEFAULT ──write (once, even if immutable)──▶ SET-EXPLICIT
//! ```
//!
//! `SET-EXPLICIT` is terminal for immutable fields. Mutable fields go back
//! to `UNSET` (or `SET-FROM-DEFAULT` when the schema declares a default)
//! on delete.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::observability::{Event, Logger};
use crate::schema::{
    FieldDecl, FieldState, FieldValidator, GuardError, GuardResult, Schema, ValueType,
};

/// An attribute bag whose every mutation is checked against a schema.
#[derive(Debug, Clone)]
pub struct GuardedObject {
    schema: Arc<Schema>,
    values: HashMap<String, Value>,
}

impl GuardedObject {
    /// Constructs an object from initial field values.
    ///
    /// Each value is written through the normal write path, in the order
    /// supplied; the first failing write aborts construction. Afterwards
    /// every required field must resolve to a value, and all unmet
    /// required fields are reported together.
    pub fn new<I, K>(schema: Arc<Schema>, props: I) -> GuardResult<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut object = Self {
            schema,
            values: HashMap::new(),
        };

        for (key, value) in props {
            if let Err(err) = object.apply_write(key.as_ref(), value) {
                object.log_rejected_construction(&err);
                return Err(err);
            }
        }

        let missing = FieldValidator::new(&object.schema)
            .missing_required(|decl| object.resolve(decl).is_some());
        if !missing.is_empty() {
            let err = GuardError::MissingRequired(missing);
            object.log_rejected_construction(&err);
            return Err(err);
        }

        Logger::event(
            Event::ObjectConstructed,
            &[
                ("fields", object.values.len().to_string().as_str()),
                ("variant", object.schema.variant()),
            ],
        );
        Ok(object)
    }

    /// Constructs an object from a JSON object of initial values
    pub fn from_value(schema: Arc<Schema>, value: Value) -> GuardResult<Self> {
        match value {
            Value::Object(props) => Self::new(schema, props),
            other => Err(GuardError::TypeMismatch {
                field: "$root".to_string(),
                expected: "of type object".to_string(),
                actual: ValueType::of(&other).to_string(),
                value: other.to_string(),
            }),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Writes `value` into `field` after enforcing the field's contract.
    ///
    /// On failure the object is left exactly as it was.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> GuardResult<()> {
        let result = self.apply_write(field, value.into());
        if let Err(err) = &result {
            self.log_rejected(Event::WriteRejected, field, err);
        }
        result
    }

    /// Serializes `value` and writes it through [`GuardedObject::set`]
    pub fn set_as<T: Serialize + ?Sized>(&mut self, field: &str, value: &T) -> GuardResult<()> {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                let err = GuardError::UnserializableValue {
                    field: field.to_string(),
                    reason: e.to_string(),
                };
                self.log_rejected(Event::WriteRejected, field, &err);
                return Err(err);
            }
        };
        self.set(field, value)
    }

    /// Returns the field's current value, or `None` if it is unset.
    ///
    /// # Errors
    ///
    /// `UnknownField` if the field is not declared.
    pub fn get(&self, field: &str) -> GuardResult<Option<&Value>> {
        let decl = self.schema.require_field(field)?;
        Ok(self.resolve(decl))
    }

    /// Reads a field and deserializes it into `T`
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> GuardResult<Option<T>> {
        let Some(value) = self.get(field)? else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|_| GuardError::TypeMismatch {
                field: field.to_string(),
                expected: std::any::type_name::<T>().to_string(),
                actual: ValueType::of(value).to_string(),
                value: value.to_string(),
            })
    }

    /// Deletes the explicitly assigned value of a field and returns it.
    ///
    /// Returns `Ok(None)` if nothing was explicitly assigned. A field with a
    /// schema default reads the default again afterwards.
    ///
    /// # Errors
    ///
    /// - `UnknownField` if the field is not declared
    /// - `ImmutableViolation` if the field is immutable
    pub fn remove(&mut self, field: &str) -> GuardResult<Option<Value>> {
        match FieldValidator::new(&self.schema).validate_delete(field) {
            Ok(decl) => Ok(self.values.remove(decl.name())),
            Err(err) => {
                self.log_rejected(Event::DeleteRejected, field, &err);
                Err(err)
            }
        }
    }

    /// Returns where the field's current value comes from
    pub fn state(&self, field: &str) -> GuardResult<FieldState> {
        let decl = self.schema.require_field(field)?;
        Ok(self.state_of(decl))
    }

    /// Returns true if the field is declared and currently holds a value
    pub fn contains(&self, field: &str) -> bool {
        self.schema
            .field(field)
            .map_or(false, |decl| self.resolve(decl).is_some())
    }

    /// Returns every field currently holding a value, in schema order.
    ///
    /// Unset fields are omitted rather than reported as null.
    pub fn attributes(&self) -> Map<String, Value> {
        self.schema
            .fields()
            .filter_map(|decl| {
                self.resolve(decl)
                    .map(|value| (decl.name().to_string(), value.clone()))
            })
            .collect()
    }

    /// The single mutation point: validate, then store.
    fn apply_write(&mut self, field: &str, value: Value) -> GuardResult<()> {
        let state = self.state(field)?;
        let decl = FieldValidator::new(&self.schema).validate_write(field, &value, state)?;
        let name = decl.name().to_string();
        self.values.insert(name, value);
        Ok(())
    }

    fn resolve<'a>(&'a self, decl: &'a FieldDecl) -> Option<&'a Value> {
        self.values.get(decl.name()).or(decl.default())
    }

    fn state_of(&self, decl: &FieldDecl) -> FieldState {
        if self.values.contains_key(decl.name()) {
            FieldState::Explicit
        } else if decl.has_default() {
            FieldState::FromDefault
        } else {
            FieldState::Unset
        }
    }

    fn log_rejected(&self, event: Event, field: &str, err: &GuardError) {
        Logger::event(
            event,
            &[
                ("code", err.code()),
                ("field", field),
                ("variant", self.schema.variant()),
            ],
        );
    }

    fn log_rejected_construction(&self, err: &GuardError) {
        Logger::event(
            Event::ConstructionRejected,
            &[
                ("code", err.code()),
                ("reason", err.to_string().as_str()),
                ("variant", self.schema.variant()),
            ],
        );
    }
}
