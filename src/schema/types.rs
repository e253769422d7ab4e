//! Schema type definitions
//!
//! Supported value types:
//! - null: JSON null
//! - bool: Boolean
//! - int: integral number (i64 or u64)
//! - float: non-integral number (f64)
//! - string: UTF-8 string
//! - array: ordered sequence of values
//! - object: string-keyed map of values
//!
//! Membership is exact: `int` never accepts `1.5` and `float` never
//! accepts `1`. Fields accepting both declare the tuple `(int, float)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::errors::{GuardError, GuardResult};
use super::field_spec::FieldSpec;
use super::validator;
use crate::config::GuardConfig;
use crate::observability::{Event, Logger};

/// A single type a value can be a member of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl ValueType {
    /// Returns the type of the given value
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    ValueType::Int
                } else {
                    ValueType::Float
                }
            }
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }

    /// Returns true if `value` is a member of this type
    pub fn matches(&self, value: &Value) -> bool {
        ValueType::of(value) == *self
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A type or a tuple of types, used as a membership target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    One(ValueType),
    AnyOf(Vec<ValueType>),
}

impl TypeSpec {
    /// Builds a tuple of types; a value matches if it is a member of any.
    pub fn any_of(types: impl IntoIterator<Item = ValueType>) -> Self {
        TypeSpec::AnyOf(types.into_iter().collect())
    }

    /// Returns the member types in declaration order
    pub fn members(&self) -> &[ValueType] {
        match self {
            TypeSpec::One(t) => std::slice::from_ref(t),
            TypeSpec::AnyOf(types) => types,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        self.members().iter().any(|t| t.matches(value))
    }

    /// Rejects a tuple with no members, which no value could ever satisfy
    pub(crate) fn ensure_usable(&self) -> GuardResult<()> {
        if self.members().is_empty() {
            return Err(GuardError::invalid_spec(
                "\"typeof\" must be a type or a non-empty tuple of types, but an empty tuple was provided",
            ));
        }
        Ok(())
    }

    /// Describes the expectation, e.g. `of type int` or `one of (int, float)`
    pub fn describe(&self) -> String {
        match self {
            TypeSpec::One(t) => format!("of type {}", t),
            TypeSpec::AnyOf(types) => {
                let names: Vec<&str> = types.iter().map(|t| t.type_name()).collect();
                format!("one of ({})", names.join(", "))
            }
        }
    }
}

impl From<ValueType> for TypeSpec {
    fn from(t: ValueType) -> Self {
        TypeSpec::One(t)
    }
}

impl<const N: usize> From<[ValueType; N]> for TypeSpec {
    fn from(types: [ValueType; N]) -> Self {
        TypeSpec::any_of(types)
    }
}

/// The constraint declared for one field: a bare type or a full specification.
///
/// A bare type only checks membership; requiredness, immutability,
/// choices and predicates apply to `Spec` constraints alone.
#[derive(Debug, Clone)]
pub enum Constraint {
    Type(TypeSpec),
    Spec(FieldSpec),
}

impl Constraint {
    pub fn type_spec(&self) -> &TypeSpec {
        match self {
            Constraint::Type(t) => t,
            Constraint::Spec(spec) => spec.type_spec(),
        }
    }

    pub fn as_spec(&self) -> Option<&FieldSpec> {
        match self {
            Constraint::Spec(spec) => Some(spec),
            Constraint::Type(_) => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.as_spec().map_or(false, FieldSpec::is_required)
    }

    pub fn is_immutable(&self) -> bool {
        self.as_spec().map_or(false, FieldSpec::is_immutable)
    }
}

impl From<ValueType> for Constraint {
    fn from(t: ValueType) -> Self {
        Constraint::Type(TypeSpec::One(t))
    }
}

impl From<TypeSpec> for Constraint {
    fn from(t: TypeSpec) -> Self {
        Constraint::Type(t)
    }
}

impl<const N: usize> From<[ValueType; N]> for Constraint {
    fn from(types: [ValueType; N]) -> Self {
        Constraint::Type(TypeSpec::any_of(types))
    }
}

impl From<FieldSpec> for Constraint {
    fn from(spec: FieldSpec) -> Self {
        Constraint::Spec(spec)
    }
}

/// Where a field's current value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// No value: reads return `None`
    Unset,
    /// Reads return the schema default; one explicit write is still allowed
    FromDefault,
    /// Holds an explicitly assigned value
    Explicit,
}

/// One declared field: name, constraint and optional schema default
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    constraint: Constraint,
    default: Option<Value>,
}

impl FieldDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Returns the schema-declared default, if the field has one
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Declared field-name to constraint mapping for one object variant.
///
/// Fields keep their declaration order. A schema is immutable once built
/// and is shared by every instance of its variant.
#[derive(Debug, Clone)]
pub struct Schema {
    variant: String,
    fields: Vec<FieldDecl>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Starts declaring the schema of the named variant
    pub fn builder(variant: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            variant: variant.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the name of the variant this schema belongs to
    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a declared field or reports the legal names
    pub(crate) fn require_field(&self, name: &str) -> GuardResult<&FieldDecl> {
        self.field(name).ok_or_else(|| GuardError::UnknownField {
            field: name.to_string(),
            available: self.field_names(),
        })
    }
}

/// Builder collecting field declarations for a [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    variant: String,
    fields: Vec<FieldDecl>,
}

impl SchemaBuilder {
    /// Declares a field without a default
    pub fn field(mut self, name: impl Into<String>, constraint: impl Into<Constraint>) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            constraint: constraint.into(),
            default: None,
        });
        self
    }

    /// Declares a field whose value starts out as `default`
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        constraint: impl Into<Constraint>,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            constraint: constraint.into(),
            default: Some(default.into()),
        });
        self
    }

    pub fn build(self) -> GuardResult<Schema> {
        self.build_with(&GuardConfig::default())
    }

    /// Validates the declarations and freezes them into a schema.
    ///
    /// Rejects duplicate field names and, when `validate_defaults` is set,
    /// defaults that violate their own field's constraint.
    pub fn build_with(self, config: &GuardConfig) -> GuardResult<Schema> {
        let variant = self.variant;
        let result = freeze(&variant, self.fields, config);
        if let Err(err) = &result {
            Logger::event(
                Event::SpecRejected,
                &[("reason", err.to_string().as_str()), ("variant", variant.as_str())],
            );
        }
        result
    }
}

fn freeze(variant: &str, fields: Vec<FieldDecl>, config: &GuardConfig) -> GuardResult<Schema> {
    let mut index = HashMap::with_capacity(fields.len());

    for (i, decl) in fields.iter().enumerate() {
        if index.insert(decl.name.clone(), i).is_some() {
            return Err(GuardError::invalid_spec(format!(
                "field '{}' is declared more than once in schema '{}'",
                decl.name, variant
            )));
        }

        if decl.constraint.type_spec().members().is_empty() {
            return Err(GuardError::invalid_spec(format!(
                "field '{}' declares an empty type tuple",
                decl.name
            )));
        }

        if config.validate_defaults {
            if let Some(default) = &decl.default {
                validator::check_value(&decl.name, &decl.constraint, default).map_err(|err| {
                    GuardError::invalid_spec(format!(
                        "default for field '{}' violates its constraint: {}",
                        decl.name, err
                    ))
                })?;
            }
        }
    }

    Ok(Schema {
        variant: variant.to_string(),
        fields,
        index,
    })
}
