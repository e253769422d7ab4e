//! fieldguard - schema-enforced attribute objects
//!
//! A [`GuardedObject`] is an attribute bag whose every write, delete and
//! read is checked against a [`Schema`] declared once per object variant.
//! Fields declare a type (or tuple of types) and, through a [`FieldSpec`],
//! requiredness, immutability, a closed set of choices and a predicate.
//!
//! ```
//! use fieldguard::{FieldSpec, GuardError, Schema, SchemaRegistry, ValueType};
//! use serde_json::json;
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         Schema::builder("person")
//!             .field(
//!                 "age",
//!                 FieldSpec::builder(ValueType::Int)
//!                     .required(true)
//!                     .immutable(true)
//!                     .build()?,
//!             )
//!             .build()?,
//!     )?;
//!
//! let mut person = registry.instantiate("person", [("age", json!(30))])?;
//! assert_eq!(person.get("age")?, Some(&json!(30)));
//! assert_eq!(
//!     person.set("age", 31),
//!     Err(GuardError::ImmutableViolation("age".into()))
//! );
//! # Ok::<(), GuardError>(())
//! ```

pub mod config;
pub mod object;
pub mod observability;
pub mod schema;

pub use config::GuardConfig;
pub use object::GuardedObject;
pub use schema::{
    Constraint, FieldDecl, FieldSpec, FieldSpecBuilder, FieldState, FieldValidator, GuardError,
    GuardResult, Predicate, Schema, SchemaBuilder, SchemaRegistry, TypeSpec, ValueType,
};
