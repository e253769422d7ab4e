//! Schema subsystem for fieldguard
//!
//! Schemas are declared once per object variant and enforced on every write.
//!
//! # Design Principles
//!
//! - Every field is declared; undeclared names are rejected on read, write and delete
//! - Field specifications are validated at declaration, never at first use
//! - Checks run before the value is stored; a failed write changes nothing
//! - No coercion: membership in the declared type is exact
//! - Schemas are immutable and shared by all instances of their variant

mod errors;
mod field_spec;
mod registry;
mod types;
mod validator;

pub use errors::{GuardError, GuardResult};
pub use field_spec::{FieldSpec, FieldSpecBuilder, Predicate};
pub use registry::SchemaRegistry;
pub use types::{Constraint, FieldDecl, FieldState, Schema, SchemaBuilder, TypeSpec, ValueType};
pub use validator::FieldValidator;
