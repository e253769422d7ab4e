//! Schema registry
//!
//! Object variants declare their schema once, through [`SchemaRegistry::register`].
//! A registered schema is shared (`Arc`) by every instance of the variant
//! and can never be replaced.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{GuardError, GuardResult};
use super::types::Schema;
use crate::object::GuardedObject;
use crate::observability::{Event, Logger};

/// In-memory registry of schemas indexed by variant name.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its variant name.
    ///
    /// Returns `SchemaImmutable` if the variant already has a schema.
    pub fn register(&mut self, schema: Schema) -> GuardResult<Arc<Schema>> {
        let variant = schema.variant().to_string();
        if self.schemas.contains_key(&variant) {
            return Err(GuardError::SchemaImmutable(variant));
        }

        let schema = Arc::new(schema);
        Logger::event(
            Event::SchemaRegistered,
            &[
                ("fields", schema.len().to_string().as_str()),
                ("variant", variant.as_str()),
            ],
        );
        self.schemas.insert(variant, Arc::clone(&schema));
        Ok(schema)
    }

    /// Gets the schema of a variant
    pub fn get(&self, variant: &str) -> Option<Arc<Schema>> {
        self.schemas.get(variant).cloned()
    }

    /// Gets the schema of a variant, failing with `SchemaMissing` if none is declared
    pub fn resolve(&self, variant: &str) -> GuardResult<Arc<Schema>> {
        self.get(variant)
            .ok_or_else(|| GuardError::SchemaMissing(variant.to_string()))
    }

    pub fn contains(&self, variant: &str) -> bool {
        self.schemas.contains_key(variant)
    }

    /// Returns all registered variant names, sorted
    pub fn variants(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Constructs a guarded object of the given variant
    pub fn instantiate<I, K>(&self, variant: &str, props: I) -> GuardResult<GuardedObject>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let schema = self.resolve(variant)?;
        GuardedObject::new(schema, props)
    }
}
