//! Observable events
//!
//! Events are explicit and typed; the logger only ever receives the
//! string form produced here.

use std::fmt;

use super::logger::Severity;

/// Observable events in fieldguard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A schema was registered for a variant
    SchemaRegistered,
    /// A field specification or schema declaration was rejected
    SpecRejected,
    /// A guarded object finished construction
    ObjectConstructed,
    /// Construction of a guarded object failed
    ConstructionRejected,
    /// A write was rejected
    WriteRejected,
    /// A delete was rejected
    DeleteRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SpecRejected => "SPEC_REJECTED",
            Event::ObjectConstructed => "OBJECT_CONSTRUCTED",
            Event::ConstructionRejected => "CONSTRUCTION_REJECTED",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::DeleteRejected => "DELETE_REJECTED",
        }
    }

    /// Returns the severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ObjectConstructed => Severity::Trace,
            Event::SpecRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
