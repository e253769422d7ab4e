//! Observability subsystem for fieldguard
//!
//! Provides:
//! - Structured logging (JSON lines on stderr, silent by default)
//! - Typed events for declarations, constructions and rejected mutations
//!
//! # Principles
//!
//! 1. Observability is read-only: logging never changes an outcome
//! 2. No async or background threads
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use fieldguard::observability::{Event, Logger, Severity};
//!
//! Logger::set_threshold(Some(Severity::Info));
//! Logger::event(Event::WriteRejected, &[("field", "age")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

#[cfg(test)]
pub(crate) use logger::capture_events;
