//! Guard configuration
//!
//! Declaration-time policy for field specifications and schemas, plus the
//! log threshold. Objects never consult configuration after construction.

use crate::observability::{Logger, Severity};

/// Configuration for spec/schema declaration and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Reject a `validate_fn` declared without `choices`.
    pub predicate_requires_choices: bool,
    /// Check schema defaults against their own field constraint.
    pub validate_defaults: bool,
    /// Events below this severity are not written; `None` writes nothing.
    pub log_threshold: Option<Severity>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            predicate_requires_choices: true,
            validate_defaults: true,
            log_threshold: None,
        }
    }
}

impl GuardConfig {
    /// Config that allows predicate-only fields.
    pub fn predicate_only() -> Self {
        Self {
            predicate_requires_choices: false,
            ..Self::default()
        }
    }

    /// Applies the log threshold process-wide.
    pub fn install(&self) {
        Logger::set_threshold(self.log_threshold);
    }
}
