//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, no buffering, written to stderr
//! - Silent until a threshold is set; events below it are dropped

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use super::events::Event;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-object detail
    Trace = 0,
    /// Normal operations, including rejected writes
    Info = 1,
    /// Rejected declarations
    Warn = 2,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
        }
    }

    fn from_u8(level: u8) -> Option<Severity> {
        match level {
            0 => Some(Severity::Trace),
            1 => Some(Severity::Info),
            2 => Some(Severity::Warn),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const SILENT: u8 = u8::MAX;

static THRESHOLD: AtomicU8 = AtomicU8::new(SILENT);

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Sets the minimum severity that gets written; `None` silences the logger
    pub fn set_threshold(threshold: Option<Severity>) {
        let level = threshold.map_or(SILENT, |severity| severity as u8);
        THRESHOLD.store(level, Ordering::Relaxed);
    }

    pub fn threshold() -> Option<Severity> {
        Severity::from_u8(THRESHOLD.load(Ordering::Relaxed))
    }

    pub fn enabled(severity: Severity) -> bool {
        Self::threshold().map_or(false, |threshold| severity >= threshold)
    }

    /// Logs a typed event at its own severity
    pub fn event(event: Event, fields: &[(&str, &str)]) {
        Self::log(event.severity(), event.as_str(), fields);
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if capture::record(severity, event, fields) {
            return;
        }
        if !Self::enabled(severity) {
            return;
        }
        Self::log_to_writer(severity, event, fields, &mut io::stderr());
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut output = String::with_capacity(256);

        output.push_str("{\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push_str("\",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push_str("}\n");

        // Logging never fails the caller.
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }
}

/// Capture logs to a buffer for testing
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

/// Runs `f` and returns every event it logged on this thread, parsed.
///
/// Captured events bypass the threshold and are not written to stderr.
#[cfg(test)]
pub(crate) fn capture_events<F: FnOnce()>(f: F) -> Vec<serde_json::Value> {
    capture::BUFFER.with(|buffer| *buffer.borrow_mut() = Some(Vec::new()));
    f();
    let bytes = capture::BUFFER
        .with(|buffer| buffer.borrow_mut().take())
        .unwrap_or_default();
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[cfg(test)]
mod capture {
    use super::{Logger, Severity};
    use std::cell::RefCell;

    thread_local! {
        pub(super) static BUFFER: RefCell<Option<Vec<u8>>> = RefCell::new(None);
    }

    pub(super) fn record(severity: Severity, event: &str, fields: &[(&str, &str)]) -> bool {
        BUFFER.with(|buffer| match buffer.borrow_mut().as_mut() {
            Some(out) => {
                Logger::log_to_writer(severity, event, fields, out);
                true
            }
            None => false,
        })
    }
}

#[cfg(not(test))]
mod capture {
    use super::Severity;

    #[inline]
    pub(super) fn record(_: Severity, _: &str, _: &[(&str, &str)]) -> bool {
        false
    }
}
