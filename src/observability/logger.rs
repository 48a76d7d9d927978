//! Structured JSON logger
//!
//! Per OBSERVABILITY.md:
//! - One log line = one event
//! - Synchronous writes, no buffering
//! - Deterministic key ordering: `event`, then `severity`, then the
//!   remaining fields sorted by key
//!
//! Errors go to stderr, everything else to stdout.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels.
///
/// There is no FATAL: this library never terminates the process, so
/// the worst it reports is an operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Diagnostic detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous structured logger.
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::render(severity, event, fields);
        if severity >= Severity::Error {
            let mut err = io::stderr();
            let _ = err.write_all(line.as_bytes());
            let _ = err.flush();
        } else {
            let mut out = io::stdout();
            let _ = out.write_all(line.as_bytes());
            let _ = out.flush();
        }
    }

    /// Render one JSON line with deterministic key ordering.
    ///
    /// String escaping is delegated to serde_json so the output is
    /// always valid JSON regardless of field contents.
    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);

        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":");
        line.push_str(&json_str(event));
        line.push_str(",\"severity\":");
        line.push_str(&json_str(severity.as_str()));
        for (key, value) in sorted {
            line.push(',');
            line.push_str(&json_str(key));
            line.push(':');
            line.push_str(&json_str(value));
        }
        line.push_str("}\n");
        line
    }

    /// Log at TRACE level.
    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    /// Log at INFO level.
    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level.
    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level.
    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }
}

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_valid_json() {
        let line = Logger::render(Severity::Info, "TRANSITION_STARTED", &[("tablet_type", "PRIMARY")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "TRANSITION_STARTED");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["tablet_type"], "PRIMARY");
    }

    #[test]
    fn test_field_order_is_deterministic() {
        let a = Logger::render(Severity::Info, "E", &[("zeta", "1"), ("alpha", "2")]);
        let b = Logger::render(Severity::Info, "E", &[("alpha", "2"), ("zeta", "1")]);
        assert_eq!(a, b);
        assert!(a.find("alpha").unwrap() < a.find("zeta").unwrap());
    }

    #[test]
    fn test_event_comes_first() {
        let line = Logger::render(Severity::Warn, "DRAIN_TIMED_OUT", &[("active", "3")]);
        assert!(line.starts_with("{\"event\":\"DRAIN_TIMED_OUT\""));
    }

    #[test]
    fn test_one_line_per_event() {
        let line = Logger::render(Severity::Error, "E", &[("detail", "line1\nline2")]);
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["detail"], "line1\nline2");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let line = Logger::render(Severity::Info, "E", &[("msg", "say \"hi\"")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["msg"], "say \"hi\"");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::Trace.as_str(), "TRACE");
        assert_eq!(Severity::Info.as_str(), "INFO");
        assert_eq!(Severity::Warn.as_str(), "WARN");
        assert_eq!(Severity::Error.as_str(), "ERROR");
    }
}
