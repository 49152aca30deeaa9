//! Structured configuration issues.
//!
//! Validation never panics or stops at the first problem: it returns every
//! issue found, each with a severity so callers can decide what is fatal.

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// Two `[[specialists]]` entries share an id.
    DuplicateSpecialist,
    /// The triage specialist is not in the table.
    UnknownTriageSpecialist,
    /// A default specialist is not in the table.
    UnknownDefaultSpecialist,
    /// No default specialists configured; routing could select nobody.
    EmptyDefaults,
    /// A rule pattern does not compile.
    InvalidPattern,
    /// A specialist kind is missing its settings (rules or endpoint).
    IncompleteSpecialist,
    /// A threshold lies outside 0..1.
    ThresholdOutOfRange,
    /// A deadline is zero or shorter than a nested deadline.
    InvalidDeadline,
    /// A question or referral names a specialist that is not registered.
    UnknownReference,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: IssueSeverity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}
