//! Diagnostic records for the Vela semantic core.
//!
//! The core exposes exactly what downstream reporting needs: a list of
//! `(span, severity, numeric code, message)` records with optional
//! secondary labels. Rendering (terminal, IDE) is out of scope here.

mod error_code;

pub use error_code::ErrorCode;

use std::fmt;

use vela_ir::Span;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A secondary label pointing at related source.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    /// Create a new label.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Label {
            span,
            message: message.into(),
        }
    }
}

/// One diagnostic record.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    /// Primary location.
    pub span: Span,
    pub severity: Severity,
    pub code: ErrorCode,
    pub message: String,
    /// Related locations (e.g. the parameter a bad argument binds to).
    pub labels: Vec<Label>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(span: Span, code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            span,
            severity: Severity::Error,
            code,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(span: Span, code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            span,
            severity: Severity::Warning,
            code,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    /// Attach a secondary label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// True when this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] at {}: {}",
            self.severity, self.code, self.span, self.message
        )
    }
}
