// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Structured compiler diagnostics.
//!
//! A [`Diagnostic`] carries data only; the caret renderer in [`render`]
//! turns one into plain text, and the serde derives make a JSON emitter a
//! one-liner for embedders. Phases push into a shared [`DiagnosticSink`]
//! and never abort on the first problem.

mod render;
mod suggest;

pub use render::render;
pub use suggest::{closest_match, levenshtein, suggest_candidates};

use crate::position::Position;
use serde::Serialize;
use std::fmt;

/// Stable diagnostic codes.
///
/// Codes are part of the external contract: tooling matches on them, so a
/// code is never renumbered or reused. Ranges by category: `E00xx` for
/// name/type/contract errors, `E06xx` for flow errors, `W00xx` warnings.
pub mod codes {
    /// Undefined variable.
    pub const UNDEFINED_VARIABLE: &str = "E0001";
    /// Undefined function.
    pub const UNDEFINED_FUNCTION: &str = "E0002";
    /// Type mismatch.
    pub const TYPE_MISMATCH: &str = "E0003";
    /// Invalid return type.
    pub const INVALID_RETURN_TYPE: &str = "E0004";
    /// Field not found on the target type.
    pub const FIELD_NOT_FOUND: &str = "E0005";
    /// Field supplied more than once in a struct literal.
    pub const DUPLICATE_FIELD: &str = "E0006";
    /// Field missing from a struct literal.
    pub const MISSING_FIELD: &str = "E0007";
    /// Invalid binary operation.
    pub const INVALID_BINARY_OP: &str = "E0008";
    /// Duplicate declaration in one scope.
    pub const DUPLICATE_DECLARATION: &str = "E0009";
    /// Unknown item attribute.
    pub const INVALID_ATTRIBUTE: &str = "E0010";
    /// Invalid `reads`/`writes` clause.
    pub const INVALID_READS_WRITES: &str = "E0011";
    /// Malformed `#[create]` constructor.
    pub const INVALID_CONSTRUCTOR: &str = "E0012";
    /// Wrong number or shape of call arguments.
    pub const INVALID_ARGUMENTS: &str = "E0013";
    /// Assignment to a non-assignable target.
    pub const INVALID_ASSIGNMENT: &str = "E0014";
    /// Read of a variable that may be uninitialized.
    pub const UNINITIALIZED_VARIABLE: &str = "E0017";
    /// Storage access not covered by the caller's `reads`/`writes`.
    pub const UNDECLARED_STORAGE_ACCESS: &str = "E0019";
    /// Void expression used where a value is required.
    pub const VOID_IN_EXPRESSION: &str = "E0020";
    /// Unknown module in a `use` declaration.
    pub const UNDEFINED_MODULE: &str = "E0021";
    /// Function with a return type does not return on every path.
    pub const MISSING_RETURN: &str = "E0600";
    /// Unreachable code (error form).
    pub const UNREACHABLE_CODE: &str = "E0601";
    /// Unused variable.
    pub const UNUSED_VARIABLE: &str = "W0001";
    /// Unreachable code (warning form).
    pub const UNREACHABLE_CODE_WARNING: &str = "W0002";
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
        })
    }
}

/// A proposed fix attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub message: String,
    /// Replacement text for the target span, when the fix is mechanical.
    pub replacement: Option<String>,
    pub position: Position,
    pub length: usize,
}

impl Suggestion {
    pub fn new(message: impl Into<String>, position: Position, length: usize) -> Self {
        Self {
            message: message.into(),
            replacement: None,
            position,
            length,
        }
    }

    pub fn replacing(mut self, text: impl Into<String>) -> Self {
        self.replacement = Some(text.into());
        self
    }
}

/// One reported problem, warning or remark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub file: String,
    pub position: Position,
    /// Width of the `^^^` underline in bytes; rendered as at least 1.
    pub length: usize,
    pub suggestions: Vec<Suggestion>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        position: Position,
        length: usize,
    ) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            file: file.into(),
            position,
            length,
            suggestions: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(
        message: impl Into<String>,
        file: impl Into<String>,
        position: Position,
        length: usize,
    ) -> Self {
        Self::new(Severity::Error, message, file, position, length)
    }

    pub fn warning(
        message: impl Into<String>,
        file: impl Into<String>,
        position: Position,
        length: usize,
    ) -> Self {
        Self::new(Severity::Warning, message, file, position, length)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Plain-text caret rendering against the file's source text.
    pub fn render(&self, source: &str) -> String {
        render(self, source)
    }
}

/// Ordered collector shared by every compiler phase.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diags: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.diags.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diags.iter().filter(|d| d.is_error()).count()
    }

    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diags
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sink_tracks_error_presence() {
        let mut sink = DiagnosticSink::new();
        assert!(!sink.has_errors());

        sink.push(Diagnostic::warning(
            "unused variable `x`",
            "a.ks",
            Position::start(),
            1,
        ));
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);

        sink.push(
            Diagnostic::error("type mismatch", "a.ks", Position::start(), 3)
                .with_code(codes::TYPE_MISMATCH),
        );
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn diagnostics_serialize_to_json() {
        let diag = Diagnostic::error("undefined variable `y`", "a.ks", Position::new(2, 5, 10), 1)
            .with_code(codes::UNDEFINED_VARIABLE)
            .with_help("declare the variable before use");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "E0001");
        assert_eq!(json["position"]["line"], 2);
    }
}
