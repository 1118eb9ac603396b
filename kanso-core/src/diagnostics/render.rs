// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Caret-style plain-text rendering.
//!
//! Output shape, stable for golden tests:
//!
//! ```text
//! error[E0001]: undefined variable `amout`
//!  --> token.ks:7:9
//!   |
//! 6 |     let amount = 1;
//! 7 |     let x = amout;
//!   |             ^^^^^
//! 8 |     x
//!   = suggestion 1: did you mean `amount`?
//!   = note: variables must be declared before use
//!   = help: check the spelling
//! ```
//!
//! Color is deliberately absent here; a terminal wrapper may re-style the
//! rendered lines, and everything degrades to plain text.

use super::Diagnostic;

/// Renders `diag` against the source text of its file.
pub fn render(diag: &Diagnostic, source: &str) -> String {
    let mut out = String::new();

    match diag.code {
        Some(code) => out.push_str(&format!("{}[{}]: {}\n", diag.severity, code, diag.message)),
        None => out.push_str(&format!("{}: {}\n", diag.severity, diag.message)),
    }
    out.push_str(&format!(
        " --> {}:{}:{}\n",
        diag.file, diag.position.line, diag.position.column
    ));

    let lines: Vec<&str> = source.lines().collect();
    let line_idx = diag.position.line as usize;
    let gutter = digits(line_idx + 1);

    out.push_str(&format!("{} |\n", " ".repeat(gutter)));
    if line_idx >= 2 {
        if let Some(prev) = lines.get(line_idx - 2) {
            out.push_str(&format!("{:>gutter$} | {}\n", line_idx - 1, prev));
        }
    }
    if let Some(line) = lines.get(line_idx - 1) {
        out.push_str(&format!("{:>gutter$} | {}\n", line_idx, line));
        let pad = diag.position.column.saturating_sub(1) as usize;
        let width = diag.length.max(1);
        out.push_str(&format!(
            "{} | {}{}\n",
            " ".repeat(gutter),
            " ".repeat(pad),
            "^".repeat(width)
        ));
    }
    if let Some(next) = lines.get(line_idx) {
        out.push_str(&format!("{:>gutter$} | {}\n", line_idx + 1, next));
    }

    for (i, suggestion) in diag.suggestions.iter().enumerate() {
        out.push_str(&format!(
            "{} = suggestion {}: {}\n",
            " ".repeat(gutter),
            i + 1,
            suggestion.message
        ));
    }
    for note in &diag.notes {
        out.push_str(&format!("{} = note: {}\n", " ".repeat(gutter), note));
    }
    if let Some(help) = &diag.help {
        out.push_str(&format!("{} = help: {}\n", " ".repeat(gutter), help));
    }

    out
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{codes, Severity, Suggestion};
    use crate::position::Position;
    use pretty_assertions::assert_eq;

    fn source() -> &'static str {
        "contract T {\n    fn f() {\n        let x = amout;\n    }\n}\n"
    }

    #[test]
    fn renders_header_anchor_and_caret() {
        let diag = Diagnostic::error(
            "undefined variable `amout`",
            "token.ks",
            Position::new(3, 17, 0),
            5,
        )
        .with_code(codes::UNDEFINED_VARIABLE);

        let text = render(&diag, source());
        let expected = "\
error[E0001]: undefined variable `amout`
 --> token.ks:3:17
  |
2 |     fn f() {
3 |         let x = amout;
  |                 ^^^^^
4 |     }
";
        assert_eq!(text, expected);
    }

    #[test]
    fn renders_suggestions_notes_and_help() {
        let diag = Diagnostic::new(
            Severity::Warning,
            "unused variable `x`",
            "token.ks",
            Position::new(3, 13, 0),
            1,
        )
        .with_code(codes::UNUSED_VARIABLE)
        .with_suggestion(Suggestion::new(
            "prefix it with an underscore: `_x`",
            Position::new(3, 13, 0),
            1,
        ))
        .with_note("assigned but never read")
        .with_help("remove the binding if it is not needed");

        let text = render(&diag, source());
        assert!(text.starts_with("warning[W0001]: unused variable `x`\n"));
        assert!(text.contains(" = suggestion 1: prefix it with an underscore: `_x`\n"));
        assert!(text.contains(" = note: assigned but never read\n"));
        assert!(text.contains(" = help: remove the binding if it is not needed\n"));
    }

    #[test]
    fn caret_width_is_at_least_one() {
        let diag = Diagnostic::error("missing semicolon", "t.ks", Position::new(1, 9, 0), 0);
        let text = render(&diag, "let x = 1\n");
        assert!(text.contains("  |         ^\n"));
    }
}
