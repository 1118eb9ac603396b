// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Recursive-descent parser with Pratt expressions and error recovery.
//!
//! The parser consumes the scanner's token stream (whitespace dropped,
//! comments kept) and always produces a [`Contract`]: malformed regions
//! become [`ContractItem::Bad`] / [`Expr::Bad`] placeholders and parsing
//! resumes at the next synchronization point. It never panics and never
//! aborts on the first error.

mod expr;
mod item;
mod stmt;

#[cfg(test)]
mod tests;

use crate::ast::*;
use crate::scanner;
use kanso_core::{Diagnostic, DiagnosticSink, Position, Span, Token, TokenKind};

/// Scans and parses `source` in one call.
pub fn parse(file: &str, source: &str, sink: &mut DiagnosticSink) -> Contract {
    let tokens = scanner::scan(file, source, sink);
    Parser::new(file, tokens, sink).parse_contract()
}

/// Token-stream parser for one source file.
pub struct Parser<'src, 'sink> {
    file: &'src str,
    /// All tokens except whitespace; always ends with `Eof`.
    tokens: Vec<Token<'src>>,
    index: usize,
    /// End of the most recently consumed token; used to close node spans.
    prev_end: Position,
    sink: &'sink mut DiagnosticSink,
    /// Cleared while parsing an `if` condition, where `{` must open the
    /// body rather than a struct literal.
    struct_literals_allowed: bool,
}

impl<'src, 'sink> Parser<'src, 'sink> {
    pub fn new(
        file: &'src str,
        tokens: Vec<Token<'src>>,
        sink: &'sink mut DiagnosticSink,
    ) -> Self {
        let tokens: Vec<Token<'src>> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .collect();
        debug_assert!(matches!(
            tokens.last(),
            Some(Token {
                kind: TokenKind::Eof,
                ..
            })
        ));
        Self {
            file,
            tokens,
            index: 0,
            prev_end: Position::start(),
            sink,
            struct_literals_allowed: true,
        }
    }

    // === Cursor =========================================================

    /// Index of the `n`th upcoming non-comment token.
    fn significant_index(&self, n: usize) -> usize {
        let mut seen = 0;
        let mut i = self.index;
        loop {
            let token = &self.tokens[i.min(self.tokens.len() - 1)];
            if !token.kind.is_comment() {
                if seen == n {
                    return i.min(self.tokens.len() - 1);
                }
                seen += 1;
            }
            if token.kind == TokenKind::Eof {
                return self.tokens.len() - 1;
            }
            i += 1;
        }
    }

    /// The next non-comment token, not consumed.
    fn peek(&self) -> Token<'src> {
        self.tokens[self.significant_index(0)]
    }

    /// The `n`th upcoming non-comment token.
    fn peek_nth(&self, n: usize) -> Token<'src> {
        self.tokens[self.significant_index(n)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// The token at the raw cursor, comments included.
    fn raw_peek(&self) -> Token<'src> {
        self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    /// Consumes and returns the next non-comment token. Comments skipped
    /// this way are dropped; item and statement loops pick comments up
    /// before calling into token-consuming helpers.
    fn bump(&mut self) -> Token<'src> {
        let target = self.significant_index(0);
        let token = self.tokens[target];
        if token.kind != TokenKind::Eof {
            self.index = target + 1;
        } else {
            self.index = target;
        }
        self.prev_end = token.end();
        token
    }

    /// Consumes the raw token at the cursor (used for comment pickup).
    fn bump_raw(&mut self) -> Token<'src> {
        let token = self.raw_peek();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        self.prev_end = token.end();
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    /// Consumes `kind` or reports "expected … found …" at the next token.
    fn expect(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if let Some(token) = self.eat(kind) {
            return Some(token);
        }
        let found = self.peek();
        self.error_at(
            found.pos,
            found.len().max(1),
            format!("expected {}, found {}", kind.describe(), found.kind.describe()),
        );
        None
    }

    // === Diagnostics ====================================================

    fn error_at(&mut self, pos: Position, len: usize, message: impl Into<String>) {
        self.sink
            .push(Diagnostic::error(message, self.file, pos, len));
    }

    /// Reports a missing `;` anchored at the end of the construct that
    /// should have been terminated; parsing continues as if it were there.
    fn missing_semicolon(&mut self, after: Span) {
        self.error_at(after.end, 1, "missing semicolon");
    }

    /// Skips ahead to a statement or item boundary after an error.
    ///
    /// Consumes at least one token, then stops after a `;` or before a
    /// token that can begin an item or statement.
    fn synchronize(&mut self) {
        if matches!(self.peek_kind(), TokenKind::Eof) {
            return;
        }
        let first = self.bump();
        if first.kind == TokenKind::Semicolon {
            return;
        }
        loop {
            match self.peek_kind() {
                TokenKind::Fn
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::Return
                | TokenKind::Contract
                | TokenKind::Struct
                | TokenKind::Use
                | TokenKind::Ext
                | TokenKind::Hash
                | TokenKind::RBrace
                | TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Span from `start` to the end of the last consumed token.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.prev_end)
    }

    fn ident_of(token: Token<'src>) -> Ident {
        Ident::new(token.text, token.span())
    }

    /// Consumes an identifier or reports and returns a zero-width
    /// placeholder name at the current position.
    fn expect_ident(&mut self, what: &str) -> Ident {
        if let Some(token) = self.eat(TokenKind::Ident) {
            return Self::ident_of(token);
        }
        let found = self.peek();
        self.error_at(
            found.pos,
            found.len().max(1),
            format!("expected {what}, found {}", found.kind.describe()),
        );
        Ident::new("", Span::point(found.pos))
    }
}
