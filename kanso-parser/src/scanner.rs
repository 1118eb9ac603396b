// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Single-pass scanner.
//!
//! The scanner never backtracks: each byte is inspected once, operators use
//! longest-match on a bounded peek, and lexical errors produce an
//! `Illegal` token plus a diagnostic so the stream stays total. The final
//! token is always `Eof` with empty text.

use kanso_core::{Diagnostic, DiagnosticSink, Position, Token, TokenKind};

/// Streaming scanner over one source buffer.
pub struct Scanner<'src> {
    file: &'src str,
    source: &'src str,
    pos: Position,
}

/// Scans `source` to completion, reporting lexical errors into `sink`.
pub fn scan<'src>(
    file: &'src str,
    source: &'src str,
    sink: &mut DiagnosticSink,
) -> Vec<Token<'src>> {
    let mut scanner = Scanner::new(file, source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token(sink);
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

impl<'src> Scanner<'src> {
    pub fn new(file: &'src str, source: &'src str) -> Self {
        Self {
            file,
            source,
            pos: Position::start(),
        }
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos.offset as usize..]
    }

    fn peek(&self, n: usize) -> Option<u8> {
        self.rest().as_bytes().get(n).copied()
    }

    /// Emits the token holding the next `len` bytes and advances past it.
    fn take(&mut self, kind: TokenKind, len: usize) -> Token<'src> {
        let text = &self.rest()[..len];
        let token = Token::new(kind, text, self.pos);
        self.pos = self.pos.advanced(text);
        token
    }

    fn error(&self, sink: &mut DiagnosticSink, message: String, pos: Position, len: usize) {
        sink.push(Diagnostic::error(message, self.file, pos, len));
    }

    /// Scans the next token. Total: always returns a token, `Eof` at end.
    pub fn next_token(&mut self, sink: &mut DiagnosticSink) -> Token<'src> {
        let Some(first) = self.peek(0) else {
            return Token::new(TokenKind::Eof, "", self.pos);
        };

        match first {
            b' ' | b'\t' | b'\r' | b'\n' => self.whitespace(),
            b'/' => match self.peek(1) {
                Some(b'/') => self.line_comment(),
                Some(b'*') => self.block_comment(sink),
                Some(b'=') => self.take(TokenKind::SlashAssign, 2),
                _ => self.take(TokenKind::Slash, 1),
            },
            b'"' => self.string(sink),
            b'0'..=b'9' => self.number(sink),
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => self.ident(),
            _ => self.operator(sink),
        }
    }

    fn whitespace(&mut self) -> Token<'src> {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
            .count();
        self.take(TokenKind::Whitespace, len)
    }

    fn line_comment(&mut self) -> Token<'src> {
        let rest = self.rest();
        let len = rest.find('\n').unwrap_or(rest.len());
        // `///` is documentation; `//` (and `////…` separators) are plain.
        let kind = if rest.starts_with("///") && !rest.starts_with("////") {
            TokenKind::DocComment
        } else {
            TokenKind::LineComment
        };
        self.take(kind, len)
    }

    fn block_comment(&mut self, sink: &mut DiagnosticSink) -> Token<'src> {
        let rest = self.rest();
        let doc = rest.starts_with("/**") && !rest.starts_with("/**/");
        let kind = if doc {
            TokenKind::DocComment
        } else {
            TokenKind::BlockComment
        };
        match rest[2..].find("*/") {
            Some(i) => self.take(kind, 2 + i + 2),
            None => {
                self.error(
                    sink,
                    "unterminated block comment".to_string(),
                    self.pos,
                    rest.len(),
                );
                self.take(kind, rest.len())
            }
        }
    }

    fn string(&mut self, sink: &mut DiagnosticSink) -> Token<'src> {
        let rest = self.rest();
        let body = &rest[1..];
        let terminator = body.char_indices().find(|(_, c)| *c == '"' || *c == '\n');
        match terminator {
            Some((i, '"')) => self.take(TokenKind::Str, 1 + i + 1),
            Some((i, _)) => {
                self.error(sink, "unterminated string literal".to_string(), self.pos, 1 + i);
                self.take(TokenKind::Str, 1 + i)
            }
            None => {
                self.error(
                    sink,
                    "unterminated string literal".to_string(),
                    self.pos,
                    rest.len(),
                );
                self.take(TokenKind::Str, rest.len())
            }
        }
    }

    fn number(&mut self, sink: &mut DiagnosticSink) -> Token<'src> {
        let rest = self.rest();
        if rest.starts_with("0x") || rest.starts_with("0X") {
            let digits = rest[2..]
                .bytes()
                .take_while(|b| b.is_ascii_hexdigit())
                .count();
            if digits == 0 {
                self.error(
                    sink,
                    "invalid hex literal: expected at least one hex digit after `0x`".to_string(),
                    self.pos,
                    2,
                );
                return self.take(TokenKind::Illegal, 2);
            }
            return self.take(TokenKind::HexInt, 2 + digits);
        }
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        self.take(TokenKind::Int, len)
    }

    fn ident(&mut self) -> Token<'src> {
        let len = self
            .rest()
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let text = &self.rest()[..len];
        let kind = TokenKind::keyword(text).unwrap_or(TokenKind::Ident);
        self.take(kind, len)
    }

    fn operator(&mut self, sink: &mut DiagnosticSink) -> Token<'src> {
        use TokenKind::*;
        let (kind, len) = match (self.peek(0).unwrap(), self.peek(1)) {
            (b'+', Some(b'=')) => (PlusAssign, 2),
            (b'+', Some(b'+')) => (PlusPlus, 2),
            (b'+', _) => (Plus, 1),
            (b'-', Some(b'>')) => (Arrow, 2),
            (b'-', Some(b'=')) => (MinusAssign, 2),
            (b'-', Some(b'-')) => (MinusMinus, 2),
            (b'-', _) => (Minus, 1),
            (b'*', Some(b'*')) => (StarStar, 2),
            (b'*', Some(b'=')) => (StarAssign, 2),
            (b'*', _) => (Star, 1),
            (b'%', Some(b'=')) => (PercentAssign, 2),
            (b'%', _) => (Percent, 1),
            (b'=', Some(b'=')) => (Eq, 2),
            (b'=', _) => (Assign, 1),
            (b'!', Some(b'=')) => (NotEq, 2),
            (b'!', _) => (Bang, 1),
            (b'<', Some(b'=')) => (LtEq, 2),
            (b'<', _) => (Lt, 1),
            (b'>', Some(b'=')) => (GtEq, 2),
            (b'>', _) => (Gt, 1),
            (b'&', Some(b'&')) => (AndAnd, 2),
            (b'&', _) => (Amp, 1),
            (b'|', Some(b'|')) => (OrOr, 2),
            (b'|', _) => (Pipe, 1),
            (b':', Some(b':')) => (ColonColon, 2),
            (b':', _) => (Colon, 1),
            (b'(', _) => (LParen, 1),
            (b')', _) => (RParen, 1),
            (b'{', _) => (LBrace, 1),
            (b'}', _) => (RBrace, 1),
            (b'[', _) => (LBracket, 1),
            (b']', _) => (RBracket, 1),
            (b',', _) => (Comma, 1),
            (b'.', _) => (Dot, 1),
            (b';', _) => (Semicolon, 1),
            (b'#', _) => (Hash, 1),
            _ => {
                // Skip the whole UTF-8 scalar so we never split a char.
                let ch = self.rest().chars().next().unwrap();
                self.error(
                    sink,
                    format!("invalid character `{ch}`"),
                    self.pos,
                    ch.len_utf8(),
                );
                return self.take(TokenKind::Illegal, ch.len_utf8());
            }
        };
        self.take(kind, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanso_core::TokenKind::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut sink = DiagnosticSink::new();
        scan("test.ks", source, &mut sink)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_simple_contract_header() {
        assert_eq!(
            kinds("contract Token {}"),
            vec![Contract, Whitespace, Ident, Whitespace, LBrace, RBrace, Eof]
        );
    }

    #[test]
    fn longest_match_on_operator_prefixes() {
        assert_eq!(
            kinds("-> -= -- - ** *= * == = != ! <= < >= > && & || | :: : += ++ %="),
            vec![
                Arrow, Whitespace, MinusAssign, Whitespace, MinusMinus, Whitespace, Minus,
                Whitespace, StarStar, Whitespace, StarAssign, Whitespace, Star, Whitespace, Eq,
                Whitespace, Assign, Whitespace, NotEq, Whitespace, Bang, Whitespace, LtEq,
                Whitespace, Lt, Whitespace, GtEq, Whitespace, Gt, Whitespace, AndAnd, Whitespace,
                Amp, Whitespace, OrOr, Whitespace, Pipe, Whitespace, ColonColon, Whitespace,
                Colon, Whitespace, PlusAssign, Whitespace, PlusPlus, Whitespace, PercentAssign,
                Eof
            ]
        );
    }

    #[test]
    fn classifies_comment_kinds() {
        assert_eq!(kinds("// a"), vec![LineComment, Eof]);
        assert_eq!(kinds("/// doc"), vec![DocComment, Eof]);
        assert_eq!(kinds("/* a */"), vec![BlockComment, Eof]);
        assert_eq!(kinds("/** doc */"), vec![DocComment, Eof]);
        assert_eq!(kinds("/**/"), vec![BlockComment, Eof]);
    }

    #[test]
    fn every_byte_is_covered_by_exactly_one_token() {
        let source = "contract C {\n  /* x */ fn f() -> U256 { 0x1f + 2 }\n}\n\"str\" @";
        let mut sink = DiagnosticSink::new();
        let tokens = scan("t.ks", source, &mut sink);

        let mut offset = 0u32;
        for token in &tokens {
            assert_eq!(token.pos.offset, offset, "gap before {:?}", token);
            assert_eq!(token.span().text(source), token.text);
            offset += token.text.len() as u32;
        }
        assert_eq!(offset as usize, source.len());
        assert_eq!(tokens.last().unwrap().kind, Eof);
    }

    #[test]
    fn hex_literal_requires_digits() {
        let mut sink = DiagnosticSink::new();
        let tokens = scan("t.ks", "0x 0xAB", &mut sink);
        assert_eq!(tokens[0].kind, Illegal);
        assert_eq!(tokens[2].kind, HexInt);
        assert_eq!(tokens[2].text, "0xAB");
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn unterminated_string_spans_to_line_end() {
        let mut sink = DiagnosticSink::new();
        let tokens = scan("t.ks", "\"abc\nlet", &mut sink);
        assert_eq!(tokens[0].kind, Str);
        assert_eq!(tokens[0].text, "\"abc");
        assert_eq!(sink.error_count(), 1);
        assert_eq!(tokens.iter().filter(|t| t.kind == Let).count(), 1);
    }

    #[test]
    fn unterminated_block_comment_reports_region() {
        let mut sink = DiagnosticSink::new();
        let tokens = scan("t.ks", "/* never closed", &mut sink);
        assert_eq!(tokens[0].kind, BlockComment);
        assert_eq!(tokens[0].text, "/* never closed");
        assert_eq!(sink.error_count(), 1);
        let diag = &sink.as_slice()[0];
        assert_eq!(diag.length, "/* never closed".len());
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let mut sink = DiagnosticSink::new();
        let tokens = scan("t.ks", "let\n  mut x", &mut sink);
        let muts: Vec<_> = tokens.iter().filter(|t| t.kind == Mut).collect();
        assert_eq!(muts[0].pos, Position::new(2, 3, 6));
        let idents: Vec<_> = tokens.iter().filter(|t| t.kind == Ident).collect();
        assert_eq!(idents[0].pos, Position::new(2, 7, 10));
    }
}
