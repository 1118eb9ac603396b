// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The token vocabulary of Kanso.
//!
//! The scanner accounts for every byte of the input: whitespace and plain
//! comments are real tokens, not gaps, which is what lets positions
//! round-trip and lets the parser decide which trivia to attach to AST
//! nodes. `Illegal` bridges lexical errors so scanning is total.

use crate::position::{Position, Span};
use std::fmt;

/// Kind of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters and punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,
    ColonColon,
    Hash,
    Arrow,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    Bang,
    Assign,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Amp,
    Pipe,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PlusPlus,
    MinusMinus,

    // Keywords
    Contract,
    Fn,
    Let,
    Mut,
    If,
    Else,
    Return,
    Require,
    Use,
    Struct,
    Reads,
    Writes,
    Ext,
    True,
    False,

    // Literals and names
    Ident,
    Int,
    HexInt,
    Str,

    // Trivia (kept in the stream; the parser decides what to attach)
    LineComment,
    DocComment,
    BlockComment,
    Whitespace,

    Illegal,
    Eof,
}

impl TokenKind {
    /// Keyword lookup for a scanned identifier.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        Some(match text {
            "contract" => TokenKind::Contract,
            "fn" => TokenKind::Fn,
            "let" => TokenKind::Let,
            "mut" => TokenKind::Mut,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "return" => TokenKind::Return,
            "require" => TokenKind::Require,
            "use" => TokenKind::Use,
            "struct" => TokenKind::Struct,
            "reads" => TokenKind::Reads,
            "writes" => TokenKind::Writes,
            "ext" => TokenKind::Ext,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        })
    }

    /// True for whitespace and comment kinds the parser skips by default.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::DocComment
                | TokenKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::DocComment | TokenKind::BlockComment
        )
    }

    /// `=`, `+=`, `-=`, `*=`, `/=`, `%=`.
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
        )
    }

    /// Human-readable name used in "expected X, found Y" diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::ColonColon => "`::`",
            TokenKind::Hash => "`#`",
            TokenKind::Arrow => "`->`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::StarStar => "`**`",
            TokenKind::Bang => "`!`",
            TokenKind::Assign => "`=`",
            TokenKind::Eq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Amp => "`&`",
            TokenKind::Pipe => "`|`",
            TokenKind::PlusAssign => "`+=`",
            TokenKind::MinusAssign => "`-=`",
            TokenKind::StarAssign => "`*=`",
            TokenKind::SlashAssign => "`/=`",
            TokenKind::PercentAssign => "`%=`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::Contract => "`contract`",
            TokenKind::Fn => "`fn`",
            TokenKind::Let => "`let`",
            TokenKind::Mut => "`mut`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Return => "`return`",
            TokenKind::Require => "`require`",
            TokenKind::Use => "`use`",
            TokenKind::Struct => "`struct`",
            TokenKind::Reads => "`reads`",
            TokenKind::Writes => "`writes`",
            TokenKind::Ext => "`ext`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer literal",
            TokenKind::HexInt => "hex literal",
            TokenKind::Str => "string literal",
            TokenKind::LineComment => "comment",
            TokenKind::DocComment => "doc comment",
            TokenKind::BlockComment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Illegal => "invalid token",
            TokenKind::Eof => "end of file",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A single scanned token, borrowing its text from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub pos: Position,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, pos: Position) -> Self {
        Self { kind, text, pos }
    }

    /// The position one past the last byte of this token.
    pub fn end(&self) -> Position {
        self.pos.advanced(self.text)
    }

    pub fn span(&self) -> Span {
        Span::new(self.pos, self.end())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_resolve() {
        assert_eq!(TokenKind::keyword("contract"), Some(TokenKind::Contract));
        assert_eq!(TokenKind::keyword("ext"), Some(TokenKind::Ext));
        assert_eq!(TokenKind::keyword("exts"), None);
        assert_eq!(TokenKind::keyword("Contract"), None);
    }

    #[test]
    fn token_end_spans_multiline_text() {
        let tok = Token::new(TokenKind::BlockComment, "/* a\nb */", Position::start());
        assert_eq!(tok.end(), Position::new(2, 5, 9));
        assert_eq!(tok.span().len(), 9);
    }
}
