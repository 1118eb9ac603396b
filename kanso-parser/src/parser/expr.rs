// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Pratt expression parsing.
//!
//! Binary operators follow the fixed precedence table on
//! [`BinaryOp::precedence`], all left-associative. Prefix operators bind
//! tighter than any binary operator; postfix `.field`, `(call)` and
//! `[index]` bind tightest of all. A `<` directly after a callee path is
//! a generic argument list only when the three-token look-ahead agrees;
//! everywhere else it is a comparison.

use super::Parser;
use crate::ast::*;
use kanso_core::{Span, TokenKind};

impl<'src> Parser<'src, '_> {
    pub(super) fn parse_expr(&mut self) -> Expr {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let Some(op) = binary_op(self.peek_kind()) else {
                return lhs;
            };
            let prec = op.precedence();
            if prec < min_prec {
                return lhs;
            }
            self.bump();
            // Left associativity: the right operand only binds strictly
            // tighter operators.
            let rhs = self.parse_binary(prec + 1);
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            };
        }
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.peek_kind() {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Amp => None, // handled below to capture `&mut`
            _ => return self.parse_postfix(),
        };

        let start = self.peek().pos;
        self.bump();

        let op = op.unwrap_or_else(|| UnaryOp::Ref {
            mutable: self.eat(TokenKind::Mut).is_some(),
        });

        let operand = self.parse_unary();
        let span = Span::new(start, operand.span().end);
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    self.bump();
                    let field = self.expect_ident("field name");
                    let span = expr.span().to(field.span);
                    expr = Expr::Field {
                        target: Box::new(expr),
                        field,
                        span,
                    };
                }
                TokenKind::LParen => {
                    let args = self.parse_call_args();
                    let span = self.span_from(expr.span().start);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        generics: Vec::new(),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expr();
                    self.expect(TokenKind::RBracket);
                    let span = self.span_from(expr.span().start);
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Lt
                    if expr.callee_path().is_some() && self.generic_args_ahead() =>
                {
                    self.bump(); // `<`
                    let mut generics = Vec::new();
                    while !matches!(self.peek_kind(), TokenKind::Gt | TokenKind::Eof) {
                        generics.push(self.parse_type());
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect(TokenKind::Gt);
                    self.expect(TokenKind::LParen);
                    let args = self.finish_call_args();
                    let span = self.span_from(expr.span().start);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        generics,
                        args,
                        span,
                    };
                }
                _ => return expr,
            }
        }
    }

    /// The explicit three-token look-ahead deciding `<` after a callee
    /// path: `<` must be followed by a type-ish token (identifier or `(`)
    /// and then by `>`, `,` or a nested `<` for it to open generics.
    fn generic_args_ahead(&self) -> bool {
        debug_assert_eq!(self.peek_kind(), TokenKind::Lt);
        let first = self.peek_nth(1).kind;
        let second = self.peek_nth(2).kind;
        matches!(first, TokenKind::Ident | TokenKind::LParen)
            && matches!(second, TokenKind::Gt | TokenKind::Comma | TokenKind::Lt)
    }

    /// Parses `( args )` from the opening parenthesis.
    fn parse_call_args(&mut self) -> Vec<Expr> {
        self.bump(); // `(`
        self.finish_call_args()
    }

    /// Parses call arguments when `(` has already been consumed.
    fn finish_call_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            args.push(self.parse_expr());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_primary(&mut self) -> Expr {
        match self.peek_kind() {
            TokenKind::Int => {
                let token = self.bump();
                Expr::Literal(Literal::Int {
                    text: token.text.to_string(),
                    span: token.span(),
                })
            }
            TokenKind::HexInt => {
                let token = self.bump();
                Expr::Literal(Literal::HexInt {
                    text: token.text.to_string(),
                    span: token.span(),
                })
            }
            TokenKind::Str => {
                let token = self.bump();
                Expr::Literal(Literal::Str {
                    text: token.text.to_string(),
                    span: token.span(),
                })
            }
            TokenKind::True | TokenKind::False => {
                let token = self.bump();
                Expr::Literal(Literal::Bool {
                    value: token.kind == TokenKind::True,
                    span: token.span(),
                })
            }
            TokenKind::Ident => self.parse_name(),
            TokenKind::LParen => self.parse_paren_or_tuple(),
            _ => {
                let found = self.peek();
                let message = format!("expected expression, found {}", found.kind.describe());
                self.error_at(found.pos, found.len().max(1), message.clone());
                // Delimiters and `;` stay put so enclosing constructs can
                // close; anything else is consumed into the placeholder.
                let span = if matches!(
                    found.kind,
                    TokenKind::RParen
                        | TokenKind::RBracket
                        | TokenKind::RBrace
                        | TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::Eof
                ) {
                    Span::point(found.pos)
                } else {
                    self.bump().span()
                };
                Expr::Bad { message, span }
            }
        }
    }

    /// An identifier: possibly a path, possibly a struct literal.
    fn parse_name(&mut self) -> Expr {
        let first = self.bump();
        let mut segments = vec![Self::ident_of(first)];

        while self.at(TokenKind::ColonColon) && self.peek_nth(1).kind == TokenKind::Ident {
            self.bump();
            let seg = self.bump();
            segments.push(Self::ident_of(seg));
        }

        if segments.len() > 1 {
            let span = segments[0].span.to(segments.last().unwrap().span);
            return Expr::Path { segments, span };
        }

        let ident = segments.pop().unwrap();
        if self.struct_literals_allowed && self.at(TokenKind::LBrace) && self.struct_lit_ahead() {
            return self.parse_struct_literal(ident);
        }
        Expr::Ident(ident)
    }

    /// `Name {` begins a struct literal only if the braces hold
    /// `field: …` pairs or nothing at all.
    fn struct_lit_ahead(&self) -> bool {
        debug_assert_eq!(self.peek_kind(), TokenKind::LBrace);
        match self.peek_nth(1).kind {
            TokenKind::RBrace => true,
            TokenKind::Ident => self.peek_nth(2).kind == TokenKind::Colon,
            _ => false,
        }
    }

    fn parse_struct_literal(&mut self, name: Ident) -> Expr {
        self.bump(); // `{`
        let mut fields = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            let field_name = self.expect_ident("field name");
            self.expect(TokenKind::Colon);
            let value = self.parse_expr();
            fields.push((field_name, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace);
        let span = self.span_from(name.span.start);
        Expr::StructLit { name, fields, span }
    }

    /// `(e)` parenthesized, `()` / `(e,)` / `(a, b)` tuples.
    fn parse_paren_or_tuple(&mut self) -> Expr {
        let start = self.peek().pos;
        self.bump(); // `(`

        if self.eat(TokenKind::RParen).is_some() {
            return Expr::Tuple {
                elements: Vec::new(),
                span: self.span_from(start),
            };
        }

        let first = self.parse_expr();
        if self.eat(TokenKind::Comma).is_none() {
            self.expect(TokenKind::RParen);
            return Expr::Paren {
                inner: Box::new(first),
                span: self.span_from(start),
            };
        }

        let mut elements = vec![first];
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            elements.push(self.parse_expr());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        Expr::Tuple {
            elements,
            span: self.span_from(start),
        }
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        _ => return None,
    })
}
