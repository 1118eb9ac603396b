// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Blocks and statements.
//!
//! The interesting rules live here: assignment disambiguation after a
//! parsed expression, tail expressions (final expression statement without
//! `;`), and missing-semicolon recovery anchored at the end of the
//! preceding construct.

use super::Parser;
use crate::ast::*;
use kanso_core::TokenKind;

impl<'src> Parser<'src, '_> {
    pub(super) fn parse_block(&mut self) -> Block {
        let start = self.peek().pos;
        if self.expect(TokenKind::LBrace).is_none() {
            return Block {
                statements: Vec::new(),
                span: self.span_from(start),
            };
        }

        let mut statements = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            let before = self.index;
            statements.push(self.parse_statement());
            if self.index == before {
                // Recovery failed to consume anything; force progress so
                // the parser can never loop.
                self.bump();
            }
        }
        self.expect(TokenKind::RBrace);

        Block {
            statements,
            span: self.span_from(start),
        }
    }

    fn parse_statement(&mut self) -> Statement {
        let raw = self.raw_peek();
        if raw.kind.is_comment() {
            let token = self.bump_raw();
            return Statement::Comment(Comment {
                text: token.text.to_string(),
                span: token.span(),
            });
        }

        match self.peek_kind() {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Require => self.parse_require(),
            TokenKind::If => Statement::If(self.parse_if()),
            _ => self.parse_expr_or_assign(),
        }
    }

    /// `let mut x: U256 = e;` — everything after the name is optional.
    fn parse_let(&mut self) -> Statement {
        let start = self.peek().pos;
        self.bump(); // `let`

        let mutable = self.eat(TokenKind::Mut).is_some();
        let name = self.expect_ident("variable name");

        let ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type())
        } else {
            None
        };

        let init = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_expr())
        } else {
            None
        };

        if self.eat(TokenKind::Semicolon).is_none() {
            let anchor = init
                .as_ref()
                .map(Expr::span)
                .or_else(|| ty.as_ref().map(VariableType::span))
                .unwrap_or(name.span);
            self.missing_semicolon(anchor);
        }

        Statement::Let {
            mutable,
            name,
            ty,
            init,
            span: self.span_from(start),
        }
    }

    fn parse_return(&mut self) -> Statement {
        let start = self.peek().pos;
        let ret = self.bump(); // `return`

        let value = if matches!(self.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace) {
            None
        } else {
            Some(self.parse_expr())
        };

        if self.eat(TokenKind::Semicolon).is_none() {
            let anchor = value.as_ref().map(Expr::span).unwrap_or_else(|| ret.span());
            self.missing_semicolon(anchor);
        }

        Statement::Return {
            value,
            span: self.span_from(start),
        }
    }

    /// `require!(cond, args…);`
    fn parse_require(&mut self) -> Statement {
        let start = self.peek().pos;
        self.bump(); // `require`
        self.expect(TokenKind::Bang);
        self.expect(TokenKind::LParen);

        let mut args = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            args.push(self.parse_expr());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen);

        let require_span = self.span_from(start);
        if self.eat(TokenKind::Semicolon).is_none() {
            self.missing_semicolon(require_span);
        }

        Statement::Require {
            args,
            span: self.span_from(start),
        }
    }

    /// `if c { … } else if c2 { … } else { … }`
    ///
    /// An `else if` arm nests as an else block containing a single `If`
    /// statement.
    fn parse_if(&mut self) -> IfStmt {
        let start = self.peek().pos;
        self.bump(); // `if`

        // `{` after the condition opens the body, never a struct literal.
        let allowed = std::mem::replace(&mut self.struct_literals_allowed, false);
        let cond = self.parse_expr();
        self.struct_literals_allowed = allowed;

        let then_block = self.parse_block();

        let else_block = if self.eat(TokenKind::Else).is_some() {
            if self.at(TokenKind::If) {
                let nested = self.parse_if();
                let span = nested.span;
                Some(Block {
                    statements: vec![Statement::If(nested)],
                    span,
                })
            } else {
                Some(self.parse_block())
            }
        } else {
            None
        };

        IfStmt {
            cond,
            then_block,
            else_block,
            span: self.span_from(start),
        }
    }

    /// An expression statement, or an assignment if the parsed expression
    /// is an assignable place followed by an assignment operator.
    fn parse_expr_or_assign(&mut self) -> Statement {
        let start = self.peek().pos;
        let expr = self.parse_expr();

        let op_token = self.peek();
        if op_token.kind.is_assign_op() {
            if !expr.is_assignable() && !expr.is_bad() {
                self.error_at(
                    expr.span().start,
                    expr.span().len().max(1),
                    "invalid assignment target",
                );
            }
            let op = match op_token.kind {
                TokenKind::Assign => AssignOp::Assign,
                TokenKind::PlusAssign => AssignOp::AddAssign,
                TokenKind::MinusAssign => AssignOp::SubAssign,
                TokenKind::StarAssign => AssignOp::MulAssign,
                TokenKind::SlashAssign => AssignOp::DivAssign,
                TokenKind::PercentAssign => AssignOp::RemAssign,
                _ => unreachable!("checked by is_assign_op"),
            };
            self.bump();
            let value = self.parse_expr();
            if self.eat(TokenKind::Semicolon).is_none() {
                self.missing_semicolon(value.span());
            }
            return Statement::Assign {
                target: expr,
                op,
                value,
                span: self.span_from(start),
            };
        }

        let semicolon = if self.eat(TokenKind::Semicolon).is_some() {
            true
        } else if self.at(TokenKind::RBrace) {
            // Tail expression: the block's implicit value.
            false
        } else {
            self.missing_semicolon(expr.span());
            true
        };

        Statement::Expr {
            expr,
            semicolon,
            span: self.span_from(start),
        }
    }
}
