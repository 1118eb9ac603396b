// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Contract-level declarations: the contract shell, `use`, `struct`, `fn`.

use super::Parser;
use crate::ast::*;
use kanso_core::{Span, TokenKind};

impl<'src> Parser<'src, '_> {
    /// Parses the whole file into a `Contract`.
    ///
    /// Total: whatever the input, a contract comes back; a file without a
    /// `contract` keyword yields an empty-named contract holding one bad
    /// item that covers the stray tokens.
    pub fn parse_contract(&mut self) -> Contract {
        let mut leading_comments = Vec::new();
        while self.raw_peek().kind.is_comment() {
            let token = self.bump_raw();
            leading_comments.push(Comment {
                text: token.text.to_string(),
                span: token.span(),
            });
        }

        let start = self.peek().pos;
        if self.eat(TokenKind::Contract).is_none() {
            let found = self.peek();
            self.error_at(
                found.pos,
                found.len().max(1),
                format!("expected `contract`, found {}", found.kind.describe()),
            );
            // Look for a late `contract` keyword; otherwise everything is
            // one unparseable region.
            while !matches!(self.peek_kind(), TokenKind::Contract | TokenKind::Eof) {
                self.bump();
            }
            if self.eat(TokenKind::Contract).is_none() {
                return Contract {
                    leading_comments,
                    name: Ident::new("", Span::point(start)),
                    items: vec![ContractItem::Bad(BadItem {
                        message: "expected a contract declaration".to_string(),
                        context: "contract".to_string(),
                        span: self.span_from(start),
                    })],
                    span: self.span_from(start),
                };
            }
        }

        let name = self.expect_ident("contract name");
        self.expect(TokenKind::LBrace);

        let mut items = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            items.push(self.parse_item());
        }
        self.expect(TokenKind::RBrace);

        Contract {
            leading_comments,
            name,
            items,
            span: self.span_from(start),
        }
    }

    fn parse_item(&mut self) -> ContractItem {
        // Comments surface as items unless a doc comment directly
        // precedes a declaration, in which case it attaches to it.
        let raw = self.raw_peek();
        if raw.kind.is_comment() {
            let token = self.bump_raw();
            let comment = Comment {
                text: token.text.to_string(),
                span: token.span(),
            };
            if token.kind == TokenKind::DocComment {
                if matches!(
                    self.peek_kind(),
                    TokenKind::Struct | TokenKind::Fn | TokenKind::Ext | TokenKind::Hash
                ) {
                    return self.parse_decl(Some(comment));
                }
                return ContractItem::DocComment(comment);
            }
            return ContractItem::Comment(comment);
        }

        match self.peek_kind() {
            TokenKind::Use => self.parse_use(),
            TokenKind::Struct | TokenKind::Fn | TokenKind::Ext | TokenKind::Hash => {
                self.parse_decl(None)
            }
            _ => {
                let found = self.peek();
                let message = format!(
                    "expected contract item, found {}",
                    found.kind.describe()
                );
                self.error_at(found.pos, found.len().max(1), message.clone());
                let start = found.pos;
                self.synchronize();
                ContractItem::Bad(BadItem {
                    message,
                    context: "contract item".to_string(),
                    span: self.span_from(start),
                })
            }
        }
    }

    /// A struct or function, optionally introduced by `#[attr]` and/or a
    /// doc comment.
    fn parse_decl(&mut self, mut doc: Option<Comment>) -> ContractItem {
        let start = self.peek().pos;

        let attribute = if self.at(TokenKind::Hash) {
            self.bump();
            self.expect(TokenKind::LBracket);
            let name = self.expect_ident("attribute name");
            self.expect(TokenKind::RBracket);
            Some(name)
        } else {
            None
        };

        // A doc comment may sit between the attribute and the declaration.
        if doc.is_none() && self.raw_peek().kind == TokenKind::DocComment {
            let token = self.bump_raw();
            doc = Some(Comment {
                text: token.text.to_string(),
                span: token.span(),
            });
        }

        match self.peek_kind() {
            TokenKind::Struct => self.parse_struct(start, attribute, doc),
            TokenKind::Fn | TokenKind::Ext => self.parse_function(start, attribute, doc),
            _ => {
                let found = self.peek();
                let message = format!(
                    "expected `struct` or `fn` after attribute, found {}",
                    found.kind.describe()
                );
                self.error_at(found.pos, found.len().max(1), message.clone());
                self.synchronize();
                ContractItem::Bad(BadItem {
                    message,
                    context: "declaration".to_string(),
                    span: self.span_from(start),
                })
            }
        }
    }

    /// `use a::b;` or `use a::b::{x, y};`
    fn parse_use(&mut self) -> ContractItem {
        let start = self.peek().pos;
        self.bump(); // `use`

        let mut path = vec![self.expect_ident("module path segment")];
        let mut items = None;

        while self.eat(TokenKind::ColonColon).is_some() {
            if self.at(TokenKind::LBrace) {
                self.bump();
                let mut names = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                    names.push(self.expect_ident("imported name"));
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                }
                self.expect(TokenKind::RBrace);
                items = Some(names);
                break;
            }
            path.push(self.expect_ident("module path segment"));
        }

        let use_span = self.span_from(start);
        if self.eat(TokenKind::Semicolon).is_none() {
            self.missing_semicolon(use_span);
        }

        ContractItem::Use(UseDecl {
            path,
            items,
            span: self.span_from(start),
        })
    }

    fn parse_struct(
        &mut self,
        start: kanso_core::Position,
        attribute: Option<Ident>,
        doc: Option<Comment>,
    ) -> ContractItem {
        self.bump(); // `struct`
        let name = self.expect_ident("struct name");
        self.expect(TokenKind::LBrace);

        let mut fields = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            while self.raw_peek().kind.is_comment() {
                self.bump_raw();
            }
            if matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
                break;
            }
            let field_name = self.expect_ident("field name");
            self.expect(TokenKind::Colon);
            let ty = self.parse_type();
            fields.push(Field {
                name: field_name,
                ty,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RBrace);

        ContractItem::Struct(StructDecl {
            attribute,
            doc,
            name,
            fields,
            span: self.span_from(start),
        })
    }

    fn parse_function(
        &mut self,
        start: kanso_core::Position,
        attribute: Option<Ident>,
        doc: Option<Comment>,
    ) -> ContractItem {
        let external = self.eat(TokenKind::Ext).is_some();
        if self.expect(TokenKind::Fn).is_none() {
            self.synchronize();
            return ContractItem::Bad(BadItem {
                message: "expected `fn`".to_string(),
                context: "function".to_string(),
                span: self.span_from(start),
            });
        }

        let name = self.expect_ident("function name");

        self.expect(TokenKind::LParen);
        let mut params = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
            let param_name = self.expect_ident("parameter name");
            self.expect(TokenKind::Colon);
            let ty = self.parse_type();
            params.push(Param {
                name: param_name,
                ty,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen);

        let return_type = if self.eat(TokenKind::Arrow).is_some() {
            Some(self.parse_type())
        } else {
            None
        };

        let reads = if self.eat(TokenKind::Reads).is_some() {
            self.parse_ident_list("storage struct name")
        } else {
            Vec::new()
        };
        let writes = if self.eat(TokenKind::Writes).is_some() {
            self.parse_ident_list("storage struct name")
        } else {
            Vec::new()
        };

        let body = self.parse_block();

        ContractItem::Function(FunctionDecl {
            attribute,
            doc,
            external,
            name,
            params,
            return_type,
            reads,
            writes,
            body,
            span: self.span_from(start),
        })
    }

    /// One or more comma-separated identifiers (`reads A, B`).
    fn parse_ident_list(&mut self, what: &str) -> Vec<Ident> {
        let mut names = vec![self.expect_ident(what)];
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.expect_ident(what));
        }
        names
    }

    /// A type: named with optional generics, or a tuple.
    pub(super) fn parse_type(&mut self) -> VariableType {
        let start = self.peek().pos;

        if self.eat(TokenKind::LParen).is_some() {
            let mut elements = Vec::new();
            while !matches!(self.peek_kind(), TokenKind::RParen | TokenKind::Eof) {
                elements.push(self.parse_type());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
            return VariableType::Tuple {
                elements,
                span: self.span_from(start),
            };
        }

        let name = self.expect_ident("type name");
        let mut generics = Vec::new();
        // In type position `<` always opens a generic argument list.
        if self.eat(TokenKind::Lt).is_some() {
            while !matches!(self.peek_kind(), TokenKind::Gt | TokenKind::Eof) {
                generics.push(self.parse_type());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::Gt);
        }

        VariableType::Named {
            name,
            generics,
            span: self.span_from(start),
        }
    }
}
