// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The Kanso abstract syntax tree.
//!
//! Every node carries the span of the source text that produced it, so
//! `source[span.start.offset..span.end.offset]` is the node's own text.
//! The `Bad*` variants are recovery placeholders: they appear only where
//! the parser gave up on a region, and later phases treat them as opaque
//! "skip me" markers rather than cascading errors out of them.

use kanso_core::Span;

/// A name with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A retained comment, doc or plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

/// Root of a parse: one `contract Name { … }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// Comments that precede the `contract` keyword.
    pub leading_comments: Vec<Comment>,
    pub name: Ident,
    pub items: Vec<ContractItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractItem {
    Use(UseDecl),
    Struct(StructDecl),
    Function(FunctionDecl),
    Comment(Comment),
    DocComment(Comment),
    /// Recovery placeholder for a malformed item.
    Bad(BadItem),
}

/// What the parser was attempting when recovery fired, plus the message
/// already reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadItem {
    pub message: String,
    pub context: String,
    pub span: Span,
}

/// `use std::evm::{sender, emit};` or `use Table;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseDecl {
    /// Namespace path segments, at least one.
    pub path: Vec<Ident>,
    /// Brace list of imported names; `None` imports the module itself.
    pub items: Option<Vec<Ident>>,
    pub span: Span,
}

impl UseDecl {
    /// The dotted module path, e.g. `std::evm`.
    pub fn module_path(&self) -> String {
        self.path
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("::")
    }
}

/// `#[storage] struct State { … }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    /// Raw attribute name (`storage`, `event`, or a typo the analyzer
    /// diagnoses).
    pub attribute: Option<Ident>,
    pub doc: Option<Comment>,
    pub name: Ident,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Ident,
    pub ty: VariableType,
}

/// `ext fn transfer(to: Address, amount: U256) -> Bool reads State writes State { … }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    /// Raw attribute name (`create`, or a typo the analyzer diagnoses).
    pub attribute: Option<Ident>,
    pub doc: Option<Comment>,
    pub external: bool,
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<VariableType>,
    pub reads: Vec<Ident>,
    pub writes: Vec<Ident>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Ident,
    pub ty: VariableType,
}

/// A type as written: named with optional generics, or a tuple.
///
/// The two shapes are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableType {
    Named {
        name: Ident,
        generics: Vec<VariableType>,
        span: Span,
    },
    Tuple {
        elements: Vec<VariableType>,
        span: Span,
    },
}

impl VariableType {
    pub fn span(&self) -> Span {
        match self {
            VariableType::Named { span, .. } | VariableType::Tuple { span, .. } => *span,
        }
    }

    /// The head identifier of a named type, if this is one.
    pub fn name(&self) -> Option<&str> {
        match self {
            VariableType::Named { name, .. } => Some(&name.name),
            VariableType::Tuple { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    /// The implicit return value: the final expression statement without a
    /// trailing semicolon, if any.
    pub fn tail_expr(&self) -> Option<&Expr> {
        match self.statements.last() {
            Some(Statement::Expr {
                expr,
                semicolon: false,
                ..
            }) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment applies, if any.
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::RemAssign => BinaryOp::Rem,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Let {
        mutable: bool,
        name: Ident,
        ty: Option<VariableType>,
        init: Option<Expr>,
        span: Span,
    },
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
        span: Span,
    },
    Expr {
        expr: Expr,
        /// False only for a block's tail expression.
        semicolon: bool,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Require {
        args: Vec<Expr>,
        span: Span,
    },
    If(IfStmt),
    Comment(Comment),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Let { span, .. }
            | Statement::Assign { span, .. }
            | Statement::Expr { span, .. }
            | Statement::Return { span, .. }
            | Statement::Require { span, .. } => *span,
            Statement::If(stmt) => stmt.span,
            Statement::Comment(comment) => comment.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_block: Block,
    /// An `else if` chain nests as an else block holding a single `If`.
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Deref,
    Ref { mutable: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Pratt binding power; all binary operators are left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::NotEq => 3,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Decimal integer, kept as written; width is decided by context.
    Int { text: String, span: Span },
    /// `0x…` integer, kept as written.
    HexInt { text: String, span: Span },
    /// String literal including its quotes.
    Str { text: String, span: Span },
    Bool { value: bool, span: Span },
}

impl Literal {
    pub fn span(&self) -> Span {
        match self {
            Literal::Int { span, .. }
            | Literal::HexInt { span, .. }
            | Literal::Str { span, .. }
            | Literal::Bool { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(Literal),
    Ident(Ident),
    /// `a::b::c`
    Path {
        segments: Vec<Ident>,
        span: Span,
    },
    Field {
        target: Box<Expr>,
        field: Ident,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        generics: Vec<VariableType>,
        args: Vec<Expr>,
        span: Span,
    },
    StructLit {
        name: Ident,
        fields: Vec<(Ident, Expr)>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Tuple {
        elements: Vec<Expr>,
        span: Span,
    },
    Paren {
        inner: Box<Expr>,
        span: Span,
    },
    /// Recovery placeholder for a malformed expression.
    Bad {
        message: String,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(lit) => lit.span(),
            Expr::Ident(ident) => ident.span,
            Expr::Path { span, .. }
            | Expr::Field { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::StructLit { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Bad { span, .. } => *span,
        }
    }

    /// True for expressions an assignment may target: identifiers, field
    /// accesses, index expressions and unary places.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_) | Expr::Field { .. } | Expr::Index { .. } | Expr::Unary { .. }
        )
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, Expr::Bad { .. })
    }

    /// The segments of a callee path: `f` → `[f]`, `a::b::f` → `[a, b, f]`.
    pub fn callee_path(&self) -> Option<Vec<&Ident>> {
        match self {
            Expr::Ident(ident) => Some(vec![ident]),
            Expr::Path { segments, .. } => Some(segments.iter().collect()),
            _ => None,
        }
    }
}
