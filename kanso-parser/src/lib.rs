// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Kanso front end: scanner and recovering parser.
//!
//! [`scan`] turns UTF-8 source into a total token stream (every byte
//! belongs to exactly one token, including whitespace and comments).
//! [`parse`] turns the stream into an [`ast::Contract`], recovering from
//! malformed regions with [`ast::Expr::Bad`] / [`ast::ContractItem::Bad`]
//! placeholders so later phases always have a tree to work with.

pub mod ast;
pub mod parser;
pub mod scanner;

pub use parser::{parse, Parser};
pub use scanner::{scan, Scanner};
