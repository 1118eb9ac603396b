// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Semantic analysis for Kanso.
//!
//! [`analyze`] walks a parsed [`Contract`], resolves imports against the
//! closed [`catalog`], type-checks every expression and statement, enforces
//! the contract-shape rules (`#[storage]`, `#[event]`, `#[create]`,
//! `reads`/`writes`), and runs flow and use analysis. It emits diagnostics
//! into the shared sink and returns a [`ContextRegistry`] of resolved
//! bindings for the IR builder.
//!
//! [`Contract`]: kanso_parser::ast::Contract

pub mod analyzer;
pub mod catalog;
pub mod registry;
pub mod scope;
pub mod types;

mod flow;

pub use analyzer::analyze;
pub use registry::{ContextRegistry, FunctionInfo, ImportBinding, ImportKind, StructAttr, StructInfo};
pub use types::SemType;
