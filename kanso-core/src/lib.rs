// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Shared foundation for the Kanso compiler.
//!
//! Every phase of the compiler speaks three vocabularies defined here:
//! source [`Position`]s and [`Span`]s, the [`Token`] stream produced by the
//! scanner, and structured [`Diagnostic`]s collected into a
//! [`DiagnosticSink`]. Nothing in this crate depends on the rest of the
//! compiler, so downstream crates (and external embedders such as a
//! language server) can use it on its own.

pub mod diagnostics;
pub mod position;
pub mod token;

pub use diagnostics::{codes, Diagnostic, DiagnosticSink, Severity, Suggestion};
pub use position::{Position, Span};
pub use token::{Token, TokenKind};
