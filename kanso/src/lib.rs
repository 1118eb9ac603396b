// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The Kanso compiler pipeline.
//!
//! Kanso is a Rust-inspired contract language targeting the EVM. This
//! crate chains the member crates into one entry point:
//!
//! ```text
//! source text ──scan──▶ tokens ──parse──▶ Contract (AST)
//!        ──analyze──▶ ContextRegistry + diagnostics
//!        ──build──▶ Program (SSA IR) ──optimize──▶ Program
//! ```
//!
//! Phases never abort on the first problem; diagnostics accumulate in
//! order and the IR builder only runs when no error-level diagnostic was
//! produced. Each compilation is independent: fresh state throughout, no
//! shared mutable globals, so callers may run compilations of disjoint
//! inputs in parallel.
//!
//! ```
//! let outcome = kanso::compile("counter.ks", r#"
//! contract Counter {
//!     #[storage]
//!     struct State { count: U256 }
//!
//!     ext fn increment() writes State {
//!         State.count += 1;
//!     }
//! }
//! "#);
//! assert!(outcome.success());
//! let ir = kanso::print_program(outcome.program.as_ref().unwrap());
//! assert!(ir.contains("SSTORE slot[0]"));
//! ```

pub use kanso_analysis::{analyze, ContextRegistry, SemType};
pub use kanso_core::{codes, Diagnostic, DiagnosticSink, Position, Severity, Span, Suggestion};
pub use kanso_ir::{build, optimize, print_program, BuildError, Program};
pub use kanso_parser::{ast, parse, scan};

use log::debug;

/// Everything one compilation produced.
#[derive(Debug)]
pub struct CompileOutcome {
    pub contract: ast::Contract,
    pub registry: ContextRegistry,
    /// The lowered (and possibly optimized) program; `None` when errors
    /// stopped the pipeline before lowering.
    pub program: Option<Program>,
    pub diagnostics: DiagnosticSink,
}

impl CompileOutcome {
    /// True when no error-level diagnostic was produced. This is the
    /// condition a driver maps to exit status 0.
    pub fn success(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// Renders every diagnostic against the given source text.
    pub fn render_diagnostics(&self, source: &str) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compiles `source` through the full pipeline, optimizer included.
pub fn compile(file: &str, source: &str) -> CompileOutcome {
    let mut outcome = compile_unoptimized(file, source);
    if let Some(program) = &mut outcome.program {
        let changed = optimize(program);
        debug!("optimizer: {}", if changed { "changed" } else { "no change" });
    }
    outcome
}

/// Compiles `source` but stops before the optimizer; used by golden tests
/// that pin the raw lowering.
pub fn compile_unoptimized(file: &str, source: &str) -> CompileOutcome {
    let mut sink = DiagnosticSink::new();
    let contract = parse(file, source, &mut sink);
    let registry = analyze(file, &contract, &mut sink);

    let program = if sink.has_errors() {
        None
    } else {
        match build(&contract, &registry, &sink) {
            Ok(program) => Some(program),
            Err(err) => {
                // Analysis accepted the tree, so this is a pipeline bug;
                // surface it as a diagnostic rather than panicking.
                sink.push(Diagnostic::error(
                    format!("internal lowering failure: {err}"),
                    file,
                    Position::start(),
                    1,
                ));
                None
            }
        }
    };

    CompileOutcome {
        contract,
        registry,
        program,
        diagnostics: sink,
    }
}
