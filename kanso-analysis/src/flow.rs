// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Flow analysis: every-path returns and unreachable code.
//!
//! A statement "terminates" when control cannot flow past it: a `return`,
//! or an `if`/`else` whose arms both terminate. `require!` does not
//! terminate; its failure arm reverts but its success arm continues.

use crate::analyzer::Analyzer;
use crate::registry::FunctionInfo;
use kanso_core::diagnostics::codes;
use kanso_parser::ast::{Block, FunctionDecl, Statement};

/// Checks return coverage and unreachable statements for one function.
pub(crate) fn check_function(
    analyzer: &mut Analyzer<'_>,
    decl: &FunctionDecl,
    info: &FunctionInfo,
) {
    let terminated = check_block(analyzer, &decl.body);

    if info.return_type.is_some() && !terminated && decl.body.tail_expr().is_none() {
        analyzer.error(
            codes::MISSING_RETURN,
            format!(
                "function `{}` declares a return type but does not return on every path",
                info.name
            ),
            decl.name.span,
        );
    }
}

/// Reports unreachable statements and returns whether the block
/// guarantees termination.
fn check_block(analyzer: &mut Analyzer<'_>, block: &Block) -> bool {
    let mut terminated = false;
    for stmt in &block.statements {
        if matches!(stmt, Statement::Comment(_)) {
            continue;
        }
        if terminated {
            analyzer.warn(
                codes::UNREACHABLE_CODE_WARNING,
                "unreachable statement",
                stmt.span(),
            );
            // One report per dead region is enough.
            return true;
        }
        terminated = stmt_terminates(analyzer, stmt);
    }
    terminated
}

fn stmt_terminates(analyzer: &mut Analyzer<'_>, stmt: &Statement) -> bool {
    match stmt {
        Statement::Return { .. } => true,
        Statement::If(if_stmt) => {
            let then_terminates = check_block(analyzer, &if_stmt.then_block);
            match &if_stmt.else_block {
                Some(else_block) => {
                    let else_terminates = check_block(analyzer, else_block);
                    then_terminates && else_terminates
                }
                None => false,
            }
        }
        _ => false,
    }
}
