// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The optimization pipeline.
//!
//! A fixed, ordered sequence — constant folding, assume-guarded
//! checked-arith elimination, dead-code elimination (blocks then
//! instructions), sender CSE — each pass running exactly once. Every pass
//! obeys the soundness rule: a rewritten instruction's effect multiset
//! must be a subset of the original's, otherwise the pass leaves it
//! alone.

mod checked;
mod cse;
mod dce;
mod fold;

use crate::program::Program;
use log::debug;

/// Runs the pipeline in order; returns whether anything changed.
pub fn optimize(program: &mut Program) -> bool {
    let mut changed = false;
    for (name, pass) in PASSES {
        let pass_changed = pass(program);
        debug!("pass {name}: {}", if pass_changed { "changed" } else { "no change" });
        changed |= pass_changed;
    }
    changed
}

type Pass = fn(&mut Program) -> bool;

const PASSES: [(&str, Pass); 4] = [
    ("const-fold", fold::run),
    ("checked-elim", checked::run),
    ("dce", dce::run),
    ("sender-cse", cse::run),
];
