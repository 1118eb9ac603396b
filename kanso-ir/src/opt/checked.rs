// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Assume-guarded checked-arithmetic elimination.
//!
//! A `SUB_CHK a, b` cannot underflow when an `Assume` whose predicate
//! establishes `a ≥ b` is guaranteed to have run first. The guarantee is
//! dominance, decided by def-use analysis on the predicate: same block and
//! earlier, or the assume's block strictly dominates the checked op's
//! block. The rewrite drops the revert effect (a strict effect subset)
//! and the orphaned `ok` result dies in DCE.

use crate::block::BlockId;
use crate::inst::{BinOp, CheckedOp, InstId, InstKind};
use crate::program::{Function, Program};
use crate::value::ValueId;
use std::collections::{HashMap, HashSet};

pub(crate) fn run(program: &mut Program) -> bool {
    let mut changed = false;
    for func in &mut program.functions {
        changed |= run_function(func);
    }
    changed
}

/// A proven `greater ≥ lesser` fact and where it holds from.
struct Fact {
    block: BlockId,
    /// Index of the assume within its block.
    pos: usize,
    greater: ValueId,
    lesser: ValueId,
}

fn run_function(func: &mut Function) -> bool {
    let dom = dominator_sets(func);
    store_idoms(func, &dom);

    // Position of every scheduled instruction.
    let mut positions: HashMap<InstId, (BlockId, usize)> = HashMap::new();
    for (block_idx, block) in func.blocks.iter().enumerate() {
        for (pos, inst_id) in block.insts.iter().enumerate() {
            positions.insert(*inst_id, (BlockId(block_idx as u32), pos));
        }
    }

    // Facts from assumes, via the predicate's defining instruction.
    let mut facts: Vec<Fact> = Vec::new();
    for block in func.blocks.iter().filter(|b| !b.dead) {
        for (pos, inst_id) in block.insts.iter().enumerate() {
            let inst = func.inst(*inst_id);
            let InstKind::Assume { pred } = &inst.kind else {
                continue;
            };
            let Some(def) = func.defining_inst(*pred) else {
                continue;
            };
            let InstKind::Binary { op, left, right } = &def.kind else {
                continue;
            };
            let (greater, lesser) = match op {
                BinOp::Ge | BinOp::Gt => (*left, *right),
                BinOp::Le | BinOp::Lt => (*right, *left),
                _ => continue,
            };
            facts.push(Fact {
                block: inst.block,
                pos,
                greater,
                lesser,
            });
        }
    }

    // Rewrites are collected first so fact positions stay stable.
    let mut rewrites: Vec<(InstId, ValueId, ValueId)> = Vec::new();
    for block in func.blocks.iter().filter(|b| !b.dead) {
        for inst_id in &block.insts {
            let inst = func.inst(*inst_id);
            let InstKind::CheckedArith {
                op: CheckedOp::SubChk,
                left,
                right,
            } = &inst.kind
            else {
                continue;
            };
            let (left, right) = (*left, *right);
            let Some(&(block_id, pos)) = positions.get(inst_id) else {
                continue;
            };
            let proven = facts.iter().any(|fact| {
                fact.greater == left
                    && fact.lesser == right
                    && assume_runs_first(fact, block_id, pos, &dom)
            });
            if proven {
                rewrites.push((*inst_id, left, right));
            }
        }
    }

    let changed = !rewrites.is_empty();
    for (inst_id, left, right) in rewrites {
        let inst = func.inst_mut(inst_id);
        inst.kind = InstKind::Binary {
            op: BinOp::Sub,
            left,
            right,
        };
        // Only the value survives; the `ok` flag is now defined by
        // nothing and dead.
        inst.results.truncate(1);
    }
    changed
}

/// Whether `fact`'s assume is guaranteed to execute before the
/// instruction at `(block, pos)`.
fn assume_runs_first(
    fact: &Fact,
    block: BlockId,
    pos: usize,
    dom: &[HashSet<usize>],
) -> bool {
    if fact.block == block {
        return fact.pos < pos;
    }
    // Strict block dominance.
    dom[block.index()].contains(&fact.block.index())
}

/// Iterative dominator computation over the block graph.
fn dominator_sets(func: &Function) -> Vec<HashSet<usize>> {
    let n = func.blocks.len();
    let entry = func.entry.index();
    let all: HashSet<usize> = (0..n).collect();

    let mut dom: Vec<HashSet<usize>> = vec![all; n];
    dom[entry] = HashSet::from([entry]);

    let mut stable = false;
    while !stable {
        stable = true;
        for b in 0..n {
            if b == entry {
                continue;
            }
            let preds = &func.blocks[b].preds;
            let mut next: Option<HashSet<usize>> = None;
            for pred in preds {
                let pd = &dom[pred.index()];
                next = Some(match next {
                    None => pd.clone(),
                    Some(acc) => acc.intersection(pd).copied().collect(),
                });
            }
            let mut next = next.unwrap_or_default();
            next.insert(b);
            if next != dom[b] {
                dom[b] = next;
                stable = false;
            }
        }
    }
    dom
}

/// Records each block's immediate dominator: the strict dominator
/// dominated by every other strict dominator.
fn store_idoms(func: &mut Function, dom: &[HashSet<usize>]) {
    for b in 0..func.blocks.len() {
        let strict: Vec<usize> = dom[b].iter().copied().filter(|&d| d != b).collect();
        let idom = strict
            .iter()
            .copied()
            .find(|&c| strict.iter().all(|&other| dom[c].contains(&other)));
        func.blocks[b].idom = idom.map(|i| BlockId(i as u32));
    }
}
