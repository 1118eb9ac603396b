// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Dead-code elimination: unreachable blocks, then dead instructions.
//!
//! Liveness is rooted in terminators and side-effecting instructions
//! (stores, calls, checked arithmetic, logs, assumes) and closed over the
//! operands of defining instructions. A pure instruction whose results
//! are all dead is dropped from its block.

use crate::inst::InstId;
use crate::program::{Function, Program};
use crate::value::ValueId;
use std::collections::{HashMap, HashSet};

pub(crate) fn run(program: &mut Program) -> bool {
    let mut changed = false;
    for func in &mut program.functions {
        changed |= drop_unreachable_blocks(func);
        changed |= drop_dead_instructions(func);
    }
    changed
}

fn drop_unreachable_blocks(func: &mut Function) -> bool {
    let mut reachable = HashSet::new();
    let mut stack = vec![func.entry];
    while let Some(block) = stack.pop() {
        if !reachable.insert(block) {
            continue;
        }
        if let Some(term) = &func.block(block).terminator {
            stack.extend(term.successors());
        }
    }

    let mut changed = false;
    for idx in 0..func.blocks.len() {
        let id = crate::block::BlockId(idx as u32);
        if !reachable.contains(&id) && !func.blocks[idx].dead {
            func.blocks[idx].dead = true;
            changed = true;
        }
    }
    if changed {
        // Keep predecessor lists consistent with the shrunken graph.
        let dead: HashSet<crate::block::BlockId> = func
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.dead)
            .map(|(i, _)| crate::block::BlockId(i as u32))
            .collect();
        for block in &mut func.blocks {
            block.preds.retain(|p| !dead.contains(p));
        }
    }
    changed
}

fn drop_dead_instructions(func: &mut Function) -> bool {
    // Defining instruction of every result.
    let mut def_of: HashMap<ValueId, InstId> = HashMap::new();
    for inst in &func.insts {
        for result in &inst.results {
            def_of.insert(*result, inst.id);
        }
    }

    // Roots: terminator operands and rooted instructions' operands.
    let mut live: HashSet<ValueId> = HashSet::new();
    let mut worklist: Vec<ValueId> = Vec::new();
    for block in func.blocks.iter().filter(|b| !b.dead) {
        if let Some(term) = &block.terminator {
            worklist.extend(term.operands());
        }
        for inst_id in &block.insts {
            let inst = func.inst(*inst_id);
            if inst.kind.is_rooted() {
                worklist.extend(inst.kind.operands());
            }
        }
    }

    // Operand closure through defining instructions.
    while let Some(value) = worklist.pop() {
        if !live.insert(value) {
            continue;
        }
        if let Some(def_id) = def_of.get(&value) {
            worklist.extend(func.inst(*def_id).kind.operands());
        }
    }

    let mut changed = false;
    let keep: HashMap<InstId, bool> = func
        .insts
        .iter()
        .map(|inst| {
            let keep =
                inst.kind.is_rooted() || inst.results.iter().any(|r| live.contains(r));
            (inst.id, keep)
        })
        .collect();
    for block in func.blocks.iter_mut().filter(|b| !b.dead) {
        let before = block.insts.len();
        block.insts.retain(|id| keep.get(id).copied().unwrap_or(true));
        changed |= block.insts.len() != before;
    }
    changed
}
