// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Common-subexpression elimination, deliberately narrow: repeated
//! `Sender` results within one basic block fold into the first. The
//! builder's per-function cache already prevents most duplicates; this
//! pass catches the ones introduced by other rewrites.

use crate::inst::InstKind;
use crate::program::Program;
use crate::value::ValueId;

pub(crate) fn run(program: &mut Program) -> bool {
    let mut changed = false;

    for func in &mut program.functions {
        // (block index, duplicate inst, its result, surviving result)
        let mut removals: Vec<(usize, crate::inst::InstId, ValueId, ValueId)> = Vec::new();

        for (block_idx, block) in func.blocks.iter().enumerate().filter(|(_, b)| !b.dead) {
            let mut first_sender: Option<ValueId> = None;
            for inst_id in &block.insts {
                let inst = func.inst(*inst_id);
                if !matches!(inst.kind, InstKind::Sender) {
                    continue;
                }
                let result = inst.results[0];
                match first_sender {
                    None => first_sender = Some(result),
                    Some(first) => removals.push((block_idx, *inst_id, result, first)),
                }
            }
        }

        for (block_idx, inst_id, from, to) in removals {
            func.replace_value_uses(from, to);
            func.blocks[block_idx].insts.retain(|id| *id != inst_id);
            changed = true;
        }
    }

    changed
}
