// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Basic blocks and terminators.

use crate::inst::InstId;
use crate::value::ValueId;
use std::collections::BTreeMap;

/// Arena index of a block within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How control leaves a block. Exactly one terminator per block once
/// SSA construction completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Return { value: Option<ValueId> },
    Branch {
        cond: ValueId,
        then_blk: BlockId,
        else_blk: BlockId,
    },
    Jump { target: BlockId },
    /// Aborts the transaction; doubles as the revert instruction.
    Revert,
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Return { .. } | Terminator::Revert => Vec::new(),
            Terminator::Branch {
                then_blk, else_blk, ..
            } => vec![*then_blk, *else_blk],
            Terminator::Jump { target } => vec![*target],
        }
    }

    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Terminator::Return { value: Some(v) } => vec![*v],
            Terminator::Branch { cond, .. } => vec![*cond],
            _ => Vec::new(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut ValueId> {
        match self {
            Terminator::Return { value: Some(v) } => vec![v],
            Terminator::Branch { cond, .. } => vec![cond],
            _ => Vec::new(),
        }
    }
}

/// A maximal straight-line instruction sequence with one terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    /// Stable label, e.g. `entry`, `then1`, `join2`, `revert3`.
    pub label: String,
    /// Non-terminator instructions in execution order.
    pub insts: Vec<InstId>,
    pub terminator: Option<Terminator>,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
    /// Immediate dominator, once computed.
    pub idom: Option<BlockId>,
    /// Variable bindings live at block entry, keyed by source name.
    pub live_in: BTreeMap<String, ValueId>,
    /// Variable bindings live at block exit, keyed by source name.
    pub live_out: BTreeMap<String, ValueId>,
    /// Set when block-level DCE proves the block unreachable.
    pub dead: bool,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            insts: Vec::new(),
            terminator: None,
            preds: Vec::new(),
            succs: Vec::new(),
            idom: None,
            live_in: BTreeMap::new(),
            live_out: BTreeMap::new(),
            dead: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}
