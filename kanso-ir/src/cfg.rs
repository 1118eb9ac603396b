// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The program-level control-flow graph.
//!
//! Per-function CFGs live on the blocks themselves (`preds`/`succs`); this
//! records the contract-level view: where external callers can enter, how
//! executions end, and which call sites jump into which callees.

use crate::block::BlockId;

/// A block within a specific function, by function index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncBlock {
    pub func: usize,
    pub block: BlockId,
}

/// A cross-function edge from a call site to the callee's entry block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub from: FuncBlock,
    pub callee: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramCfg {
    /// Entry blocks of `ext` and `#[create]` functions.
    pub entry_points: Vec<FuncBlock>,
    /// Blocks terminated by `Return`.
    pub success_exits: Vec<FuncBlock>,
    /// Blocks terminated by `Revert`.
    pub failure_exits: Vec<FuncBlock>,
    pub call_edges: Vec<CallEdge>,
}

impl ProgramCfg {
    pub fn is_empty(&self) -> bool {
        self.entry_points.is_empty()
            && self.success_exits.is_empty()
            && self.failure_exits.is_empty()
            && self.call_edges.is_empty()
    }
}
