// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! SSA values.
//!
//! Every value is produced by exactly one instruction (or is a function
//! parameter or canonical constant). Ordinary values carry a positive,
//! program-unique `id`; the canonical globals (`true`, `false`, `zero`,
//! `zero_addr` and one `sig_<Event>` per event) all share [`CANONICAL_ID`]
//! and are distinguished by their fixed names, which the printer must
//! preserve.

use crate::block::BlockId;
use crate::inst::InstId;
use crate::types::IrType;

/// The shared id of all canonical global constants.
pub const CANONICAL_ID: i64 = -1;

/// Arena index of a value within its [`Program`](crate::Program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

impl ValueId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One SSA value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// Display id: positive and program-unique, or [`CANONICAL_ID`].
    pub id: i64,
    /// Rendered as `%name`; unique within the owning function.
    pub name: String,
    pub ty: IrType,
    /// Defining block, within the owning function. `None` for canonical
    /// constants.
    pub def_block: Option<BlockId>,
    /// Defining instruction, within the owning function. `None` for
    /// canonical constants and parameters.
    pub def_inst: Option<InstId>,
    /// Rebinding generation of the source variable this value carries.
    pub version: u32,
}

impl Value {
    pub fn is_canonical(&self) -> bool {
        self.id == CANONICAL_ID
    }
}
