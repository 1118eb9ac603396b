// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Instructions and their declared side effects.
//!
//! The effect sets returned by [`InstKind::effects`] are the contract the
//! optimizer relies on: a pass may replace an instruction only with one
//! whose effect multiset is a subset of the original's. An instruction
//! that under-declares its effects is unsound.

use crate::block::BlockId;
use crate::value::ValueId;
use alloy_primitives::{Address, U256};
use std::fmt;

/// Arena index of an instruction within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstId(pub u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A storage location: a literal slot index or a computed address value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRef {
    Literal(u32),
    Computed(ValueId),
}

/// A compile-time constant operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstVal {
    Int(U256),
    Bool(bool),
    Addr(Address),
    Str(String),
}

impl fmt::Display for ConstVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstVal::Int(v) => write!(f, "{v}"),
            ConstVal::Bool(v) => write!(f, "{v}"),
            ConstVal::Addr(a) => write!(f, "{a}"),
            ConstVal::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Plain binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::Div => "DIV",
            BinOp::Rem => "MOD",
            BinOp::Eq => "EQ",
            BinOp::Ne => "NE",
            BinOp::Lt => "LT",
            BinOp::Le => "LE",
            BinOp::Gt => "GT",
            BinOp::Ge => "GE",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// Overflow-checked arithmetic; the instruction reverts execution on
/// overflow and additionally yields an `ok` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckedOp {
    AddChk,
    SubChk,
    MulChk,
    DivChk,
}

impl CheckedOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            CheckedOp::AddChk => "ADD_CHK",
            CheckedOp::SubChk => "SUB_CHK",
            CheckedOp::MulChk => "MUL_CHK",
            CheckedOp::DivChk => "DIV_CHK",
        }
    }

    /// The unchecked operator this computes.
    pub fn unchecked(self) -> BinOp {
        match self {
            CheckedOp::AddChk => BinOp::Add,
            CheckedOp::SubChk => BinOp::Sub,
            CheckedOp::MulChk => BinOp::Mul,
            CheckedOp::DivChk => BinOp::Div,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StorageEffect {
    Read,
    Write,
    Log,
    Revert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemoryEffect {
    Read,
    Write,
    Allocate,
    Free,
}

/// One declared side effect. An empty effect list means pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effect {
    Storage {
        kind: StorageEffect,
        /// Literal slot when statically known.
        slot: Option<u32>,
    },
    Memory {
        kind: MemoryEffect,
        region: u32,
    },
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Storage { kind, .. } => {
                let kind = match kind {
                    StorageEffect::Read => "read",
                    StorageEffect::Write => "write",
                    StorageEffect::Log => "log",
                    StorageEffect::Revert => "revert",
                };
                write!(f, "{kind}(Storage)")
            }
            Effect::Memory { kind, .. } => {
                let kind = match kind {
                    MemoryEffect::Read => "read",
                    MemoryEffect::Write => "write",
                    MemoryEffect::Allocate => "allocate",
                    MemoryEffect::Free => "free",
                };
                write!(f, "{kind}(Memory)")
            }
        }
    }
}

/// The operation an instruction performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    /// SSA join of one value per predecessor block.
    Phi { incoming: Vec<(BlockId, ValueId)> },
    /// Memory load from a computed address.
    Load { addr: ValueId },
    /// Memory store to a computed address.
    Store { addr: ValueId, value: ValueId },
    /// Storage load from a literal slot or a computed storage address.
    StorageLoad { slot: SlotRef },
    /// Storage store to a literal slot or a computed storage address.
    StorageStore { slot: SlotRef, value: ValueId },
    /// Keyed address: `keccak256(key₁ [. key₂] . base_slot)`.
    StorageAddr { base_slot: u32, keys: Vec<ValueId> },
    Binary {
        op: BinOp,
        left: ValueId,
        right: ValueId,
    },
    /// Produces `(value, ok)`; reverts on overflow.
    CheckedArith {
        op: CheckedOp,
        left: ValueId,
        right: ValueId,
    },
    /// The message sender address.
    Sender,
    Constant { value: ConstVal },
    /// Call to a contract function (`module.is_empty()`) or a stdlib
    /// runtime routine.
    Call {
        module: String,
        name: String,
        args: Vec<ValueId>,
    },
    /// An address packed into an indexed event topic word.
    TopicAddr { address: ValueId },
    /// ABI-encodes a 256-bit word into a fresh 32-byte memory region.
    AbiEncU256 { value: ValueId, region: u32 },
    /// `LOG{topics_n}` with the event signature as topic 0.
    Log {
        topics_n: u8,
        signature: ValueId,
        topic_args: Vec<ValueId>,
        data_ptr: ValueId,
        data_len: ValueId,
    },
    /// Optimizer fact: `pred` is known true from here on.
    Assume { pred: ValueId },
}

impl InstKind {
    /// The declared side-effect set. Empty means pure.
    pub fn effects(&self) -> Vec<Effect> {
        match self {
            InstKind::Phi { .. }
            | InstKind::Binary { .. }
            | InstKind::Sender
            | InstKind::Constant { .. }
            | InstKind::StorageAddr { .. }
            | InstKind::TopicAddr { .. }
            | InstKind::Assume { .. } => Vec::new(),
            InstKind::Load { .. } => vec![Effect::Memory {
                kind: MemoryEffect::Read,
                region: 0,
            }],
            InstKind::Store { .. } => vec![Effect::Memory {
                kind: MemoryEffect::Write,
                region: 0,
            }],
            InstKind::StorageLoad { slot } => vec![Effect::Storage {
                kind: StorageEffect::Read,
                slot: slot_of(slot),
            }],
            InstKind::StorageStore { slot, .. } => vec![Effect::Storage {
                kind: StorageEffect::Write,
                slot: slot_of(slot),
            }],
            // Overflow aborts the transaction; the potential revert is the
            // effect the optimizer must prove away before dropping it.
            InstKind::CheckedArith { .. } => vec![Effect::Storage {
                kind: StorageEffect::Revert,
                slot: None,
            }],
            InstKind::Call { .. } => vec![
                Effect::Storage {
                    kind: StorageEffect::Read,
                    slot: None,
                },
                Effect::Storage {
                    kind: StorageEffect::Write,
                    slot: None,
                },
            ],
            InstKind::AbiEncU256 { region, .. } => vec![
                Effect::Memory {
                    kind: MemoryEffect::Allocate,
                    region: *region,
                },
                Effect::Memory {
                    kind: MemoryEffect::Write,
                    region: *region,
                },
            ],
            InstKind::Log { .. } => vec![Effect::Storage {
                kind: StorageEffect::Log,
                slot: None,
            }],
        }
    }

    /// True when dead-code elimination must keep the instruction even if
    /// its results are unused.
    pub fn is_rooted(&self) -> bool {
        !self.effects().is_empty() || matches!(self, InstKind::Assume { .. })
    }

    /// All value operands, in evaluation order.
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            InstKind::Phi { incoming } => incoming.iter().map(|(_, v)| *v).collect(),
            InstKind::Load { addr } => vec![*addr],
            InstKind::Store { addr, value } => vec![*addr, *value],
            InstKind::StorageLoad { slot } => slot_operand(slot),
            InstKind::StorageStore { slot, value } => {
                let mut ops = slot_operand(slot);
                ops.push(*value);
                ops
            }
            InstKind::StorageAddr { keys, .. } => keys.clone(),
            InstKind::Binary { left, right, .. }
            | InstKind::CheckedArith { left, right, .. } => vec![*left, *right],
            InstKind::Sender | InstKind::Constant { .. } => Vec::new(),
            InstKind::Call { args, .. } => args.clone(),
            InstKind::TopicAddr { address } => vec![*address],
            InstKind::AbiEncU256 { value, .. } => vec![*value],
            InstKind::Log {
                signature,
                topic_args,
                data_ptr,
                data_len,
                ..
            } => {
                let mut ops = vec![*signature];
                ops.extend(topic_args.iter().copied());
                ops.push(*data_ptr);
                ops.push(*data_len);
                ops
            }
            InstKind::Assume { pred } => vec![*pred],
        }
    }

    /// Mutable references to every value operand, for use rewriting.
    pub fn operands_mut(&mut self) -> Vec<&mut ValueId> {
        match self {
            InstKind::Phi { incoming } => incoming.iter_mut().map(|(_, v)| v).collect(),
            InstKind::Load { addr } => vec![addr],
            InstKind::Store { addr, value } => vec![addr, value],
            InstKind::StorageLoad { slot } => slot_operand_mut(slot),
            InstKind::StorageStore { slot, value } => {
                let mut ops = slot_operand_mut(slot);
                ops.push(value);
                ops
            }
            InstKind::StorageAddr { keys, .. } => keys.iter_mut().collect(),
            InstKind::Binary { left, right, .. }
            | InstKind::CheckedArith { left, right, .. } => vec![left, right],
            InstKind::Sender | InstKind::Constant { .. } => Vec::new(),
            InstKind::Call { args, .. } => args.iter_mut().collect(),
            InstKind::TopicAddr { address } => vec![address],
            InstKind::AbiEncU256 { value, .. } => vec![value],
            InstKind::Log {
                signature,
                topic_args,
                data_ptr,
                data_len,
                ..
            } => {
                let mut ops = vec![signature];
                ops.extend(topic_args.iter_mut());
                ops.push(data_ptr);
                ops.push(data_len);
                ops
            }
            InstKind::Assume { pred } => vec![pred],
        }
    }
}

fn slot_of(slot: &SlotRef) -> Option<u32> {
    match slot {
        SlotRef::Literal(n) => Some(*n),
        SlotRef::Computed(_) => None,
    }
}

fn slot_operand(slot: &SlotRef) -> Vec<ValueId> {
    match slot {
        SlotRef::Literal(_) => Vec::new(),
        SlotRef::Computed(v) => vec![*v],
    }
}

fn slot_operand_mut(slot: &mut SlotRef) -> Vec<&mut ValueId> {
    match slot {
        SlotRef::Literal(_) => Vec::new(),
        SlotRef::Computed(v) => vec![v],
    }
}

/// One instruction in a function's arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    pub id: InstId,
    /// Back-link to the owning block.
    pub block: BlockId,
    pub kind: InstKind,
    /// Result values: none, one, or `(value, ok)` for checked arithmetic.
    pub results: Vec<ValueId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pure_instructions_declare_no_effects() {
        assert!(InstKind::Sender.effects().is_empty());
        assert!(InstKind::Binary {
            op: BinOp::Add,
            left: ValueId(0),
            right: ValueId(1)
        }
        .effects()
        .is_empty());
    }

    #[test]
    fn storage_ops_carry_their_slot() {
        let load = InstKind::StorageLoad {
            slot: SlotRef::Literal(3),
        };
        assert_eq!(
            load.effects(),
            vec![Effect::Storage {
                kind: StorageEffect::Read,
                slot: Some(3)
            }]
        );
    }

    #[test]
    fn checked_arith_is_rooted_by_its_revert_effect() {
        let chk = InstKind::CheckedArith {
            op: CheckedOp::SubChk,
            left: ValueId(0),
            right: ValueId(1),
        };
        assert!(chk.is_rooted());
        // The unchecked rewrite target must be an effect subset.
        let plain = InstKind::Binary {
            op: BinOp::Sub,
            left: ValueId(0),
            right: ValueId(1),
        };
        assert!(plain.effects().is_empty());
    }

    #[test]
    fn assume_is_rooted_despite_being_pure() {
        let assume = InstKind::Assume { pred: ValueId(5) };
        assert!(assume.effects().is_empty());
        assert!(assume.is_rooted());
    }

    #[test]
    fn abi_enc_allocates_and_writes_its_region() {
        let enc = InstKind::AbiEncU256 {
            value: ValueId(1),
            region: 7,
        };
        assert_eq!(
            enc.effects(),
            vec![
                Effect::Memory {
                    kind: MemoryEffect::Allocate,
                    region: 7
                },
                Effect::Memory {
                    kind: MemoryEffect::Write,
                    region: 7
                },
            ]
        );
    }

    #[test]
    fn operands_cover_log_inputs() {
        let log = InstKind::Log {
            topics_n: 3,
            signature: ValueId(0),
            topic_args: vec![ValueId(1), ValueId(2)],
            data_ptr: ValueId(3),
            data_len: ValueId(4),
        };
        assert_eq!(
            log.operands(),
            vec![ValueId(0), ValueId(1), ValueId(2), ValueId(3), ValueId(4)]
        );
    }
}
