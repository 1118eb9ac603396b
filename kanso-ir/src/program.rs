// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The IR program: functions, storage layout, events, the value arena and
//! the canonical constant pool.

use crate::block::{BasicBlock, BlockId, Terminator};
use crate::cfg::ProgramCfg;
use crate::inst::{Inst, InstId, InstKind};
use crate::types::IrType;
use crate::value::{Value, ValueId, CANONICAL_ID};
use alloy_primitives::B256;

/// One storage slot of the `#[storage]` struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSlot {
    pub index: u32,
    pub name: String,
    pub ty: IrType,
}

/// A global event signature: `Transfer(address,address,uint256)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    pub name: String,
    /// Canonical ABI signature string.
    pub signature: String,
    /// `keccak256(signature)`, the topic-0 word.
    pub hash: B256,
    /// The canonical `sig_<Name>` value referencing this signature.
    pub value: ValueId,
}

/// The canonical constant pool: fixed globals shared by id `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstPool {
    pub true_val: ValueId,
    pub false_val: ValueId,
    pub zero: ValueId,
    pub zero_addr: ValueId,
}

/// One lowered function with its block and instruction arenas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub external: bool,
    pub create: bool,
    /// Parameter name and its SSA value, in declaration order.
    pub params: Vec<(String, ValueId)>,
    pub return_type: Option<IrType>,
    pub reads: Vec<String>,
    pub writes: Vec<String>,
    pub entry: BlockId,
    pub blocks: Vec<BasicBlock>,
    pub insts: Vec<Inst>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn inst(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }

    pub fn inst_mut(&mut self, id: InstId) -> &mut Inst {
        &mut self.insts[id.index()]
    }

    /// Blocks that have not been removed by DCE, in arena order.
    pub fn live_blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.dead)
            .map(|(i, b)| (BlockId(i as u32), b))
    }

    /// Rewrites every use of `from` to `to` across instructions and
    /// terminators.
    pub fn replace_value_uses(&mut self, from: ValueId, to: ValueId) {
        for inst in &mut self.insts {
            for operand in inst.kind.operands_mut() {
                if *operand == from {
                    *operand = to;
                }
            }
        }
        for block in &mut self.blocks {
            if let Some(term) = &mut block.terminator {
                for operand in term.operands_mut() {
                    if *operand == from {
                        *operand = to;
                    }
                }
            }
        }
    }

    /// The instruction, if any, that defines `value` in this function.
    pub fn defining_inst(&self, value: ValueId) -> Option<&Inst> {
        self.insts.iter().find(|i| i.results.contains(&value))
    }
}

/// A complete lowered contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub contract: String,
    pub functions: Vec<Function>,
    /// Storage layout in slot order.
    pub storage: Vec<StorageSlot>,
    pub constants: ConstPool,
    pub events: Vec<EventSignature>,
    pub cfg: ProgramCfg,
    /// Program-wide value arena. The canonical constants occupy the
    /// first entries.
    pub values: Vec<Value>,
    next_id: i64,
}

impl Program {
    /// Creates a program seeded with the canonical constant pool.
    pub fn new(contract: impl Into<String>) -> Self {
        let mut values = Vec::new();
        let mut canonical = |name: &str, ty: IrType| {
            let id = ValueId(values.len() as u32);
            values.push(Value {
                id: CANONICAL_ID,
                name: name.to_string(),
                ty,
                def_block: None,
                def_inst: None,
                version: 0,
            });
            id
        };
        let constants = ConstPool {
            true_val: canonical("true", IrType::Bool),
            false_val: canonical("false", IrType::Bool),
            zero: canonical("zero", IrType::U256),
            zero_addr: canonical("zero_addr", IrType::Address),
        };
        Self {
            contract: contract.into(),
            functions: Vec::new(),
            storage: Vec::new(),
            constants,
            events: Vec::new(),
            cfg: ProgramCfg::default(),
            values,
            next_id: 0,
        }
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.index()]
    }

    pub fn value_mut(&mut self, id: ValueId) -> &mut Value {
        &mut self.values[id.index()]
    }

    /// Allocates an ordinary value with the next program-unique id.
    pub fn new_value(
        &mut self,
        name: impl Into<String>,
        ty: IrType,
        def_block: Option<BlockId>,
        def_inst: Option<InstId>,
        version: u32,
    ) -> ValueId {
        self.next_id += 1;
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            id: self.next_id,
            name: name.into(),
            ty,
            def_block,
            def_inst,
            version,
        });
        id
    }

    /// Allocates a canonical (id `-1`) value; used for event signatures.
    pub fn new_canonical(&mut self, name: impl Into<String>, ty: IrType) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value {
            id: CANONICAL_ID,
            name: name.into(),
            ty,
            def_block: None,
            def_inst: None,
            version: 0,
        });
        id
    }

    pub fn event(&self, name: &str) -> Option<&EventSignature> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn storage_slot(&self, field: &str) -> Option<&StorageSlot> {
        self.storage.iter().find(|s| s.name == field)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Index of `name` in the function list.
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name == name)
    }
}

/// Appends an instruction to `block` in `function`, allocating result
/// values via `results` descriptors `(name, type, version)`.
pub(crate) fn push_inst(
    program: &mut Program,
    func: &mut Function,
    block: BlockId,
    kind: InstKind,
    results: Vec<(String, IrType, u32)>,
) -> (InstId, Vec<ValueId>) {
    let inst_id = InstId(func.insts.len() as u32);
    let result_ids: Vec<ValueId> = results
        .into_iter()
        .map(|(name, ty, version)| {
            program.new_value(name, ty, Some(block), Some(inst_id), version)
        })
        .collect();
    func.insts.push(Inst {
        id: inst_id,
        block,
        kind,
        results: result_ids.clone(),
    });
    func.block_mut(block).insts.push(inst_id);
    (inst_id, result_ids)
}

/// Sets `block`'s terminator and records the CFG edge lists.
pub(crate) fn terminate(func: &mut Function, block: BlockId, term: Terminator) {
    let succs = term.successors();
    for succ in &succs {
        if !func.block(*succ).preds.contains(&block) {
            func.block_mut(*succ).preds.push(block);
        }
    }
    let b = func.block_mut(block);
    debug_assert!(b.terminator.is_none(), "block {} already terminated", b.label);
    b.terminator = Some(term);
    b.succs = succs;
}
