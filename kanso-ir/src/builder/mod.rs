// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! AST → SSA lowering.
//!
//! The builder runs three passes over an analyzed contract:
//!
//! 1. seed the canonical constant pool and assign storage slots to the
//!    `#[storage]` struct's fields in declaration order;
//! 2. compute the ABI signature and keccak hash of every `#[event]`
//!    struct;
//! 3. lower each function body into basic blocks of EVM-aware
//!    instructions.
//!
//! The sender, storage-address and storage-load caches live on the
//! builder and are discarded between functions; a store invalidates the
//! load cache entry for its cell but keeps the address entry.

mod consteval;
mod event;
mod expr;
mod stmt;

#[cfg(test)]
pub(crate) mod tests;

use crate::block::{BasicBlock, BlockId, Terminator};
use crate::cfg::{CallEdge, FuncBlock, ProgramCfg};
use crate::inst::InstKind;
use crate::program::{push_inst, terminate, Function, Program, StorageSlot};
use crate::types::IrType;
use crate::value::ValueId;
use kanso_analysis::{ContextRegistry, FunctionInfo};
use kanso_core::DiagnosticSink;
use kanso_parser::ast::{Contract, ContractItem, FunctionDecl};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Lowering failures.
///
/// User-facing problems are diagnostics, reported long before lowering;
/// these errors are pipeline misuse or constructs the analyzer should
/// have rejected.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot lower a contract with {errors} error diagnostic(s)")]
    DiagnosticsPresent { errors: usize },
    #[error("malformed literal `{0}`")]
    BadLiteral(String),
    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

/// Lowers an analyzed contract. Refuses to run if `sink` holds errors.
pub fn build(
    contract: &Contract,
    registry: &ContextRegistry,
    sink: &DiagnosticSink,
) -> Result<Program, BuildError> {
    if sink.has_errors() {
        return Err(BuildError::DiagnosticsPresent {
            errors: sink.error_count(),
        });
    }

    let mut builder = Builder::new(registry);
    builder.assign_storage_slots();
    builder.register_event_signatures();

    for item in &contract.items {
        if let ContractItem::Function(decl) = item {
            builder.lower_function(decl)?;
        }
    }

    builder.build_cfg();
    Ok(builder.program)
}

pub(crate) struct Builder<'a> {
    registry: &'a ContextRegistry,
    pub(crate) program: Program,

    // Per-function state, reset by `begin_function`.
    pub(crate) func: Function,
    pub(crate) cur_block: BlockId,
    /// Lexical binding scopes, innermost last.
    pub(crate) scopes: Vec<HashMap<String, ValueId>>,
    /// Per-name rebinding counters for value naming (`x`, `x.1`, …).
    name_versions: HashMap<String, u32>,
    temp_counter: u32,
    label_counters: HashMap<&'static str, u32>,
    pub(crate) sender_cache: Option<ValueId>,
    /// `(base_slot, keys)` → storage address value. Scalar slots use an
    /// empty key list.
    pub(crate) addr_cache: HashMap<(u32, Vec<ValueId>), ValueId>,
    /// `(base_slot, keys)` → last loaded value, invalidated by stores.
    pub(crate) load_cache: HashMap<(u32, Vec<ValueId>), ValueId>,
    region_counter: u32,
    /// Pseudo-values for struct literals and tuples: value → fields.
    pub(crate) composites: HashMap<ValueId, Vec<(String, ValueId)>>,
    pub(crate) in_create: bool,
}

impl<'a> Builder<'a> {
    fn new(registry: &'a ContextRegistry) -> Self {
        Self {
            registry,
            program: Program::new(registry.contract_name.clone()),
            func: empty_function(),
            cur_block: BlockId(0),
            scopes: Vec::new(),
            name_versions: HashMap::new(),
            temp_counter: 0,
            label_counters: HashMap::new(),
            sender_cache: None,
            addr_cache: HashMap::new(),
            load_cache: HashMap::new(),
            region_counter: 0,
            composites: HashMap::new(),
            in_create: false,
        }
    }

    // === Pass 1: storage layout =========================================

    fn assign_storage_slots(&mut self) {
        let Some(storage_name) = &self.registry.storage_struct else {
            return;
        };
        let Some(info) = self.registry.struct_info(storage_name) else {
            return;
        };
        for (index, (name, ty)) in info.fields.iter().enumerate() {
            self.program.storage.push(StorageSlot {
                index: index as u32,
                name: name.clone(),
                ty: IrType::from_sem(ty),
            });
        }
        debug!(
            "assigned {} storage slot(s) for `{storage_name}`",
            self.program.storage.len()
        );
    }

    // === Pass 2: event signatures =======================================

    fn register_event_signatures(&mut self) {
        for event_name in &self.registry.events {
            let Some(info) = self.registry.struct_info(event_name) else {
                continue;
            };
            let params: Vec<String> = info
                .fields
                .iter()
                .map(|(_, ty)| IrType::from_sem(ty).abi_name())
                .collect();
            let signature = format!("{event_name}({})", params.join(","));
            let hash = alloy_primitives::keccak256(signature.as_bytes());
            let value = self
                .program
                .new_canonical(format!("sig_{event_name}"), IrType::U256);
            self.program.events.push(crate::program::EventSignature {
                name: event_name.clone(),
                signature,
                hash,
                value,
            });
        }
    }

    // === Pass 3: function bodies ========================================

    fn lower_function(&mut self, decl: &FunctionDecl) -> Result<(), BuildError> {
        let Some(info) = self.registry.function_info(&decl.name.name).cloned() else {
            return Ok(()); // recovery placeholder; analysis already complained
        };
        debug!("lowering function `{}`", info.name);
        self.begin_function(&info);

        for (name, ty) in &info.params {
            let value =
                self.program
                    .new_value(name.clone(), IrType::from_sem(ty), Some(self.cur_block), None, 0);
            self.name_versions.insert(name.clone(), 1);
            self.bind(name.clone(), value);
            self.func.params.push((name.clone(), value));
        }
        self.record_live_in(self.cur_block);

        self.lower_block_statements(&decl.body)?;

        if !self.func.block(self.cur_block).is_terminated() {
            let value = match (decl.body.tail_expr(), &info.return_type) {
                (Some(tail), Some(_)) => Some(self.lower_expr(tail, None)?),
                (Some(tail), None) => {
                    // Value dropped; side effects still happen.
                    self.lower_expr_for_effects(tail)?;
                    None
                }
                (None, _) => None,
            };
            self.terminate_current(Terminator::Return { value });
        }

        let func = std::mem::replace(&mut self.func, empty_function());
        self.program.functions.push(func);
        Ok(())
    }

    fn begin_function(&mut self, info: &FunctionInfo) {
        self.func = Function {
            name: info.name.clone(),
            external: info.external,
            create: info.create,
            params: Vec::new(),
            return_type: info.return_type.as_ref().map(IrType::from_sem),
            reads: info.reads.clone(),
            writes: info.writes.clone(),
            entry: BlockId(0),
            blocks: vec![BasicBlock::new("entry")],
            insts: Vec::new(),
        };
        self.cur_block = BlockId(0);
        self.scopes = vec![HashMap::new()];
        self.name_versions.clear();
        self.temp_counter = 0;
        self.label_counters.clear();
        self.sender_cache = None;
        self.addr_cache.clear();
        self.load_cache.clear();
        self.region_counter = 0;
        self.composites.clear();
        self.in_create = info.create;
    }

    // === Block and binding plumbing =====================================

    pub(crate) fn new_block(&mut self, prefix: &'static str) -> BlockId {
        let n = self.label_counters.entry(prefix).or_insert(0);
        let label = format!("{prefix}{n}");
        *n += 1;
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(BasicBlock::new(label));
        id
    }

    /// Makes `block` the insertion point and records its live-in map.
    pub(crate) fn switch_to(&mut self, block: BlockId) {
        self.cur_block = block;
        self.record_live_in(block);
    }

    pub(crate) fn terminate_current(&mut self, term: Terminator) {
        let bindings = self.flat_bindings();
        self.func.block_mut(self.cur_block).live_out = bindings;
        terminate(&mut self.func, self.cur_block, term);
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.func.block(self.cur_block).is_terminated()
    }

    fn record_live_in(&mut self, block: BlockId) {
        let bindings = self.flat_bindings();
        self.func.block_mut(block).live_in = bindings;
    }

    fn flat_bindings(&self) -> BTreeMap<String, ValueId> {
        let mut flat = BTreeMap::new();
        for scope in &self.scopes {
            for (name, value) in scope {
                flat.insert(name.clone(), *value);
            }
        }
        flat
    }

    pub(crate) fn bind(&mut self, name: String, value: ValueId) {
        self.scopes
            .last_mut()
            .expect("no open binding scope")
            .insert(name, value);
    }

    /// Rebinds `name` in whichever scope currently holds it.
    pub(crate) fn rebind(&mut self, name: &str, value: ValueId) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.contains_key(name) {
                scope.insert(name.to_string(), value);
                return;
            }
        }
        self.bind(name.to_string(), value);
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<ValueId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// A fresh `%t<n>` temporary name.
    pub(crate) fn temp_name(&mut self) -> String {
        let name = format!("t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// A value name for a source variable, versioned on rebinding:
    /// `x`, `x.1`, `x.2`, …
    pub(crate) fn versioned_name(&mut self, base: &str) -> (String, u32) {
        let version = self.name_versions.entry(base.to_string()).or_insert(0);
        let name = if *version == 0 {
            base.to_string()
        } else {
            format!("{base}.{version}")
        };
        let v = *version;
        *version += 1;
        (name, v)
    }

    /// Appends an instruction with one result to the current block.
    pub(crate) fn emit(
        &mut self,
        kind: InstKind,
        name: String,
        ty: IrType,
        version: u32,
    ) -> ValueId {
        let (_, results) = push_inst(
            &mut self.program,
            &mut self.func,
            self.cur_block,
            kind,
            vec![(name, ty, version)],
        );
        results[0]
    }

    /// Appends a result-less instruction to the current block.
    pub(crate) fn emit_void(&mut self, kind: InstKind) {
        push_inst(
            &mut self.program,
            &mut self.func,
            self.cur_block,
            kind,
            Vec::new(),
        );
    }

    /// Appends a two-result instruction (checked arithmetic).
    pub(crate) fn emit_pair(
        &mut self,
        kind: InstKind,
        first: (String, IrType, u32),
        second: (String, IrType, u32),
    ) -> (ValueId, ValueId) {
        let (_, results) = push_inst(
            &mut self.program,
            &mut self.func,
            self.cur_block,
            kind,
            vec![first, second],
        );
        (results[0], results[1])
    }

    pub(crate) fn next_region(&mut self) -> u32 {
        let region = self.region_counter;
        self.region_counter += 1;
        region
    }

    // === Program CFG ====================================================

    fn build_cfg(&mut self) {
        let mut cfg = ProgramCfg::default();
        for (func_idx, func) in self.program.functions.iter().enumerate() {
            if func.external || func.create {
                cfg.entry_points.push(FuncBlock {
                    func: func_idx,
                    block: func.entry,
                });
            }
            for (block_id, block) in func.live_blocks() {
                match block.terminator {
                    Some(Terminator::Return { .. }) => cfg.success_exits.push(FuncBlock {
                        func: func_idx,
                        block: block_id,
                    }),
                    Some(Terminator::Revert) => cfg.failure_exits.push(FuncBlock {
                        func: func_idx,
                        block: block_id,
                    }),
                    _ => {}
                }
            }
            for inst in &func.insts {
                if let InstKind::Call { module, name, .. } = &inst.kind {
                    if module.is_empty() {
                        if let Some(callee) = self.program.function_index(name) {
                            cfg.call_edges.push(CallEdge {
                                from: FuncBlock {
                                    func: func_idx,
                                    block: inst.block,
                                },
                                callee,
                            });
                        }
                    }
                }
            }
        }
        self.program.cfg = cfg;
    }
}

fn empty_function() -> Function {
    Function {
        name: String::new(),
        external: false,
        create: false,
        params: Vec::new(),
        return_type: None,
        reads: Vec::new(),
        writes: Vec::new(),
        entry: BlockId(0),
        blocks: vec![BasicBlock::new("entry")],
        insts: Vec::new(),
    }
}
