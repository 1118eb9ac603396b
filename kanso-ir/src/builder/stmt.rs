// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Statement lowering.
//!
//! `require!` lowers to a branch into a `success`/`revert` block pair with
//! an `Assume` of the condition heading the success block; that assume is
//! the hook the optimizer uses to drop provably-safe overflow checks.
//! `if` lowers to `then`/`else`/`join` blocks with phis for variables the
//! arms rebind. Caches are snapshotted around branches so a value cached
//! inside one arm can never leak to a block it does not dominate.

use super::{BuildError, Builder};
use crate::block::{BlockId, Terminator};
use crate::inst::{BinOp, CheckedOp, InstKind, SlotRef};
use crate::program::push_inst;
use crate::value::ValueId;
use kanso_parser::ast::{AssignOp, Block, Expr, IfStmt, Statement};
use std::collections::{BTreeMap, HashMap};

impl Builder<'_> {
    /// Lowers a function body's statements. The tail expression (if the
    /// body has one) is left to the caller, which turns it into the
    /// return value.
    pub(crate) fn lower_block_statements(&mut self, block: &Block) -> Result<(), BuildError> {
        let count = block.statements.len();
        for (i, stmt) in block.statements.iter().enumerate() {
            if self.is_terminated() {
                break;
            }
            let is_tail = i + 1 == count
                && matches!(stmt, Statement::Expr { semicolon: false, .. });
            if is_tail {
                break;
            }
            self.lower_statement(stmt)?;
        }
        Ok(())
    }

    /// Lowers every statement of an `if` arm, tail expression included
    /// (an arm's tail has no value; only its effects remain).
    fn lower_arm(&mut self, block: &Block) -> Result<(), BuildError> {
        for stmt in &block.statements {
            if self.is_terminated() {
                break;
            }
            self.lower_statement(stmt)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, stmt: &Statement) -> Result<(), BuildError> {
        match stmt {
            Statement::Comment(_) => Ok(()),
            Statement::Let { name, init, .. } => {
                if let Some(init) = init {
                    let value = self.lower_expr(init, Some(&name.name))?;
                    self.bind(name.name.clone(), value);
                }
                // `let mut x: T;` binds nothing; the first assignment does.
                Ok(())
            }
            Statement::Expr { expr, .. } => self.lower_expr_for_effects(expr),
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => Some(self.lower_expr(expr, None)?),
                    None => None,
                };
                self.terminate_current(Terminator::Return { value });
                Ok(())
            }
            Statement::Require { args, .. } => self.lower_require(args),
            Statement::If(if_stmt) => self.lower_if(if_stmt),
            Statement::Assign {
                target, op, value, ..
            } => self.lower_assign(target, *op, value),
        }
    }

    // === require! =======================================================

    fn lower_require(&mut self, args: &[Expr]) -> Result<(), BuildError> {
        let Some(cond) = args.first() else {
            return Err(BuildError::Unsupported("empty require!".to_string()));
        };
        let cond_val = self.lower_expr(cond, None)?;

        let success = self.new_block("success");
        let revert_blk = self.new_block("revert");
        self.terminate_current(Terminator::Branch {
            cond: cond_val,
            then_blk: success,
            else_blk: revert_blk,
        });

        // Message arguments are evaluated on the failing path only.
        self.switch_to(revert_blk);
        for arg in &args[1..] {
            self.lower_expr_for_effects(arg)?;
        }
        self.terminate_current(Terminator::Revert);

        // The success block starts with the assumption the branch proved.
        self.switch_to(success);
        self.emit_void(InstKind::Assume { pred: cond_val });
        Ok(())
    }

    // === if/else ========================================================

    fn lower_if(&mut self, if_stmt: &IfStmt) -> Result<(), BuildError> {
        let cond_val = self.lower_expr(&if_stmt.cond, None)?;
        let cond_block = self.cur_block;

        let then_blk = self.new_block("then");
        let else_blk = if_stmt.else_block.as_ref().map(|_| self.new_block("else"));
        let join_blk = self.new_block("join");

        let scopes_snapshot = self.scopes.clone();
        let addr_snapshot = self.addr_cache.clone();
        let load_snapshot = self.load_cache.clone();
        let sender_snapshot = self.sender_cache;

        self.terminate_current(Terminator::Branch {
            cond: cond_val,
            then_blk,
            else_blk: else_blk.unwrap_or(join_blk),
        });

        // Then arm.
        let then_exit = self.lower_if_arm(
            &if_stmt.then_block,
            then_blk,
            join_blk,
            &scopes_snapshot,
            &addr_snapshot,
            &load_snapshot,
            sender_snapshot,
        )?;

        // Else arm.
        let else_exit = match (&if_stmt.else_block, else_blk) {
            (Some(block), Some(id)) => Some(self.lower_if_arm(
                block,
                id,
                join_blk,
                &scopes_snapshot,
                &addr_snapshot,
                &load_snapshot,
                sender_snapshot,
            )?),
            _ => None,
        };

        // Continue in the join block with merged state.
        self.scopes = scopes_snapshot.clone();
        self.addr_cache = addr_snapshot;
        self.sender_cache = sender_snapshot;
        self.switch_to(join_blk);

        let mut flows: Vec<(BlockId, BTreeMap<String, ValueId>)> = Vec::new();
        let mut flowing_caches: Vec<HashMap<(u32, Vec<ValueId>), ValueId>> =
            vec![load_snapshot.clone()];
        if let Some((block, bindings)) = &then_exit.flow {
            flows.push((*block, bindings.clone()));
        }
        flowing_caches.push(then_exit.load_cache.clone());
        match &else_exit {
            Some(exit) => {
                if let Some((block, bindings)) = &exit.flow {
                    flows.push((*block, bindings.clone()));
                }
                flowing_caches.push(exit.load_cache.clone());
            }
            None => {
                // Without an else arm the false edge flows straight from
                // the condition block with the pre-branch bindings.
                flows.push((cond_block, flat(&scopes_snapshot)));
            }
        }

        // Loads survive the join only when no flowing path disturbed them.
        self.load_cache = load_snapshot
            .into_iter()
            .filter(|(key, value)| {
                flowing_caches
                    .iter()
                    .all(|cache| cache.get(key) == Some(value))
            })
            .collect();

        self.merge_bindings(&flows);
        Ok(())
    }

    /// Lowers one arm from the pre-branch snapshot; returns its exit
    /// state.
    #[allow(clippy::too_many_arguments)]
    fn lower_if_arm(
        &mut self,
        block: &Block,
        arm_block: BlockId,
        join_blk: BlockId,
        scopes_snapshot: &[HashMap<String, ValueId>],
        addr_snapshot: &HashMap<(u32, Vec<ValueId>), ValueId>,
        load_snapshot: &HashMap<(u32, Vec<ValueId>), ValueId>,
        sender_snapshot: Option<ValueId>,
    ) -> Result<ArmExit, BuildError> {
        self.scopes = scopes_snapshot.to_vec();
        self.scopes.push(HashMap::new());
        self.addr_cache = addr_snapshot.clone();
        self.load_cache = load_snapshot.clone();
        self.sender_cache = sender_snapshot;

        self.switch_to(arm_block);
        self.lower_arm(block)?;

        let exit_block = self.cur_block;
        let flows = !self.is_terminated();
        if flows {
            self.terminate_current(Terminator::Jump { target: join_blk });
        }

        // Drop the arm's lexical scope; outer rebinds stay visible.
        self.scopes.pop();
        let bindings = flat(&self.scopes);
        Ok(ArmExit {
            flow: flows.then_some((exit_block, bindings)),
            load_cache: std::mem::take(&mut self.load_cache),
        })
    }

    /// Rebinds every outer variable at the join, inserting phis where the
    /// flowing paths disagree.
    fn merge_bindings(&mut self, flows: &[(BlockId, BTreeMap<String, ValueId>)]) {
        if flows.is_empty() {
            return; // join is unreachable; block DCE will drop it
        }

        let names: Vec<String> = flat(&self.scopes).keys().cloned().collect();
        for name in names {
            let incoming: Vec<(BlockId, ValueId)> = flows
                .iter()
                .filter_map(|(block, bindings)| bindings.get(&name).map(|v| (*block, *v)))
                .collect();
            if incoming.len() != flows.len() {
                continue; // not bound on every path; analyzer already ruled
            }
            let first = incoming[0].1;
            if incoming.iter().all(|(_, v)| *v == first) {
                self.rebind(&name, first);
                continue;
            }
            let ty = self.program.value(first).ty.clone();
            let (value_name, version) = self.versioned_name(&name);
            let (_, results) = push_inst(
                &mut self.program,
                &mut self.func,
                self.cur_block,
                InstKind::Phi { incoming },
                vec![(value_name, ty, version)],
            );
            self.rebind(&name, results[0]);
        }
    }

    // === Assignments ====================================================

    fn lower_assign(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: &Expr,
    ) -> Result<(), BuildError> {
        match target {
            Expr::Ident(ident) => self.lower_var_assign(&ident.name, op, value),
            Expr::Field { target, field, .. } => {
                self.lower_scalar_store(target, &field.name, op, value)
            }
            Expr::Index { target, index, .. } => self.lower_keyed_store(target, index, op, value),
            Expr::Unary { operand, .. } => self.lower_assign(operand, op, value),
            other => Err(BuildError::Unsupported(format!(
                "unsupported assignment target at {:?}",
                other.span().start
            ))),
        }
    }

    fn lower_var_assign(
        &mut self,
        name: &str,
        op: AssignOp,
        value: &Expr,
    ) -> Result<(), BuildError> {
        match compound_of(op) {
            None => {
                let new = self.lower_expr(value, Some(name))?;
                self.rebind(name, new);
            }
            Some(compound) => {
                let current = self.lookup(name).ok_or_else(|| {
                    BuildError::Unsupported(format!("unbound name `{name}`"))
                })?;
                let rhs = self.lower_expr(value, None)?;
                let new = self.apply_compound(compound, current, rhs, Some(name));
                self.rebind(name, new);
            }
        }
        Ok(())
    }

    /// `State.field = v` and its compound forms.
    fn lower_scalar_store(
        &mut self,
        target: &Expr,
        field: &str,
        op: AssignOp,
        value: &Expr,
    ) -> Result<(), BuildError> {
        let is_storage = matches!(target, Expr::Ident(ident) if self.registry.is_storage(&ident.name));
        if !is_storage {
            return Err(BuildError::Unsupported(
                "assignment to a non-storage field".to_string(),
            ));
        }
        let slot = self
            .program
            .storage_slot(field)
            .ok_or_else(|| BuildError::Unsupported(format!("unknown slot `{field}`")))?
            .clone();

        // Constructor guard: the initial total supply is forced to zero.
        // Kept for behavioral compatibility; see DESIGN.md.
        if self.in_create && field == "total_supply" && op == AssignOp::Assign {
            self.lower_expr_for_effects(value)?;
            let zero = self.program.constants.zero;
            self.store_scalar(slot.index, zero);
            return Ok(());
        }

        let stored = match compound_of(op) {
            None => self.lower_expr(value, None)?,
            Some(compound) => {
                let current = self.scalar_storage_load(slot.index, slot.ty.clone(), None);
                let rhs = self.lower_expr(value, None)?;
                self.apply_compound(compound, current, rhs, None)
            }
        };
        self.store_scalar(slot.index, stored);
        Ok(())
    }

    fn store_scalar(&mut self, slot: u32, value: ValueId) {
        self.emit_void(InstKind::StorageStore {
            slot: SlotRef::Literal(slot),
            value,
        });
        // A store invalidates the load cache entry; the address entry
        // (for keyed slots) is unaffected.
        self.load_cache.remove(&(slot, Vec::new()));
    }

    /// `State.map[k] = v` and its compound forms.
    fn lower_keyed_store(
        &mut self,
        target: &Expr,
        index: &Expr,
        op: AssignOp,
        value: &Expr,
    ) -> Result<(), BuildError> {
        let (base_slot, value_ty) = self.mapping_slot(target)?;
        let keys = self.lower_keys(index)?;
        let addr = self.storage_addr_for(base_slot, keys.clone());

        let stored = match compound_of(op) {
            None => self.lower_expr(value, None)?,
            Some(compound) => {
                let current =
                    self.keyed_storage_load(base_slot, keys.clone(), addr, value_ty, None);
                let rhs = self.lower_expr(value, None)?;
                self.apply_compound(compound, current, rhs, None)
            }
        };

        self.emit_void(InstKind::StorageStore {
            slot: SlotRef::Computed(addr),
            value: stored,
        });
        self.load_cache.remove(&(base_slot, keys));
        Ok(())
    }

    /// `+=`/`-=`/`*=` go through checked arithmetic; `/=` and `%=` stay
    /// plain.
    fn apply_compound(
        &mut self,
        op: Compound,
        current: ValueId,
        rhs: ValueId,
        hint: Option<&str>,
    ) -> ValueId {
        let ty = self.program.value(current).ty.clone();
        match op {
            Compound::Checked(checked) => {
                let name = self.result_name(hint);
                let ok_name = format!("{name}_ok");
                let (value, _) = self.emit_pair(
                    InstKind::CheckedArith {
                        op: checked,
                        left: current,
                        right: rhs,
                    },
                    (name, ty, 0),
                    (ok_name, crate::types::IrType::Bool, 0),
                );
                value
            }
            Compound::Plain(binop) => {
                let name = self.result_name(hint);
                self.emit(
                    InstKind::Binary {
                        op: binop,
                        left: current,
                        right: rhs,
                    },
                    name,
                    ty,
                    0,
                )
            }
        }
    }
}

struct ArmExit {
    /// Exit block and outer bindings, when the arm falls through to the
    /// join.
    flow: Option<(BlockId, BTreeMap<String, ValueId>)>,
    load_cache: HashMap<(u32, Vec<ValueId>), ValueId>,
}

enum Compound {
    Checked(CheckedOp),
    Plain(BinOp),
}

fn compound_of(op: AssignOp) -> Option<Compound> {
    Some(match op {
        AssignOp::Assign => return None,
        AssignOp::AddAssign => Compound::Checked(CheckedOp::AddChk),
        AssignOp::SubAssign => Compound::Checked(CheckedOp::SubChk),
        AssignOp::MulAssign => Compound::Checked(CheckedOp::MulChk),
        AssignOp::DivAssign => Compound::Plain(BinOp::Div),
        AssignOp::RemAssign => Compound::Plain(BinOp::Rem),
    })
}

fn flat(scopes: &[HashMap<String, ValueId>]) -> BTreeMap<String, ValueId> {
    let mut flat = BTreeMap::new();
    for scope in scopes {
        for (name, value) in scope {
            flat.insert(name.clone(), *value);
        }
    }
    flat
}
