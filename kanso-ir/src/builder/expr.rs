// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Expression lowering.
//!
//! Binary operands are ordered by Sethi–Ullman numbering: the subtree
//! needing more registers is evaluated first, ties evaluate left first.
//! The order is observable only through side effects and is fixed by
//! tests. Plain `+`, `-` and `*` lower to overflow-checked arithmetic;
//! `/` and `%` lower to plain division, whose zero check is the EVM's own.

use super::{BuildError, Builder};
use crate::inst::{BinOp, CheckedOp, ConstVal, InstKind, SlotRef};
use crate::types::IrType;
use crate::value::ValueId;
use alloy_primitives::U256;
use kanso_analysis::catalog::{self, TypeRef};
use kanso_analysis::ImportKind;
use kanso_parser::ast::{BinaryOp, Expr, Literal, UnaryOp};

/// A resolved call target.
pub(crate) enum Callee {
    /// A function of this contract.
    Local(String),
    /// A standard-library function, by module path.
    Catalog { module: String, name: String },
}

impl Builder<'_> {
    pub(crate) fn lower_expr(
        &mut self,
        expr: &Expr,
        hint: Option<&str>,
    ) -> Result<ValueId, BuildError> {
        match expr {
            Expr::Literal(lit) => self.lower_literal(lit),
            Expr::Ident(ident) => self
                .lookup(&ident.name)
                .ok_or_else(|| BuildError::Unsupported(format!("unbound name `{}`", ident.name))),
            Expr::Paren { inner, .. } => self.lower_expr(inner, hint),
            Expr::Unary { op, operand, .. } => self.lower_unary(*op, operand, hint),
            Expr::Binary {
                op, left, right, ..
            } => self.lower_binary(*op, left, right, hint),
            Expr::Field { target, field, .. } => self.lower_field(target, &field.name, hint),
            Expr::Index { target, index, .. } => self.lower_index(target, index, hint),
            Expr::Call { callee, args, .. } => {
                match self.lower_call(callee, args, hint)? {
                    Some(value) => Ok(value),
                    None => Err(BuildError::Unsupported(
                        "void call in value position".to_string(),
                    )),
                }
            }
            Expr::StructLit { fields, .. } => {
                let mut lowered = Vec::with_capacity(fields.len());
                for (field_name, value_expr) in fields {
                    let v = self.lower_expr(value_expr, None)?;
                    lowered.push((field_name.name.clone(), v));
                }
                let name = self.temp_name();
                let pseudo =
                    self.program
                        .new_value(name, IrType::U256, Some(self.cur_block), None, 0);
                self.composites.insert(pseudo, lowered);
                Ok(pseudo)
            }
            Expr::Tuple { elements, .. } => {
                let mut lowered = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let v = self.lower_expr(element, None)?;
                    lowered.push((i.to_string(), v));
                }
                let ty = IrType::Tuple(
                    lowered
                        .iter()
                        .map(|(_, v)| self.program.value(*v).ty.clone())
                        .collect(),
                );
                let name = self.temp_name();
                let pseudo =
                    self.program
                        .new_value(name, ty, Some(self.cur_block), None, 0);
                self.composites.insert(pseudo, lowered);
                Ok(pseudo)
            }
            Expr::Path { .. } => Err(BuildError::Unsupported(
                "module path in value position".to_string(),
            )),
            Expr::Bad { message, .. } => Err(BuildError::Unsupported(format!(
                "recovery placeholder: {message}"
            ))),
        }
    }

    /// Lowers an expression whose value is dropped; void calls are fine.
    pub(crate) fn lower_expr_for_effects(&mut self, expr: &Expr) -> Result<(), BuildError> {
        if let Expr::Call { callee, args, .. } = expr {
            self.lower_call(callee, args, None)?;
            return Ok(());
        }
        self.lower_expr(expr, None).map(|_| ())
    }

    fn lower_literal(&mut self, lit: &Literal) -> Result<ValueId, BuildError> {
        match lit {
            Literal::Bool { value, .. } => Ok(if *value {
                self.program.constants.true_val
            } else {
                self.program.constants.false_val
            }),
            Literal::Int { text, .. } => {
                let value = U256::from_str_radix(text, 10)
                    .map_err(|_| BuildError::BadLiteral(text.clone()))?;
                self.lower_int_const(value)
            }
            Literal::HexInt { text, .. } => {
                let digits = text.trim_start_matches("0x").trim_start_matches("0X");
                let value = U256::from_str_radix(digits, 16)
                    .map_err(|_| BuildError::BadLiteral(text.clone()))?;
                self.lower_int_const(value)
            }
            Literal::Str { text, .. } => {
                let inner = text.trim_matches('"').to_string();
                let name = self.temp_name();
                Ok(self.emit(
                    InstKind::Constant {
                        value: ConstVal::Str(inner),
                    },
                    name,
                    IrType::Str,
                    0,
                ))
            }
        }
    }

    pub(crate) fn lower_int_const(&mut self, value: U256) -> Result<ValueId, BuildError> {
        if value.is_zero() {
            return Ok(self.program.constants.zero);
        }
        let name = self.temp_name();
        Ok(self.emit(
            InstKind::Constant {
                value: ConstVal::Int(value),
            },
            name,
            IrType::U256,
            0,
        ))
    }

    fn lower_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        hint: Option<&str>,
    ) -> Result<ValueId, BuildError> {
        match op {
            // References are erased at this level; operands are values.
            UnaryOp::Deref | UnaryOp::Ref { .. } => self.lower_expr(operand, hint),
            UnaryOp::Not => {
                let value = self.lower_expr(operand, None)?;
                let name = self.result_name(hint);
                Ok(self.emit(
                    InstKind::Binary {
                        op: BinOp::Eq,
                        left: value,
                        right: self.program.constants.false_val,
                    },
                    name,
                    IrType::Bool,
                    0,
                ))
            }
            UnaryOp::Neg => {
                let value = self.lower_expr(operand, None)?;
                let ty = self.program.value(value).ty.clone();
                let name = self.result_name(hint);
                Ok(self.emit(
                    InstKind::Binary {
                        op: BinOp::Sub,
                        left: self.program.constants.zero,
                        right: value,
                    },
                    name,
                    ty,
                    0,
                ))
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        hint: Option<&str>,
    ) -> Result<ValueId, BuildError> {
        // Sethi–Ullman: evaluate the heavier subtree first; ties go left.
        let (left_val, right_val) = if su_number(right) > su_number(left) {
            let r = self.lower_expr(right, None)?;
            let l = self.lower_expr(left, None)?;
            (l, r)
        } else {
            let l = self.lower_expr(left, None)?;
            let r = self.lower_expr(right, None)?;
            (l, r)
        };

        let result_ty = match op {
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem => self.program.value(left_val).ty.clone(),
            _ => IrType::Bool,
        };

        if let Some(checked) = checked_op(op) {
            let name = self.result_name(hint);
            let ok_name = format!("{name}_ok");
            let (value, _ok) = self.emit_pair(
                InstKind::CheckedArith {
                    op: checked,
                    left: left_val,
                    right: right_val,
                },
                (name, result_ty, 0),
                (ok_name, IrType::Bool, 0),
            );
            return Ok(value);
        }

        let name = self.result_name(hint);
        Ok(self.emit(
            InstKind::Binary {
                op: plain_op(op),
                left: left_val,
                right: right_val,
            },
            name,
            result_ty,
            0,
        ))
    }

    /// `State.field` scalar load, or composite field projection.
    fn lower_field(
        &mut self,
        target: &Expr,
        field: &str,
        hint: Option<&str>,
    ) -> Result<ValueId, BuildError> {
        if let Expr::Ident(ident) = target {
            if self.registry.is_storage(&ident.name) {
                let slot = self
                    .program
                    .storage_slot(field)
                    .ok_or_else(|| BuildError::Unsupported(format!("unknown slot `{field}`")))?
                    .clone();
                return Ok(self.scalar_storage_load(slot.index, slot.ty, hint));
            }
        }

        let base = self.lower_expr(target, None)?;
        if let Some(fields) = self.composites.get(&base) {
            if let Some((_, value)) = fields.iter().find(|(name, _)| name == field) {
                return Ok(*value);
            }
        }
        Err(BuildError::Unsupported(format!(
            "field access `{field}` on a non-storage value"
        )))
    }

    /// `State.map[key]` keyed load via a shared storage address.
    fn lower_index(
        &mut self,
        target: &Expr,
        index: &Expr,
        hint: Option<&str>,
    ) -> Result<ValueId, BuildError> {
        let (base_slot, value_ty) = self.mapping_slot(target)?;
        let keys = self.lower_keys(index)?;
        let addr = self.storage_addr_for(base_slot, keys.clone());
        Ok(self.keyed_storage_load(base_slot, keys, addr, value_ty, hint))
    }

    /// Resolves `State.field` as a mapping base, returning its slot and
    /// value type.
    pub(crate) fn mapping_slot(&mut self, target: &Expr) -> Result<(u32, IrType), BuildError> {
        let Expr::Field { target: inner, field, .. } = target else {
            return Err(BuildError::Unsupported(
                "indexing requires a storage mapping".to_string(),
            ));
        };
        let Expr::Ident(ident) = inner.as_ref() else {
            return Err(BuildError::Unsupported(
                "indexing requires a storage mapping".to_string(),
            ));
        };
        if !self.registry.is_storage(&ident.name) {
            return Err(BuildError::Unsupported(
                "indexing requires a storage mapping".to_string(),
            ));
        }
        let slot = self
            .program
            .storage_slot(&field.name)
            .ok_or_else(|| BuildError::Unsupported(format!("unknown slot `{}`", field.name)))?;
        let value_ty = match &slot.ty {
            IrType::Slots(_, value) => (**value).clone(),
            other => other.clone(),
        };
        Ok((slot.index, value_ty))
    }

    /// Lowers a mapping key expression into 1 or 2 key values.
    pub(crate) fn lower_keys(&mut self, index: &Expr) -> Result<Vec<ValueId>, BuildError> {
        let keys = match index {
            Expr::Tuple { elements, .. } => {
                let mut keys = Vec::with_capacity(elements.len());
                for element in elements {
                    keys.push(self.lower_expr(element, None)?);
                }
                keys
            }
            other => {
                let value = self.lower_expr(other, None)?;
                match self.composites.get(&value) {
                    Some(fields) => fields.iter().map(|(_, v)| *v).collect(),
                    None => vec![value],
                }
            }
        };
        if keys.is_empty() || keys.len() > 2 {
            return Err(BuildError::Unsupported(format!(
                "storage keys must number 1 or 2, found {}",
                keys.len()
            )));
        }
        Ok(keys)
    }

    // === Storage access with per-function caches ========================

    /// One `StorageAddr` per `(base_slot, keys)` per function.
    pub(crate) fn storage_addr_for(&mut self, base_slot: u32, keys: Vec<ValueId>) -> ValueId {
        if let Some(&addr) = self.addr_cache.get(&(base_slot, keys.clone())) {
            return addr;
        }
        let name = self.temp_name();
        let addr = self.emit(
            InstKind::StorageAddr {
                base_slot,
                keys: keys.clone(),
            },
            name,
            IrType::StorageAddr,
            0,
        );
        self.addr_cache.insert((base_slot, keys), addr);
        addr
    }

    pub(crate) fn scalar_storage_load(
        &mut self,
        slot: u32,
        ty: IrType,
        hint: Option<&str>,
    ) -> ValueId {
        if let Some(&value) = self.load_cache.get(&(slot, Vec::new())) {
            return value;
        }
        let name = self.result_name(hint);
        let value = self.emit(
            InstKind::StorageLoad {
                slot: SlotRef::Literal(slot),
            },
            name,
            ty,
            0,
        );
        self.load_cache.insert((slot, Vec::new()), value);
        value
    }

    pub(crate) fn keyed_storage_load(
        &mut self,
        base_slot: u32,
        keys: Vec<ValueId>,
        addr: ValueId,
        ty: IrType,
        hint: Option<&str>,
    ) -> ValueId {
        if let Some(&value) = self.load_cache.get(&(base_slot, keys.clone())) {
            return value;
        }
        let name = self.result_name(hint);
        let value = self.emit(
            InstKind::StorageLoad {
                slot: SlotRef::Computed(addr),
            },
            name,
            ty,
            0,
        );
        self.load_cache.insert((base_slot, keys), value);
        value
    }

    // === Calls ==========================================================

    pub(crate) fn resolve_callee(&self, callee: &Expr) -> Result<Callee, BuildError> {
        match callee {
            Expr::Ident(ident) => {
                if self.registry.function_info(&ident.name).is_some() {
                    return Ok(Callee::Local(ident.name.clone()));
                }
                if let Some(binding) = self.registry.import(&ident.name) {
                    if binding.kind == ImportKind::Function {
                        return Ok(Callee::Catalog {
                            module: binding.module.clone(),
                            name: ident.name.clone(),
                        });
                    }
                }
                Err(BuildError::Unsupported(format!(
                    "unresolved callee `{}`",
                    ident.name
                )))
            }
            Expr::Path { segments, .. } => {
                let module = segments[..segments.len() - 1]
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join("::");
                let name = segments.last().expect("non-empty path").name.clone();
                Ok(Callee::Catalog { module, name })
            }
            other => Err(BuildError::Unsupported(format!(
                "unsupported call target at {:?}",
                other.span().start
            ))),
        }
    }

    /// Lowers a call; returns `None` for void calls.
    pub(crate) fn lower_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        hint: Option<&str>,
    ) -> Result<Option<ValueId>, BuildError> {
        let resolved = self.resolve_callee(callee)?;

        if let Callee::Catalog { module, name } = &resolved {
            // Const-eval intrinsics never become calls.
            if args.is_empty() {
                if let Some(value) = super::consteval::intrinsic_value(self, module, name) {
                    return Ok(Some(value));
                }
            }
            if module == "std::evm" && name == "sender" {
                return Ok(Some(self.lower_sender()));
            }
            if module == "std::evm" && name == "emit" {
                let Some(arg) = args.first() else {
                    return Err(BuildError::Unsupported("emit without an event".to_string()));
                };
                self.lower_emit(arg)?;
                return Ok(None);
            }
        }

        let mut lowered_args = Vec::with_capacity(args.len());
        for arg in args {
            lowered_args.push(self.lower_expr(arg, None)?);
        }

        match resolved {
            Callee::Local(name) => {
                let ret = self
                    .registry
                    .function_info(&name)
                    .and_then(|f| f.return_type.as_ref().map(IrType::from_sem));
                let kind = InstKind::Call {
                    module: String::new(),
                    name,
                    args: lowered_args,
                };
                match ret {
                    Some(ty) => {
                        let result_name = self.result_name(hint);
                        Ok(Some(self.emit(kind, result_name, ty, 0)))
                    }
                    None => {
                        self.emit_void(kind);
                        Ok(None)
                    }
                }
            }
            Callee::Catalog { module, name } => {
                let ret = catalog::module(&module)
                    .and_then(|m| m.function(&name))
                    .and_then(|f| f.ret.as_ref().map(typeref_to_ir));
                let kind = InstKind::Call {
                    module,
                    name,
                    args: lowered_args,
                };
                match ret {
                    Some(ty) => {
                        let result_name = self.result_name(hint);
                        Ok(Some(self.emit(kind, result_name, ty, 0)))
                    }
                    None => {
                        self.emit_void(kind);
                        Ok(None)
                    }
                }
            }
        }
    }

    /// The message sender, computed once per function.
    pub(crate) fn lower_sender(&mut self) -> ValueId {
        if let Some(sender) = self.sender_cache {
            return sender;
        }
        let (name, version) = self.versioned_name("sender");
        let sender = self.emit(InstKind::Sender, name, IrType::Address, version);
        self.sender_cache = Some(sender);
        sender
    }

    pub(crate) fn result_name(&mut self, hint: Option<&str>) -> String {
        match hint {
            Some(base) => self.versioned_name(base).0,
            None => self.temp_name(),
        }
    }
}

/// Sethi–Ullman register need of a subtree: leaves are 1; a binary node
/// whose children tie needs one more, otherwise the max of the two.
pub(crate) fn su_number(expr: &Expr) -> u32 {
    match expr {
        Expr::Binary { left, right, .. } => {
            let l = su_number(left);
            let r = su_number(right);
            if l == r {
                l + 1
            } else {
                l.max(r)
            }
        }
        Expr::Unary { operand, .. } => su_number(operand),
        Expr::Paren { inner, .. } => su_number(inner),
        _ => 1,
    }
}

fn checked_op(op: BinaryOp) -> Option<CheckedOp> {
    Some(match op {
        BinaryOp::Add => CheckedOp::AddChk,
        BinaryOp::Sub => CheckedOp::SubChk,
        BinaryOp::Mul => CheckedOp::MulChk,
        _ => return None,
    })
}

fn plain_op(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Rem => BinOp::Rem,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::NotEq => BinOp::Ne,
        BinaryOp::Lt => BinOp::Lt,
        BinaryOp::LtEq => BinOp::Le,
        BinaryOp::Gt => BinOp::Gt,
        BinaryOp::GtEq => BinOp::Ge,
        BinaryOp::And => BinOp::And,
        BinaryOp::Or => BinOp::Or,
    }
}

/// Best-effort catalog → IR type mapping; generic parameters surface as
/// opaque 256-bit words.
fn typeref_to_ir(tr: &TypeRef) -> IrType {
    match tr {
        TypeRef::Param(_) => IrType::U256,
        TypeRef::Named { name, .. } => match *name {
            "Bool" => IrType::Bool,
            "Address" => IrType::Address,
            "String" => IrType::Str,
            "U8" => IrType::UInt(8),
            "U16" => IrType::UInt(16),
            "U32" => IrType::UInt(32),
            "U64" => IrType::UInt(64),
            "U128" => IrType::UInt(128),
            _ => IrType::U256,
        },
    }
}
