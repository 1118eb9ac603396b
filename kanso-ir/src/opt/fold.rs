// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Constant folding.
//!
//! Propagates compile-time values through `Binary` instructions whose
//! operands are both known, rewriting them to `Constant`s in place.
//! Arithmetic is 256-bit wrapping; division and remainder by zero are
//! never folded (the runtime semantics must surface). Idempotent: a
//! second run over folded output changes nothing.

use crate::inst::{BinOp, ConstVal, InstKind};
use crate::program::Program;
use crate::value::ValueId;
use alloy_primitives::U256;
use std::collections::HashMap;

pub(crate) fn run(program: &mut Program) -> bool {
    let mut changed = false;

    let mut seed: HashMap<ValueId, ConstVal> = HashMap::new();
    seed.insert(program.constants.true_val, ConstVal::Bool(true));
    seed.insert(program.constants.false_val, ConstVal::Bool(false));
    seed.insert(program.constants.zero, ConstVal::Int(U256::ZERO));
    seed.insert(
        program.constants.zero_addr,
        ConstVal::Addr(alloy_primitives::Address::ZERO),
    );

    for func in &mut program.functions {
        let mut known = seed.clone();

        // Arena order visits every block's instructions in execution
        // order within the block, which is all propagation needs.
        let schedule: Vec<crate::inst::InstId> = func
            .blocks
            .iter()
            .filter(|b| !b.dead)
            .flat_map(|b| b.insts.iter().copied())
            .collect();

        for inst_id in schedule {
            let inst = func.inst(inst_id);
            match &inst.kind {
                InstKind::Constant { value } => {
                    if let Some(&result) = inst.results.first() {
                        known.insert(result, value.clone());
                    }
                }
                InstKind::Binary { op, left, right } => {
                    let (Some(lv), Some(rv)) = (known.get(left), known.get(right)) else {
                        continue;
                    };
                    let Some(folded) = fold(*op, lv, rv) else {
                        continue;
                    };
                    let result = inst.results[0];
                    known.insert(result, folded.clone());
                    func.inst_mut(inst_id).kind = InstKind::Constant { value: folded };
                    changed = true;
                }
                _ => {}
            }
        }
    }

    changed
}

/// Folds one binary operation over known constants, or refuses.
fn fold(op: BinOp, left: &ConstVal, right: &ConstVal) -> Option<ConstVal> {
    match (left, right) {
        (ConstVal::Int(a), ConstVal::Int(b)) => {
            let value = match op {
                BinOp::Add => ConstVal::Int(a.wrapping_add(*b)),
                BinOp::Sub => ConstVal::Int(a.wrapping_sub(*b)),
                BinOp::Mul => ConstVal::Int(a.wrapping_mul(*b)),
                BinOp::Div => ConstVal::Int(a.checked_div(*b)?),
                BinOp::Rem => ConstVal::Int(a.checked_rem(*b)?),
                BinOp::Eq => ConstVal::Bool(a == b),
                BinOp::Ne => ConstVal::Bool(a != b),
                BinOp::Lt => ConstVal::Bool(a < b),
                BinOp::Le => ConstVal::Bool(a <= b),
                BinOp::Gt => ConstVal::Bool(a > b),
                BinOp::Ge => ConstVal::Bool(a >= b),
                BinOp::And | BinOp::Or => return None,
            };
            Some(value)
        }
        (ConstVal::Bool(a), ConstVal::Bool(b)) => {
            let value = match op {
                BinOp::And => ConstVal::Bool(*a && *b),
                BinOp::Or => ConstVal::Bool(*a || *b),
                BinOp::Eq => ConstVal::Bool(a == b),
                BinOp::Ne => ConstVal::Bool(a != b),
                _ => return None,
            };
            Some(value)
        }
        (ConstVal::Addr(a), ConstVal::Addr(b)) => {
            let value = match op {
                BinOp::Eq => ConstVal::Bool(a == b),
                BinOp::Ne => ConstVal::Bool(a != b),
                _ => return None,
            };
            Some(value)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int(v: u64) -> ConstVal {
        ConstVal::Int(U256::from(v))
    }

    #[test]
    fn arithmetic_folds_in_256_bits() {
        assert_eq!(fold(BinOp::Add, &int(2), &int(3)), Some(int(5)));
        let max = ConstVal::Int(U256::MAX);
        assert_eq!(fold(BinOp::Add, &max, &int(1)), Some(int(0)));
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        assert_eq!(fold(BinOp::Div, &int(1), &int(0)), None);
        assert_eq!(fold(BinOp::Rem, &int(1), &int(0)), None);
        assert_eq!(fold(BinOp::Div, &int(7), &int(2)), Some(int(3)));
    }

    #[test]
    fn comparisons_fold_to_booleans() {
        assert_eq!(fold(BinOp::Lt, &int(1), &int(2)), Some(ConstVal::Bool(true)));
        assert_eq!(fold(BinOp::Ge, &int(1), &int(2)), Some(ConstVal::Bool(false)));
    }

    #[test]
    fn boolean_operators_need_both_sides() {
        assert_eq!(
            fold(BinOp::And, &ConstVal::Bool(true), &ConstVal::Bool(false)),
            Some(ConstVal::Bool(false))
        );
        assert_eq!(fold(BinOp::And, &ConstVal::Bool(true), &int(1)), None);
    }
}
