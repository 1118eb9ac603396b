// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The stable textual form of a program.
//!
//! Layout, in order: contract header, storage layout, address-constructor
//! header, event signatures, helpers header, canonical constants,
//! functions, program CFG. Value references render as `%name`; canonical
//! constants render with their fixed names and no id suffix. Keyed
//! storage accesses inline their address computation as
//! `keccak256(%k . N)`. Given the same input program the output is
//! byte-identical across runs, which is what the golden tests rely on.

use crate::block::Terminator;
use crate::inst::{Inst, InstKind, SlotRef};
use crate::program::{Function, Program};
use crate::value::ValueId;
use std::fmt::Write;

/// Renders `program` into its stable text form.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "contract {}", program.contract);

    let _ = writeln!(out, "\nstorage:");
    for slot in &program.storage {
        let _ = writeln!(out, "  slot[{}] {}: {}", slot.index, slot.name, slot.ty);
    }

    let _ = writeln!(out, "\n; address constructors");

    let _ = writeln!(out, "\nevents:");
    for event in &program.events {
        let _ = writeln!(
            out,
            "  %{} = {} ; keccak256 0x{}",
            program.value(event.value).name,
            event.signature,
            hex::encode(event.hash)
        );
    }

    let _ = writeln!(out, "\n; helpers");

    let _ = writeln!(out, "\nconstants:");
    for id in [
        program.constants.true_val,
        program.constants.false_val,
        program.constants.zero,
        program.constants.zero_addr,
    ] {
        let value = program.value(id);
        let _ = writeln!(out, "  %{}: {}", value.name, value.ty);
    }

    for func in &program.functions {
        out.push('\n');
        print_function(&mut out, program, func);
    }

    out.push('\n');
    print_cfg(&mut out, program);

    out
}

fn print_function(out: &mut String, program: &Program, func: &Function) {
    let qualifier = if func.external {
        "ext fn"
    } else if func.create {
        "create fn"
    } else {
        "fn"
    };
    let params = func
        .params
        .iter()
        .map(|(_, value)| {
            let v = program.value(*value);
            format!("%{}: {}", v.name, v.ty)
        })
        .collect::<Vec<_>>()
        .join(", ");

    let _ = write!(out, "{qualifier} {}({params})", func.name);
    if let Some(ret) = &func.return_type {
        let _ = write!(out, " -> {ret}");
    }
    if !func.reads.is_empty() {
        let _ = write!(out, " reads {}", func.reads.join(", "));
    }
    if !func.writes.is_empty() {
        let _ = write!(out, " writes {}", func.writes.join(", "));
    }
    let _ = writeln!(out, " {{");

    for (_, block) in func.live_blocks() {
        let _ = writeln!(out, "{}:", block.label);
        for inst_id in &block.insts {
            let inst = func.inst(*inst_id);
            if matches!(inst.kind, InstKind::StorageAddr { .. }) {
                // Address computations render inline at their use sites.
                continue;
            }
            let _ = writeln!(out, "  {}", render_inst(program, func, inst));
        }
        if let Some(term) = &block.terminator {
            let _ = writeln!(out, "  {}", render_terminator(program, func, term));
        }
    }
    let _ = writeln!(out, "}}");
}

fn v(program: &Program, id: ValueId) -> String {
    format!("%{}", program.value(id).name)
}

/// A storage location operand: `slot[N]` or the inlined keyed address
/// `keccak256(%k . N)`.
fn slot_ref(program: &Program, func: &Function, slot: &SlotRef) -> String {
    match slot {
        SlotRef::Literal(n) => format!("slot[{n}]"),
        SlotRef::Computed(addr) => {
            if let Some(def) = func.defining_inst(*addr) {
                if let InstKind::StorageAddr { base_slot, keys } = &def.kind {
                    let keys = keys
                        .iter()
                        .map(|k| v(program, *k))
                        .collect::<Vec<_>>()
                        .join(" . ");
                    return format!("keccak256({keys} . {base_slot})");
                }
            }
            v(program, *addr)
        }
    }
}

fn with_effects(kind: &InstKind, text: String) -> String {
    let effects = kind.effects();
    if effects.is_empty() {
        return text;
    }
    let rendered = effects
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{text} ; {rendered}")
}

fn render_inst(program: &Program, func: &Function, inst: &Inst) -> String {
    let result = inst.results.first().map(|r| v(program, *r));
    let text = match &inst.kind {
        InstKind::Phi { incoming } => {
            let arms = incoming
                .iter()
                .map(|(block, value)| {
                    format!("[{} -> {}]", func.block(*block).label, v(program, *value))
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} = PHI {arms}", result.unwrap_or_default())
        }
        InstKind::Load { addr } => {
            format!("{} = LOAD {}", result.unwrap_or_default(), v(program, *addr))
        }
        InstKind::Store { addr, value } => {
            format!("STORE {}, {}", v(program, *addr), v(program, *value))
        }
        InstKind::StorageLoad { slot } => format!(
            "{} = SLOAD {}",
            result.unwrap_or_default(),
            slot_ref(program, func, slot)
        ),
        InstKind::StorageStore { slot, value } => format!(
            "SSTORE {}, {}",
            slot_ref(program, func, slot),
            v(program, *value)
        ),
        InstKind::StorageAddr { .. } => unreachable!("rendered inline"),
        InstKind::Binary { op, left, right } => format!(
            "{} = {} {}, {}",
            result.unwrap_or_default(),
            op.mnemonic(),
            v(program, *left),
            v(program, *right)
        ),
        InstKind::CheckedArith { op, left, right } => {
            let results = inst
                .results
                .iter()
                .map(|r| v(program, *r))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{results} = {} {}, {}",
                op.mnemonic(),
                v(program, *left),
                v(program, *right)
            )
        }
        InstKind::Sender => format!("{} = SENDER", result.unwrap_or_default()),
        InstKind::Constant { value } => {
            format!("{} = CONST {value}", result.unwrap_or_default())
        }
        InstKind::Call { module, name, args } => {
            let args = args
                .iter()
                .map(|a| v(program, *a))
                .collect::<Vec<_>>()
                .join(", ");
            let target = if module.is_empty() {
                name.clone()
            } else {
                format!("{module}::{name}")
            };
            match result {
                Some(r) => format!("{r} = CALL {target}({args})"),
                None => format!("CALL {target}({args})"),
            }
        }
        InstKind::TopicAddr { address } => format!(
            "{} = TOPIC_ADDR {}",
            result.unwrap_or_default(),
            v(program, *address)
        ),
        InstKind::AbiEncU256 { value, .. } => format!(
            "{} = ABI_ENC_U256 {}",
            result.unwrap_or_default(),
            v(program, *value)
        ),
        InstKind::Log {
            topics_n,
            signature,
            topic_args,
            data_ptr,
            data_len,
        } => {
            let mut operands = vec![v(program, *signature)];
            operands.extend(topic_args.iter().map(|t| v(program, *t)));
            operands.push(v(program, *data_ptr));
            operands.push(v(program, *data_len));
            format!("LOG{topics_n} {}", operands.join(", "))
        }
        InstKind::Assume { pred } => format!("ASSUME {}", v(program, *pred)),
    };
    with_effects(&inst.kind, text)
}

fn render_terminator(program: &Program, func: &Function, term: &Terminator) -> String {
    match term {
        Terminator::Return { value: Some(val) } => format!("RET {}", v(program, *val)),
        Terminator::Return { value: None } => "RET".to_string(),
        Terminator::Branch {
            cond,
            then_blk,
            else_blk,
        } => format!(
            "BR {}, {}, {}",
            v(program, *cond),
            func.block(*then_blk).label,
            func.block(*else_blk).label
        ),
        Terminator::Jump { target } => format!("JMP {}", func.block(*target).label),
        Terminator::Revert => "REVERT".to_string(),
    }
}

fn print_cfg(out: &mut String, program: &Program) {
    let place = |fb: &crate::cfg::FuncBlock| {
        let func = &program.functions[fb.func];
        format!("{}/{}", func.name, func.block(fb.block).label)
    };

    let list = |places: &[crate::cfg::FuncBlock]| {
        if places.is_empty() {
            "-".to_string()
        } else {
            places.iter().map(place).collect::<Vec<_>>().join(", ")
        }
    };

    let _ = writeln!(out, "cfg:");
    let _ = writeln!(out, "  entry: {}", list(&program.cfg.entry_points));
    let _ = writeln!(out, "  success: {}", list(&program.cfg.success_exits));
    let _ = writeln!(out, "  failure: {}", list(&program.cfg.failure_exits));
    for edge in &program.cfg.call_edges {
        let _ = writeln!(
            out,
            "  call: {} -> {}",
            place(&edge.from),
            program.functions[edge.callee].name
        );
    }
}
