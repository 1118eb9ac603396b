// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

use crate::block::Terminator;
use crate::builder::{build, BuildError};
use crate::inst::{CheckedOp, InstKind, SlotRef};
use crate::program::Program;
use crate::types::IrType;
use crate::value::CANONICAL_ID;
use kanso_core::DiagnosticSink;
use pretty_assertions::assert_eq;

pub(crate) fn compile(source: &str) -> Program {
    let mut sink = DiagnosticSink::new();
    let contract = kanso_parser::parse("test.ks", source, &mut sink);
    let registry = kanso_analysis::analyze("test.ks", &contract, &mut sink);
    let rendered: Vec<String> = sink.iter().map(|d| d.render(source)).collect();
    assert!(
        !sink.has_errors(),
        "diagnostics before lowering:\n{}",
        rendered.join("\n")
    );
    build(&contract, &registry, &sink).expect("lowering failed")
}

pub(crate) const ERC20: &str = r#"contract Token {
    use std::evm::{sender, emit};

    #[storage]
    struct State {
        balances: Table<Address, U256>,
        total_supply: U256,
    }

    #[event]
    struct Transfer {
        from: Address,
        to: Address,
        value: U256,
    }

    #[create]
    fn create(initial_supply: U256) writes State {
        State.total_supply = initial_supply;
    }

    ext fn transfer(to: Address, amount: U256) -> Bool reads State writes State {
        let from_balance = State.balances[sender()];
        require!(from_balance >= amount, "insufficient balance");
        State.balances[sender()] -= amount;
        State.balances[to] += amount;
        emit(Transfer { from: sender(), to: to, value: amount });
        return true;
    }
}
"#;

fn kinds_of<'p>(program: &'p Program, func: &str) -> Vec<&'p InstKind> {
    let func = program.function(func).expect("function missing");
    func.live_blocks()
        .flat_map(|(_, b)| b.insts.iter())
        .map(|id| &func.inst(*id).kind)
        .collect()
}

#[test]
fn empty_contract_builds_empty_program() {
    let program = compile("contract Empty { }");
    assert_eq!(program.contract, "Empty");
    assert!(program.functions.is_empty());
    assert!(program.storage.is_empty());
    assert!(program.events.is_empty());
}

#[test]
fn canonical_constants_are_seeded_once_with_id_minus_one() {
    let program = compile("contract Empty { }");
    for name in ["true", "false", "zero", "zero_addr"] {
        let matching: Vec<_> = program.values.iter().filter(|v| v.name == name).collect();
        assert_eq!(matching.len(), 1, "constant `{name}`");
        assert_eq!(matching[0].id, CANONICAL_ID);
    }
}

#[test]
fn storage_slots_follow_declaration_order() {
    let program = compile(ERC20);
    assert_eq!(program.storage.len(), 2);
    assert_eq!(program.storage[0].index, 0);
    assert_eq!(program.storage[0].name, "balances");
    assert_eq!(
        program.storage[0].ty,
        IrType::Slots(Box::new(IrType::Address), Box::new(IrType::U256))
    );
    assert_eq!(program.storage[1].index, 1);
    assert_eq!(program.storage[1].name, "total_supply");
    assert_eq!(program.storage[1].ty, IrType::U256);
}

#[test]
fn event_signature_matches_the_erc20_topic() {
    let program = compile(ERC20);
    let event = program.event("Transfer").expect("Transfer event");
    assert_eq!(event.signature, "Transfer(address,address,uint256)");
    // The well-known ERC-20 Transfer topic hash.
    assert_eq!(
        hex::encode(event.hash),
        "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    );
    assert_eq!(program.value(event.value).id, CANONICAL_ID);
    assert_eq!(program.value(event.value).name, "sig_Transfer");
}

#[test]
fn value_ids_are_unique_except_canonicals() {
    let program = compile(ERC20);
    let mut seen = std::collections::HashSet::new();
    for value in &program.values {
        if value.id == CANONICAL_ID {
            continue;
        }
        assert!(value.id > 0, "ordinary ids are positive: {value:?}");
        assert!(seen.insert(value.id), "duplicate id {}", value.id);
    }
}

#[test]
fn every_live_block_has_exactly_one_terminator() {
    let program = compile(ERC20);
    for func in &program.functions {
        for (_, block) in func.live_blocks() {
            assert!(
                block.terminator.is_some(),
                "block `{}` of `{}` lacks a terminator",
                block.label,
                func.name
            );
        }
    }
}

#[test]
fn transfer_lowers_to_the_expected_shape() {
    let program = compile(ERC20);
    let kinds = kinds_of(&program, "transfer");

    // One SENDER thanks to the per-function cache.
    let senders = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::Sender))
        .count();
    assert_eq!(senders, 1);

    // Two storage addresses: balances[sender] and balances[to].
    let addrs = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::StorageAddr { .. }))
        .count();
    assert_eq!(addrs, 2);

    // One assume, at the head of the post-require block.
    let func = program.function("transfer").unwrap();
    let success = func
        .live_blocks()
        .find(|(_, b)| b.label.starts_with("success"))
        .map(|(_, b)| b)
        .expect("success block");
    let first = func.inst(success.insts[0]);
    assert!(matches!(first.kind, InstKind::Assume { .. }));
    let assumes = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::Assume { .. }))
        .count();
    assert_eq!(assumes, 1);

    // The decrement is checked (SUB_CHK), the increment too (ADD_CHK).
    assert!(kinds.iter().any(|k| matches!(
        k,
        InstKind::CheckedArith {
            op: CheckedOp::SubChk,
            ..
        }
    )));
    assert!(kinds.iter().any(|k| matches!(
        k,
        InstKind::CheckedArith {
            op: CheckedOp::AddChk,
            ..
        }
    )));

    // LOG3: signature topic plus two address topics, data pointer and
    // length.
    let log = kinds
        .iter()
        .find_map(|k| match k {
            InstKind::Log {
                topics_n,
                topic_args,
                ..
            } => Some((*topics_n, topic_args.len())),
            _ => None,
        })
        .expect("log instruction");
    assert_eq!(log, (3, 2));

    // The revert arm ends in REVERT and the function CFG records it.
    assert!(func
        .live_blocks()
        .any(|(_, b)| matches!(b.terminator, Some(Terminator::Revert))));
}

#[test]
fn storage_coherence_shares_addr_and_load() {
    // Two reads of the same cell: one StorageAddr, one StorageLoad.
    let source = r#"contract C {
    use std::evm::{sender};
    #[storage]
    struct State { balances: Table<Address, U256> }
    ext fn double_read() -> U256 reads State {
        let a = State.balances[sender()];
        let b = State.balances[sender()];
        return a + b;
    }
}
"#;
    let program = compile(source);
    let kinds = kinds_of(&program, "double_read");
    let addrs = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::StorageAddr { .. }))
        .count();
    let loads = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::StorageLoad { .. }))
        .count();
    assert_eq!((addrs, loads), (1, 1));
}

#[test]
fn store_invalidates_load_cache_but_keeps_address() {
    let source = r#"contract C {
    use std::evm::{sender};
    #[storage]
    struct State { balances: Table<Address, U256> }
    ext fn touch() -> U256 reads State writes State {
        let before = State.balances[sender()];
        State.balances[sender()] = before + 1;
        let after = State.balances[sender()];
        return after;
    }
}
"#;
    let program = compile(source);
    let kinds = kinds_of(&program, "touch");
    let addrs = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::StorageAddr { .. }))
        .count();
    let loads = kinds
        .iter()
        .filter(|k| matches!(k, InstKind::StorageLoad { .. }))
        .count();
    // One shared address; the store forces the second load.
    assert_eq!((addrs, loads), (1, 2));
}

#[test]
fn address_zero_const_evals_to_canonical() {
    let source = r#"contract C {
    use std::address::{zero};
    ext fn z() -> Address {
        return zero();
    }
}
"#;
    let program = compile(source);
    let kinds = kinds_of(&program, "z");
    assert!(
        !kinds.iter().any(|k| matches!(k, InstKind::Call { .. })),
        "intrinsic must not lower to a call"
    );
    let func = program.function("z").unwrap();
    let entry = func.block(func.entry);
    let Some(Terminator::Return { value: Some(v) }) = &entry.terminator else {
        panic!("expected RET with value");
    };
    assert_eq!(*v, program.constants.zero_addr);
}

#[test]
fn constructor_total_supply_writes_zero() {
    let program = compile(ERC20);
    let kinds = kinds_of(&program, "create");
    let stored = kinds
        .iter()
        .find_map(|k| match k {
            InstKind::StorageStore {
                slot: SlotRef::Literal(1),
                value,
            } => Some(*value),
            _ => None,
        })
        .expect("total_supply store");
    assert_eq!(stored, program.constants.zero);
}

#[test]
fn if_else_inserts_phi_for_rebound_variable() {
    let source = r#"contract C {
    ext fn pick(c: Bool) -> U256 {
        let mut x = 1;
        if c {
            x = 2;
        } else {
            x = 3;
        }
        return x;
    }
}
"#;
    let program = compile(source);
    let func = program.function("pick").unwrap();
    let join = func
        .live_blocks()
        .find(|(_, b)| b.label.starts_with("join"))
        .map(|(_, b)| b)
        .expect("join block");
    let phi = func.inst(join.insts[0]);
    let InstKind::Phi { incoming } = &phi.kind else {
        panic!("expected phi at join head, got {:?}", phi.kind);
    };
    assert_eq!(incoming.len(), 2);
    let Some(Terminator::Return { value: Some(ret) }) = &join.terminator else {
        panic!("join must return");
    };
    assert_eq!(*ret, phi.results[0]);
}

#[test]
fn sethi_ullman_orders_heavier_subtree_first() {
    // Right subtree needs two registers, left needs one: the right
    // side's loads are emitted first.
    let source = r#"contract C {
    #[storage]
    struct State { a: U256, b: U256, c: U256 }
    ext fn f() -> U256 reads State {
        return State.a + (State.b + State.c);
    }
}
"#;
    let program = compile(source);
    let kinds = kinds_of(&program, "f");
    let load_slots: Vec<u32> = kinds
        .iter()
        .filter_map(|k| match k {
            InstKind::StorageLoad {
                slot: SlotRef::Literal(n),
            } => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(load_slots, vec![1, 2, 0]);
}

#[test]
fn ties_evaluate_left_first() {
    let source = r#"contract C {
    #[storage]
    struct State { a: U256, b: U256 }
    ext fn f() -> U256 reads State {
        return State.a + State.b;
    }
}
"#;
    let program = compile(source);
    let kinds = kinds_of(&program, "f");
    let load_slots: Vec<u32> = kinds
        .iter()
        .filter_map(|k| match k {
            InstKind::StorageLoad {
                slot: SlotRef::Literal(n),
            } => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(load_slots, vec![0, 1]);
}

#[test]
fn program_cfg_records_entries_and_exits() {
    let program = compile(ERC20);
    let transfer_idx = program.function_index("transfer").unwrap();
    let create_idx = program.function_index("create").unwrap();

    let entries: Vec<usize> = program.cfg.entry_points.iter().map(|e| e.func).collect();
    assert!(entries.contains(&transfer_idx));
    assert!(entries.contains(&create_idx));

    assert!(program
        .cfg
        .failure_exits
        .iter()
        .any(|e| e.func == transfer_idx));
    assert!(program
        .cfg
        .success_exits
        .iter()
        .any(|e| e.func == transfer_idx));
}

#[test]
fn call_edges_link_to_callee_entries() {
    let source = r#"contract C {
    #[storage]
    struct State { x: U256 }
    fn helper() -> U256 reads State { return State.x; }
    ext fn outer() -> U256 reads State { return helper(); }
}
"#;
    let program = compile(source);
    let outer = program.function_index("outer").unwrap();
    let helper = program.function_index("helper").unwrap();
    assert!(program
        .cfg
        .call_edges
        .iter()
        .any(|e| e.from.func == outer && e.callee == helper));
}

#[test]
fn builder_refuses_programs_with_errors() {
    let source = "contract C { fn f() { return undefined_name; } }";
    let mut sink = DiagnosticSink::new();
    let contract = kanso_parser::parse("test.ks", source, &mut sink);
    let registry = kanso_analysis::analyze("test.ks", &contract, &mut sink);
    assert!(sink.has_errors());
    let result = build(&contract, &registry, &sink);
    assert!(matches!(
        result,
        Err(BuildError::DiagnosticsPresent { .. })
    ));
}

#[test]
fn require_message_is_evaluated_on_the_failing_path() {
    let program = compile(ERC20);
    let func = program.function("transfer").unwrap();
    let revert = func
        .live_blocks()
        .find(|(_, b)| b.label.starts_with("revert"))
        .map(|(_, b)| b)
        .expect("revert block");
    assert!(matches!(revert.terminator, Some(Terminator::Revert)));
    // The message constant lives in the revert block, not the hot path.
    assert!(revert.insts.iter().any(|id| matches!(
        &func.inst(*id).kind,
        InstKind::Constant {
            value: crate::inst::ConstVal::Str(_)
        }
    )));
}
