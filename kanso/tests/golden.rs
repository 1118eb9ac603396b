// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Golden tests over the stable IR text form.

use kanso::{compile_unoptimized, print_program};
use pretty_assertions::assert_eq;

#[test]
fn counter_program_prints_byte_stable() {
    let source = r#"contract Counter {
    #[storage]
    struct State { count: U256 }

    ext fn increment() writes State {
        State.count += 1;
    }
}
"#;
    let outcome = compile_unoptimized("counter.ks", source);
    assert!(outcome.success(), "{}", outcome.render_diagnostics(source));
    let text = print_program(outcome.program.as_ref().unwrap());

    let expected = "\
contract Counter

storage:
  slot[0] count: U256

; address constructors

events:

; helpers

constants:
  %true: Bool
  %false: Bool
  %zero: U256
  %zero_addr: Address

ext fn increment() writes State {
entry:
  %t0 = SLOAD slot[0] ; read(Storage)
  %t1 = CONST 1
  %t2, %t2_ok = ADD_CHK %t0, %t1 ; revert(Storage)
  SSTORE slot[0], %t2 ; write(Storage)
  RET
}

cfg:
  entry: increment/entry
  success: increment/entry
  failure: -
";
    assert_eq!(text, expected);
}

#[test]
fn printing_is_stable_across_runs() {
    let source = r#"contract Token {
    use std::evm::{sender, emit};

    #[storage]
    struct State { balances: Table<Address, U256>, total_supply: U256 }

    #[event]
    struct Transfer { from: Address, to: Address, value: U256 }

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
    let first = compile_unoptimized("token.ks", source);
    let second = compile_unoptimized("token.ks", source);
    assert_eq!(
        print_program(first.program.as_ref().unwrap()),
        print_program(second.program.as_ref().unwrap())
    );
}

#[test]
fn keyed_access_and_event_sections_render_canonically() {
    let source = r#"contract Token {
    use std::evm::{sender, emit};

    #[storage]
    struct State { balances: Table<Address, U256> }

    #[event]
    struct Transfer { from: Address, to: Address, value: U256 }

    ext fn transfer(to: Address, amount: U256) reads State writes State {
        State.balances[sender()] -= amount;
        State.balances[to] += amount;
        emit(Transfer { from: sender(), to: to, value: amount });
    }
}
"#;
    let outcome = compile_unoptimized("token.ks", source);
    assert!(outcome.success(), "{}", outcome.render_diagnostics(source));
    let text = print_program(outcome.program.as_ref().unwrap());

    // Storage layout line.
    assert!(text.contains("  slot[0] balances: Slots<Address, U256>"));

    // Event signature with the well-known Transfer topic hash.
    assert!(text.contains(
        "  %sig_Transfer = Transfer(address,address,uint256) ; keccak256 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    ));

    // Keyed stores inline their address computation.
    assert!(text.contains("SSTORE keccak256(%sender . 0), "));
    assert!(text.contains("SSTORE keccak256(%to . 0), "));

    // Checked arithmetic renders as a value/ok pair.
    assert!(text.contains("_ok = SUB_CHK "));
    assert!(text.contains("_ok = ADD_CHK "));

    // Event plumbing: topics, data encoding, the log itself.
    assert!(text.contains("= TOPIC_ADDR %sender"));
    assert!(text.contains("= TOPIC_ADDR %to"));
    assert!(text.contains("= ABI_ENC_U256 %amount ; allocate(Memory), write(Memory)"));
    assert!(text.contains("LOG3 %sig_Transfer"));
}
