// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! End-to-end pipeline scenarios: concrete sources in, observable
//! behavior out.

use kanso::ast::{ContractItem, Statement};
use kanso::{codes, compile, compile_unoptimized, Severity};
use pretty_assertions::assert_eq;

/// An empty contract parses clean and lowers to a program with no
/// functions.
#[test]
fn empty_contract() {
    let outcome = compile("empty.ks", "contract Empty { }");
    assert!(outcome.success());
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(outcome.contract.name.name, "Empty");
    assert!(outcome.contract.items.is_empty());
    let program = outcome.program.expect("program");
    assert!(program.functions.is_empty());
}

/// Two `let x` in one scope: `E0009` anchored at the second binding.
#[test]
fn let_shadowing_in_same_scope() {
    let source = r#"contract C {
    fn f() {
        let x = 1;
        let x = 2;
    }
}
"#;
    let outcome = compile("shadow.ks", source);
    assert!(!outcome.success());
    let dup = outcome
        .diagnostics
        .iter()
        .find(|d| d.code == Some(codes::DUPLICATE_DECLARATION))
        .expect("E0009");
    assert_eq!(dup.position.line, 4);
    assert!(outcome.program.is_none(), "builder must refuse to run");
}

/// The ERC-20 transfer scenario: sender CSE'd, shared storage addresses,
/// one assume, the guarded SUB_CHK rewritten, the ADD_CHK preserved, and
/// a LOG3 with two topic arguments.
#[test]
fn erc20_transfer() {
    let source = r#"contract Token {
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
    let outcome = compile("token.ks", source);
    assert!(
        outcome.success(),
        "{}",
        outcome.render_diagnostics(source)
    );
    let program = outcome.program.expect("program");
    let text = kanso::print_program(&program);

    // One SENDER; two keyed addresses over slot 0; a single ASSUME.
    assert_eq!(text.matches("= SENDER").count(), 1);
    assert!(text.contains("keccak256(%sender . 0)"));
    assert!(text.contains("keccak256(%to . 0)"));
    assert_eq!(text.matches("ASSUME").count(), 1);

    // The require-guarded decrement became a plain SUB; the increment
    // kept its overflow check.
    assert!(!text.contains("SUB_CHK"));
    assert!(text.contains("= SUB "));
    assert!(text.contains("ADD_CHK"));

    // LOG3 = signature topic + 2 address topics.
    assert!(text.contains("LOG3 %sig_Transfer"));
}

/// `address::zero()` const-evals to the canonical `zero_addr`, never a
/// call.
#[test]
fn const_eval_of_address_zero() {
    let source = r#"contract C {
    use std::address::{zero};
    ext fn z() -> Address {
        return zero();
    }
}
"#;
    let outcome = compile("zero.ks", source);
    assert!(outcome.success());
    let text = kanso::print_program(&outcome.program.unwrap());
    assert!(!text.contains("CALL"));
    assert!(text.contains("RET %zero_addr"));
}

/// A missing semicolon yields one anchored diagnostic and a parse that
/// still contains both `let` statements.
#[test]
fn missing_semicolon_recovery() {
    let source = "contract C { fn f() { let x = 1 let y = 2; } }";
    let outcome = compile_unoptimized("semi.ks", source);

    let missing: Vec<_> = outcome
        .diagnostics
        .iter()
        .filter(|d| d.message == "missing semicolon")
        .collect();
    assert_eq!(missing.len(), 1);
    let one_end = source.find('1').unwrap() + 1;
    assert_eq!(missing[0].position.offset as usize, one_end);

    let ContractItem::Function(f) = &outcome.contract.items[0] else {
        panic!("expected function");
    };
    let lets = f
        .body
        .statements
        .iter()
        .filter(|s| matches!(s, Statement::Let { .. }))
        .count();
    assert_eq!(lets, 2);
}

/// `balace()` near a declared `balance` gets `E0002` plus a did-you-mean.
#[test]
fn unknown_function_with_suggestion() {
    let source = r#"contract C {
    fn balance() -> U256 { return 1; }
    ext fn f() -> U256 { return balace(); }
}
"#;
    let outcome = compile("suggest.ks", source);
    assert!(!outcome.success());
    let diag = outcome
        .diagnostics
        .iter()
        .find(|d| d.code == Some(codes::UNDEFINED_FUNCTION))
        .expect("E0002");
    assert_eq!(diag.severity, Severity::Error);
    assert!(diag
        .suggestions
        .iter()
        .any(|s| s.message == "did you mean `balance`?"));
}

/// Warnings alone leave the pipeline successful: the program still
/// builds and the driver would exit 0 only without errors.
#[test]
fn warnings_do_not_block_lowering() {
    let source = r#"contract C {
    ext fn f() {
        let unused = 1;
    }
}
"#;
    let outcome = compile("warn.ks", source);
    assert!(outcome.success());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.code == Some(codes::UNUSED_VARIABLE)));
    assert!(outcome.program.is_some());
}

/// Rendering shows the caret frame for a semantic error.
#[test]
fn rendered_diagnostic_frame() {
    let source = "contract C {\n    fn f() {\n        let x = amout;\n    }\n}\n";
    let outcome = compile("render.ks", source);
    let rendered = outcome.render_diagnostics(source);
    assert!(rendered.contains("error[E0001]: undefined variable `amout`"));
    assert!(rendered.contains(" --> render.ks:3:17"));
    assert!(rendered.contains("^^^^^"));
}
