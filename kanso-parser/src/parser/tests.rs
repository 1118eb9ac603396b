// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

use super::parse;
use crate::ast::*;
use kanso_core::DiagnosticSink;
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> Contract {
    let mut sink = DiagnosticSink::new();
    let contract = parse("test.ks", source, &mut sink);
    let rendered: Vec<String> = sink.iter().map(|d| d.render(source)).collect();
    assert!(
        !sink.has_errors(),
        "unexpected diagnostics:\n{}",
        rendered.join("\n")
    );
    contract
}

fn parse_with_diags(source: &str) -> (Contract, DiagnosticSink) {
    let mut sink = DiagnosticSink::new();
    let contract = parse("test.ks", source, &mut sink);
    (contract, sink)
}

/// Statements of the only function in `source`.
fn body_of(source: &str) -> Vec<Statement> {
    let contract = parse_ok(source);
    for item in contract.items {
        if let ContractItem::Function(f) = item {
            return f.body.statements;
        }
    }
    panic!("no function in source");
}

fn expr_stmt(stmt: &Statement) -> &Expr {
    match stmt {
        Statement::Expr { expr, .. } => expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn empty_contract_parses_clean() {
    let source = "contract Empty { }";
    let (contract, sink) = parse_with_diags(source);
    assert!(sink.is_empty());
    assert_eq!(contract.name.name, "Empty");
    assert!(contract.items.is_empty());
    assert_eq!(contract.span.text(source), source);
}

#[test]
fn node_spans_round_trip_to_source() {
    let source = "contract C {\n    fn f(a: U256) -> U256 {\n        a + 1\n    }\n}\n";
    let contract = parse_ok(source);
    let ContractItem::Function(f) = &contract.items[0] else {
        panic!("expected function");
    };
    assert_eq!(
        f.span.text(source),
        "fn f(a: U256) -> U256 {\n        a + 1\n    }"
    );
    let tail = f.body.tail_expr().unwrap();
    assert_eq!(tail.span().text(source), "a + 1");
}

#[test]
fn use_declarations_both_forms() {
    let contract = parse_ok(
        "contract C {\n    use Table;\n    use std::evm::{sender, emit};\n}",
    );
    let ContractItem::Use(table) = &contract.items[0] else {
        panic!()
    };
    assert_eq!(table.module_path(), "Table");
    assert_eq!(table.items, None);

    let ContractItem::Use(evm) = &contract.items[1] else {
        panic!()
    };
    assert_eq!(evm.module_path(), "std::evm");
    let names: Vec<&str> = evm
        .items
        .as_ref()
        .unwrap()
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, ["sender", "emit"]);
}

#[test]
fn struct_with_attribute_and_doc() {
    let contract = parse_ok(
        "contract C {\n    /// Persistent balances.\n    #[storage]\n    struct State { balances: Table<Address, U256>, total_supply: U256 }\n}",
    );
    let ContractItem::Struct(s) = &contract.items[0] else {
        panic!()
    };
    assert_eq!(s.attribute.as_ref().unwrap().name, "storage");
    assert_eq!(s.doc.as_ref().unwrap().text, "/// Persistent balances.");
    assert_eq!(s.fields.len(), 2);
    let VariableType::Named { name, generics, .. } = &s.fields[0].ty else {
        panic!()
    };
    assert_eq!(name.name, "Table");
    assert_eq!(generics.len(), 2);
}

#[test]
fn function_header_clauses() {
    let contract = parse_ok(
        "contract C {\n    ext fn transfer(to: Address, amount: U256) -> Bool reads State writes State {\n        return true;\n    }\n}",
    );
    let ContractItem::Function(f) = &contract.items[0] else {
        panic!()
    };
    assert!(f.external);
    assert_eq!(f.name.name, "transfer");
    assert_eq!(f.params.len(), 2);
    assert_eq!(f.return_type.as_ref().unwrap().name(), Some("Bool"));
    assert_eq!(f.reads.len(), 1);
    assert_eq!(f.writes[0].name, "State");
}

#[test]
fn precedence_and_associativity() {
    let stmts = body_of("contract C { fn f() { a + b * c == d - e; } }");
    let Expr::Binary { op, left, right, .. } = expr_stmt(&stmts[0]) else {
        panic!()
    };
    // `==` is the root: (a + (b * c)) == (d - e)
    assert_eq!(*op, BinaryOp::Eq);
    let Expr::Binary { op: lop, right: lr, .. } = left.as_ref() else {
        panic!()
    };
    assert_eq!(*lop, BinaryOp::Add);
    assert!(matches!(
        lr.as_ref(),
        Expr::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
    assert!(matches!(
        right.as_ref(),
        Expr::Binary {
            op: BinaryOp::Sub,
            ..
        }
    ));
}

#[test]
fn left_associative_chains() {
    let stmts = body_of("contract C { fn f() { a - b - c; } }");
    let Expr::Binary { left, .. } = expr_stmt(&stmts[0]) else {
        panic!()
    };
    // (a - b) - c
    assert!(matches!(
        left.as_ref(),
        Expr::Binary {
            op: BinaryOp::Sub,
            ..
        }
    ));
}

#[test]
fn postfix_chain_binds_tightest() {
    let stmts = body_of("contract C { fn f() { State.balances[k].len(); } }");
    let Expr::Call { callee, .. } = expr_stmt(&stmts[0]) else {
        panic!()
    };
    let Expr::Field { target, field, .. } = callee.as_ref() else {
        panic!()
    };
    assert_eq!(field.name, "len");
    assert!(matches!(target.as_ref(), Expr::Index { .. }));
}

#[test]
fn unary_binds_tighter_than_binary() {
    let stmts = body_of("contract C { fn f() { !a && b; } }");
    let Expr::Binary { op, left, .. } = expr_stmt(&stmts[0]) else {
        panic!()
    };
    assert_eq!(*op, BinaryOp::And);
    assert!(matches!(
        left.as_ref(),
        Expr::Unary {
            op: UnaryOp::Not,
            ..
        }
    ));
}

#[test]
fn ref_mut_prefix() {
    let stmts = body_of("contract C { fn f() { &mut v; } }");
    assert!(matches!(
        expr_stmt(&stmts[0]),
        Expr::Unary {
            op: UnaryOp::Ref { mutable: true },
            ..
        }
    ));
}

#[test]
fn paren_vs_tuple() {
    let stmts = body_of("contract C { fn f() { (a); (a,); (); (a, b); } }");
    assert!(matches!(expr_stmt(&stmts[0]), Expr::Paren { .. }));
    let Expr::Tuple { elements, .. } = expr_stmt(&stmts[1]) else {
        panic!()
    };
    assert_eq!(elements.len(), 1);
    let Expr::Tuple { elements, .. } = expr_stmt(&stmts[2]) else {
        panic!()
    };
    assert!(elements.is_empty());
    let Expr::Tuple { elements, .. } = expr_stmt(&stmts[3]) else {
        panic!()
    };
    assert_eq!(elements.len(), 2);
}

#[test]
fn generic_call_vs_comparison() {
    // Three-token look-ahead: `empty<U256>()` is a generic call…
    let stmts = body_of("contract C { fn f() { empty<U256>(); } }");
    let Expr::Call { generics, .. } = expr_stmt(&stmts[0]) else {
        panic!("expected call, got {:?}", stmts[0]);
    };
    assert_eq!(generics.len(), 1);

    // …while `a < b` stays a comparison even though `a` is a callee path.
    let stmts = body_of("contract C { fn f() { a < b; } }");
    assert!(matches!(
        expr_stmt(&stmts[0]),
        Expr::Binary {
            op: BinaryOp::Lt,
            ..
        }
    ));
}

#[test]
fn path_calls_parse() {
    let stmts = body_of("contract C { fn f() { std::address::zero(); } }");
    let Expr::Call { callee, args, .. } = expr_stmt(&stmts[0]) else {
        panic!()
    };
    let Expr::Path { segments, .. } = callee.as_ref() else {
        panic!()
    };
    let names: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["std", "address", "zero"]);
    assert!(args.is_empty());
}

#[test]
fn struct_literal_vs_if_block() {
    let stmts = body_of(
        "contract C { fn f() { emit(Transfer{from: a, to: b, value: v}); if x { return; } } }",
    );
    let Expr::Call { args, .. } = expr_stmt(&stmts[0]) else {
        panic!()
    };
    let Expr::StructLit { name, fields, .. } = &args[0] else {
        panic!("expected struct literal, got {:?}", args[0]);
    };
    assert_eq!(name.name, "Transfer");
    assert_eq!(fields.len(), 3);

    let Statement::If(if_stmt) = &stmts[1] else {
        panic!("expected if, got {:?}", stmts[1]);
    };
    assert!(matches!(if_stmt.cond, Expr::Ident(_)));
}

#[test]
fn else_if_nests() {
    let stmts = body_of("contract C { fn f() { if a { } else if b { } else { } } }");
    let Statement::If(if_stmt) = &stmts[0] else {
        panic!()
    };
    let else_block = if_stmt.else_block.as_ref().unwrap();
    let Statement::If(nested) = &else_block.statements[0] else {
        panic!()
    };
    assert!(nested.else_block.is_some());
}

#[test]
fn assignment_disambiguation() {
    let stmts = body_of(
        "contract C { fn f() { x = 1; State.total_supply += 2; State.balances[k] -= 3; g(); } }",
    );
    assert!(matches!(
        &stmts[0],
        Statement::Assign {
            op: AssignOp::Assign,
            target: Expr::Ident(_),
            ..
        }
    ));
    assert!(matches!(
        &stmts[1],
        Statement::Assign {
            op: AssignOp::AddAssign,
            target: Expr::Field { .. },
            ..
        }
    ));
    assert!(matches!(
        &stmts[2],
        Statement::Assign {
            op: AssignOp::SubAssign,
            target: Expr::Index { .. },
            ..
        }
    ));
    assert!(matches!(
        &stmts[3],
        Statement::Expr {
            expr: Expr::Call { .. },
            semicolon: true,
            ..
        }
    ));
}

#[test]
fn tail_expression_is_last_unterminated_expr() {
    let source = "contract C { fn f() -> U256 { let x = 1; x } }";
    let contract = parse_ok(source);
    let ContractItem::Function(f) = &contract.items[0] else {
        panic!()
    };
    let tail = f.body.tail_expr().unwrap();
    assert!(matches!(tail, Expr::Ident(i) if i.name == "x"));
}

#[test]
fn require_statement() {
    let stmts = body_of("contract C { fn f() { require!(a >= b, \"too small\"); } }");
    let Statement::Require { args, .. } = &stmts[0] else {
        panic!()
    };
    assert_eq!(args.len(), 2);
    assert!(matches!(
        &args[0],
        Expr::Binary {
            op: BinaryOp::GtEq,
            ..
        }
    ));
}

#[test]
fn missing_semicolon_recovers_with_both_lets() {
    let source = "contract C { fn f() { let x = 1 let y = 2; } }";
    let (contract, sink) = parse_with_diags(source);

    let diags: Vec<_> = sink.iter().collect();
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].message, "missing semicolon");
    // Anchored at the end of the `1` expression.
    let one_end = source.find("1").unwrap() + 1;
    assert_eq!(diags[0].position.offset as usize, one_end);

    let ContractItem::Function(f) = &contract.items[0] else {
        panic!()
    };
    let lets: Vec<_> = f
        .body
        .statements
        .iter()
        .filter(|s| matches!(s, Statement::Let { .. }))
        .collect();
    assert_eq!(lets.len(), 2);
}

#[test]
fn malformed_item_yields_bad_placeholder_and_recovery() {
    let source = "contract C { 42 fn ok() { } }";
    let (contract, sink) = parse_with_diags(source);
    assert!(sink.has_errors());
    assert!(matches!(&contract.items[0], ContractItem::Bad(_)));
    assert!(contract
        .items
        .iter()
        .any(|i| matches!(i, ContractItem::Function(f) if f.name.name == "ok")));
}

#[test]
fn malformed_expression_yields_bad_placeholder() {
    let source = "contract C { fn f() { let x = ; } }";
    let (contract, sink) = parse_with_diags(source);
    assert!(sink.has_errors());
    let ContractItem::Function(f) = &contract.items[0] else {
        panic!()
    };
    let Statement::Let { init, .. } = &f.body.statements[0] else {
        panic!()
    };
    assert!(init.as_ref().unwrap().is_bad());
}

#[test]
fn parser_is_total_on_garbage() {
    for source in [
        "",
        "fn",
        "contract",
        "contract C",
        "contract C {",
        "contract C { fn }",
        "contract C { struct S { } fn f( } }",
        "}}}{{{",
        "contract C { fn f() { if } }",
        "contract C { #[ }",
    ] {
        let mut sink = DiagnosticSink::new();
        let _ = parse("t.ks", source, &mut sink);
    }
}

#[test]
fn comments_are_retained_as_items_and_statements() {
    let contract = parse_ok(
        "// header\ncontract C {\n    // between items\n    fn f() {\n        // in body\n        let x = 1;\n    }\n}",
    );
    assert_eq!(contract.leading_comments.len(), 1);
    assert!(matches!(&contract.items[0], ContractItem::Comment(c) if c.text == "// between items"));
    let ContractItem::Function(f) = &contract.items[1] else {
        panic!()
    };
    assert!(matches!(&f.body.statements[0], Statement::Comment(_)));
}

#[test]
fn doc_comment_attaches_to_following_function() {
    let contract = parse_ok("contract C {\n    /// Transfers funds.\n    ext fn t() { }\n}");
    let ContractItem::Function(f) = &contract.items[0] else {
        panic!()
    };
    assert_eq!(f.doc.as_ref().unwrap().text, "/// Transfers funds.");
}

#[test]
fn let_forms() {
    let stmts = body_of("contract C { fn f() { let a = 1; let mut b: U256 = 2; let mut c: Bool; } }");
    assert!(matches!(
        &stmts[0],
        Statement::Let {
            mutable: false,
            ty: None,
            init: Some(_),
            ..
        }
    ));
    assert!(matches!(
        &stmts[1],
        Statement::Let {
            mutable: true,
            ty: Some(_),
            init: Some(_),
            ..
        }
    ));
    assert!(matches!(
        &stmts[2],
        Statement::Let {
            mutable: true,
            ty: Some(_),
            init: None,
            ..
        }
    ));
}

#[test]
fn tuple_types_parse() {
    let contract = parse_ok(
        "contract C { #[storage] struct S { allowances: Table<(Address, Address), U256> } }",
    );
    let ContractItem::Struct(s) = &contract.items[0] else {
        panic!()
    };
    let VariableType::Named { generics, .. } = &s.fields[0].ty else {
        panic!()
    };
    assert!(matches!(&generics[0], VariableType::Tuple { elements, .. } if elements.len() == 2));
}
