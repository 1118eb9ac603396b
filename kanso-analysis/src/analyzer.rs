// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The semantic analyzer.
//!
//! Phases run in a fixed order: collect declarations, resolve imports,
//! validate attributes, validate contract-shape rules, type-check function
//! bodies, then flow and use analysis. Recovery placeholders from the
//! parser (`Bad*` nodes) are treated as opaque and never rechecked, so one
//! parse error does not fan out into semantic noise.

use crate::catalog::{self, CatalogFn, TypeRef};
use crate::flow;
use crate::registry::*;
use crate::scope::{ScopeStack, Variable};
use crate::types::SemType;
use kanso_core::diagnostics::{closest_match, codes, suggest_candidates};
use kanso_core::{Diagnostic, DiagnosticSink, Span, Suggestion};
use kanso_parser::ast::*;
use log::debug;
use std::collections::BTreeMap;

/// Analyzes `contract`, reporting into `sink` and returning the resolved
/// context registry.
pub fn analyze(file: &str, contract: &Contract, sink: &mut DiagnosticSink) -> ContextRegistry {
    let mut analyzer = Analyzer {
        file,
        sink,
        registry: ContextRegistry {
            contract_name: contract.name.name.clone(),
            ..ContextRegistry::default()
        },
        scopes: ScopeStack::new(),
        current: None,
    };
    analyzer.run(contract);
    analyzer.registry
}

/// Reads/writes context of the function currently being checked.
#[derive(Debug, Clone)]
struct FnCtx {
    name: String,
    return_type: Option<SemType>,
    reads: Vec<String>,
    writes: Vec<String>,
}

impl FnCtx {
    fn can_read(&self, name: &str) -> bool {
        self.reads.iter().any(|r| r == name) || self.can_write(name)
    }

    fn can_write(&self, name: &str) -> bool {
        self.writes.iter().any(|w| w == name)
    }
}

pub(crate) struct Analyzer<'a> {
    file: &'a str,
    sink: &'a mut DiagnosticSink,
    registry: ContextRegistry,
    scopes: ScopeStack,
    current: Option<FnCtx>,
}

impl Analyzer<'_> {
    fn run(&mut self, contract: &Contract) {
        debug!("analyzing contract `{}`", contract.name.name);
        self.resolve_imports(contract);
        self.collect_declarations(contract);
        self.validate_attributes(contract);
        self.validate_contract_shape(contract);
        for item in &contract.items {
            if let ContractItem::Function(decl) = item {
                self.check_function(decl);
            }
        }
    }

    // === Diagnostic helpers =============================================

    pub(crate) fn error(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.sink.push(
            Diagnostic::error(message, self.file, span.start, span.len().max(1)).with_code(code),
        );
    }

    fn error_with(&mut self, diag: Diagnostic) {
        self.sink.push(diag);
    }

    pub(crate) fn warn(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.sink.push(
            Diagnostic::warning(message, self.file, span.start, span.len().max(1)).with_code(code),
        );
    }

    // === Phase 1: collect declarations ==================================

    fn collect_declarations(&mut self, contract: &Contract) {
        debug!("phase: collect declarations");
        let mut seen: BTreeMap<String, Span> = BTreeMap::new();

        for item in &contract.items {
            let name_ident = match item {
                ContractItem::Struct(s) => &s.name,
                ContractItem::Function(f) => &f.name,
                _ => continue,
            };
            if name_ident.name.is_empty() {
                continue; // recovery placeholder name
            }
            if let Some(previous) = seen.get(&name_ident.name) {
                let diag = Diagnostic::error(
                    format!("duplicate declaration of `{}`", name_ident.name),
                    self.file,
                    name_ident.span.start,
                    name_ident.span.len().max(1),
                )
                .with_code(codes::DUPLICATE_DECLARATION)
                .with_note(format!(
                    "`{}` was first declared at {}",
                    name_ident.name, previous.start
                ));
                self.error_with(diag);
            } else {
                seen.insert(name_ident.name.clone(), name_ident.span);
            }
        }

        // Struct infos must exist before function signatures resolve, so
        // parameters may reference contract structs.
        for item in &contract.items {
            if let ContractItem::Struct(s) = item {
                let attr = s.attribute.as_ref().and_then(|a| match a.name.as_str() {
                    "storage" => Some(StructAttr::Storage),
                    "event" => Some(StructAttr::Event),
                    _ => None,
                });
                let fields = s
                    .fields
                    .iter()
                    .map(|f| (f.name.name.clone(), self.resolve_type(&f.ty)))
                    .collect();
                self.registry.structs.push(StructInfo {
                    name: s.name.name.clone(),
                    attr,
                    fields,
                });
            }
        }

        for item in &contract.items {
            if let ContractItem::Function(f) = item {
                let params = f
                    .params
                    .iter()
                    .map(|p| (p.name.name.clone(), self.resolve_type(&p.ty)))
                    .collect();
                let return_type = f.return_type.as_ref().map(|t| self.resolve_type(t));
                self.registry.functions.push(FunctionInfo {
                    name: f.name.name.clone(),
                    external: f.external,
                    create: f.attribute.as_ref().is_some_and(|a| a.name == "create"),
                    params,
                    return_type,
                    reads: f.reads.iter().map(|i| i.name.clone()).collect(),
                    writes: f.writes.iter().map(|i| i.name.clone()).collect(),
                });
            }
        }
    }

    // === Phase 2: resolve imports =======================================

    fn resolve_imports(&mut self, contract: &Contract) {
        debug!("phase: resolve imports");
        for item in &contract.items {
            let ContractItem::Use(use_decl) = item else {
                continue;
            };
            let path = use_decl.module_path();
            let Some(module) = catalog::module(&path) else {
                self.error(
                    codes::UNDEFINED_MODULE,
                    format!("undefined module `{path}`"),
                    use_decl.span,
                );
                continue;
            };

            match &use_decl.items {
                None => {
                    // `use Table;` binds the trailing segment as a module.
                    let name = use_decl.path.last().expect("non-empty path").name.clone();
                    self.registry.imports.insert(
                        name,
                        ImportBinding {
                            module: path.clone(),
                            kind: ImportKind::Module,
                            signature: None,
                        },
                    );
                }
                Some(names) => {
                    for name in names {
                        if let Some(func) = module.function(&name.name) {
                            self.registry.imports.insert(
                                name.name.clone(),
                                ImportBinding {
                                    module: path.clone(),
                                    kind: ImportKind::Function,
                                    signature: Some(func.clone()),
                                },
                            );
                        } else if module.type_export(&name.name).is_some() {
                            self.registry.imports.insert(
                                name.name.clone(),
                                ImportBinding {
                                    module: path.clone(),
                                    kind: ImportKind::Type,
                                    signature: None,
                                },
                            );
                        } else {
                            let mut diag = Diagnostic::error(
                                format!("module `{path}` has no export `{}`", name.name),
                                self.file,
                                name.span.start,
                                name.span.len().max(1),
                            )
                            .with_code(codes::UNDEFINED_MODULE);
                            let exports: Vec<&str> = module
                                .functions
                                .iter()
                                .map(|f| f.name)
                                .chain(module.types.iter().map(|t| t.name))
                                .collect();
                            if let Some(close) = closest_match(&name.name, exports) {
                                diag = diag.with_suggestion(
                                    Suggestion::new(
                                        format!("did you mean `{close}`?"),
                                        name.span.start,
                                        name.span.len(),
                                    )
                                    .replacing(close),
                                );
                            }
                            self.error_with(diag);
                        }
                    }
                }
            }
        }
    }

    // === Phase 3: validate attributes ===================================

    fn validate_attributes(&mut self, contract: &Contract) {
        debug!("phase: validate attributes");
        for item in &contract.items {
            match item {
                ContractItem::Struct(s) => {
                    if let Some(attr) = &s.attribute {
                        if !matches!(attr.name.as_str(), "storage" | "event") {
                            self.invalid_attribute(attr, &["storage", "event"]);
                        }
                    }
                }
                ContractItem::Function(f) => {
                    if let Some(attr) = &f.attribute {
                        if attr.name != "create" {
                            self.invalid_attribute(attr, &["create"]);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn invalid_attribute(&mut self, attr: &Ident, valid: &[&'static str]) {
        let mut diag = Diagnostic::error(
            format!("invalid attribute `{}`", attr.name),
            self.file,
            attr.span.start,
            attr.span.len().max(1),
        )
        .with_code(codes::INVALID_ATTRIBUTE)
        .with_note(format!("valid attributes here: {}", valid.join(", ")));
        if let Some(close) = closest_match(&attr.name, valid.iter().copied()) {
            diag = diag.with_suggestion(
                Suggestion::new(
                    format!("did you mean `{close}`?"),
                    attr.span.start,
                    attr.span.len(),
                )
                .replacing(close),
            );
        }
        self.error_with(diag);
    }

    // === Phase 4: contract-shape rules ==================================

    fn validate_contract_shape(&mut self, contract: &Contract) {
        debug!("phase: contract shape");

        // At most one #[storage] struct.
        for item in &contract.items {
            let ContractItem::Struct(s) = item else {
                continue;
            };
            let Some(attr) = self
                .registry
                .struct_info(&s.name.name)
                .and_then(|info| info.attr)
            else {
                continue;
            };
            match attr {
                StructAttr::Storage => {
                    if let Some(first) = &self.registry.storage_struct {
                        let message = format!(
                            "contract `{}` already has storage struct `{first}`; at most one `#[storage]` struct is allowed",
                            self.registry.contract_name
                        );
                        self.error(codes::INVALID_ATTRIBUTE, message, s.name.span);
                    } else {
                        self.registry.storage_struct = Some(s.name.name.clone());
                    }
                }
                StructAttr::Event => self.registry.events.push(s.name.name.clone()),
            }
        }

        for item in &contract.items {
            let ContractItem::Function(f) = item else {
                continue;
            };

            // reads/writes may only name #[storage] structs.
            for name in f.reads.iter().chain(&f.writes) {
                if name.name.is_empty() {
                    continue;
                }
                let valid = self
                    .registry
                    .struct_info(&name.name)
                    .is_some_and(|s| s.attr == Some(StructAttr::Storage));
                if !valid {
                    self.error(
                        codes::INVALID_READS_WRITES,
                        format!(
                            "`{}` is not a `#[storage]` struct and cannot appear in reads/writes",
                            name.name
                        ),
                        name.span,
                    );
                }
            }

            // #[create] shape: no return type, `writes State` exactly.
            let is_create = f.attribute.as_ref().is_some_and(|a| a.name == "create");
            if is_create {
                if f.return_type.is_some() {
                    self.error(
                        codes::INVALID_CONSTRUCTOR,
                        "a `#[create]` function cannot declare a return type",
                        f.name.span,
                    );
                }
                let storage = self.registry.storage_struct.clone();
                let writes: Vec<&str> = f.writes.iter().map(|w| w.name.as_str()).collect();
                let expected = storage.as_deref().map(|s| vec![s]).unwrap_or_default();
                if writes != expected {
                    let message = match storage {
                        Some(s) => format!("a `#[create]` function must declare `writes {s}` exactly"),
                        None => "a `#[create]` function requires a `#[storage]` struct to initialize".to_string(),
                    };
                    self.error(codes::INVALID_CONSTRUCTOR, message, f.name.span);
                }
            }
        }
    }

    // === Type resolution ================================================

    fn resolve_type(&mut self, ty: &VariableType) -> SemType {
        match ty {
            VariableType::Tuple { elements, .. } => {
                SemType::Tuple(elements.iter().map(|e| self.resolve_type(e)).collect())
            }
            VariableType::Named { name, generics, span } => {
                if let Some(builtin) = SemType::builtin(&name.name) {
                    if !generics.is_empty() {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("type `{}` takes no generic arguments", name.name),
                            *span,
                        );
                    }
                    return builtin;
                }
                match name.name.as_str() {
                    "Table" => {
                        if generics.len() != 2 {
                            self.error(
                                codes::TYPE_MISMATCH,
                                "`Table` requires exactly two generic arguments",
                                *span,
                            );
                            return SemType::Error;
                        }
                        let key = self.resolve_type(&generics[0]);
                        let value = self.resolve_type(&generics[1]);
                        SemType::Table(Box::new(key), Box::new(value))
                    }
                    "Vector" => {
                        if generics.len() != 1 {
                            self.error(
                                codes::TYPE_MISMATCH,
                                "`Vector` requires exactly one generic argument",
                                *span,
                            );
                            return SemType::Error;
                        }
                        SemType::Vector(Box::new(self.resolve_type(&generics[0])))
                    }
                    _ => {
                        if self.registry.struct_info(&name.name).is_some() {
                            return SemType::Struct(name.name.clone());
                        }
                        if name.name.is_empty() {
                            return SemType::Error; // recovery placeholder
                        }
                        let mut diag = Diagnostic::error(
                            format!("unknown type `{}`", name.name),
                            self.file,
                            span.start,
                            span.len().max(1),
                        );
                        let candidates: Vec<String> = self
                            .registry
                            .structs
                            .iter()
                            .map(|s| s.name.clone())
                            .chain(
                                ["U256", "U128", "U64", "U32", "U16", "U8", "Bool", "Address",
                                 "String", "Table", "Vector"]
                                    .into_iter()
                                    .map(String::from),
                            )
                            .collect();
                        if let Some(close) =
                            closest_match(&name.name, candidates.iter().map(|s| s.as_str()))
                        {
                            diag = diag.with_suggestion(
                                Suggestion::new(
                                    format!("did you mean `{close}`?"),
                                    span.start,
                                    span.len(),
                                )
                                .replacing(close),
                            );
                        }
                        self.error_with(diag);
                        SemType::Error
                    }
                }
            }
        }
    }

    /// Maps a catalog [`TypeRef`] to a semantic type, consulting `bindings`
    /// for generic parameters.
    fn typeref_to_sem(&self, tr: &TypeRef, bindings: &BTreeMap<&str, SemType>) -> SemType {
        match tr {
            TypeRef::Param(p) => bindings.get(*p).cloned().unwrap_or(SemType::Error),
            TypeRef::Named { name, args } => match *name {
                "Table" if args.len() == 2 => SemType::Table(
                    Box::new(self.typeref_to_sem(&args[0], bindings)),
                    Box::new(self.typeref_to_sem(&args[1], bindings)),
                ),
                "Vector" if args.len() == 1 => {
                    SemType::Vector(Box::new(self.typeref_to_sem(&args[0], bindings)))
                }
                other => SemType::builtin(other).unwrap_or(SemType::Error),
            },
        }
    }

    // === Phase 5: function bodies =======================================

    fn check_function(&mut self, decl: &FunctionDecl) {
        let Some(info) = self.registry.function_info(&decl.name.name).cloned() else {
            return;
        };
        debug!("checking function `{}`", info.name);

        self.current = Some(FnCtx {
            name: info.name.clone(),
            return_type: info.return_type.clone(),
            reads: info.reads.clone(),
            writes: info.writes.clone(),
        });

        self.scopes = ScopeStack::new();
        self.scopes.push();
        for (i, (name, ty)) in info.params.iter().enumerate() {
            let span = decl.params.get(i).map(|p| p.name.span).unwrap_or_default();
            let _ = self.scopes.declare(Variable {
                name: name.clone(),
                ty: ty.clone(),
                mutable: false,
                initialized: true,
                used: true, // parameters are exempt from unused warnings
                span,
            });
        }

        self.check_block_statements(&decl.body, false);

        // The function body's tail expression is its implicit return value.
        if let Some(tail) = decl.body.tail_expr() {
            match info.return_type.clone() {
                Some(ret) => {
                    let got = self.check_expr(tail, Some(&ret));
                    if !got.compatible(&ret) {
                        self.error(
                            codes::INVALID_RETURN_TYPE,
                            format!("expected `{ret}` as the function's value, found `{got}`"),
                            tail.span(),
                        );
                    }
                }
                None => {
                    self.check_expr(tail, None);
                }
            }
        }

        // Phase 6: flow analysis.
        flow::check_function(self, decl, &info);

        // Phase 7: use analysis.
        let vars = self.scopes.drain_all();
        for var in vars {
            if !var.used && !var.name.starts_with('_') {
                let diag = Diagnostic::warning(
                    format!("unused variable `{}`", var.name),
                    self.file,
                    var.span.start,
                    var.span.len().max(1),
                )
                .with_code(codes::UNUSED_VARIABLE)
                .with_suggestion(
                    Suggestion::new(
                        format!("prefix it with an underscore: `_{}`", var.name),
                        var.span.start,
                        var.span.len(),
                    )
                    .replacing(format!("_{}", var.name)),
                );
                self.error_with(diag);
            }
        }

        self.current = None;
    }

    /// Checks a block's statements. At function-body level (`new_scope`
    /// false) the tail expression is left to the caller, which checks it
    /// against the return type; nested blocks check everything.
    pub(crate) fn check_block_statements(&mut self, block: &Block, new_scope: bool) {
        if new_scope {
            self.scopes.push();
        }
        for (i, stmt) in block.statements.iter().enumerate() {
            let is_function_tail = !new_scope
                && i + 1 == block.statements.len()
                && matches!(stmt, Statement::Expr { semicolon: false, .. });
            if !is_function_tail {
                self.check_statement(stmt);
            }
        }
        if new_scope {
            self.scopes.pop();
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Comment(_) => {}
            Statement::Let {
                mutable,
                name,
                ty,
                init,
                span,
            } => self.check_let(*mutable, name, ty.as_ref(), init.as_ref(), *span),
            Statement::Assign {
                target, op, value, ..
            } => self.check_assign(target, *op, value),
            Statement::Expr { expr, .. } => {
                self.check_expr(expr, None);
            }
            Statement::Return { value, span } => self.check_return(value.as_ref(), *span),
            Statement::Require { args, span } => self.check_require(args, *span),
            Statement::If(if_stmt) => {
                let cond_ty = self.check_expr(&if_stmt.cond, Some(&SemType::Bool));
                if !cond_ty.compatible(&SemType::Bool) {
                    self.error(
                        codes::TYPE_MISMATCH,
                        format!("`if` condition must be `Bool`, found `{cond_ty}`"),
                        if_stmt.cond.span(),
                    );
                }
                self.check_block_statements(&if_stmt.then_block, true);
                if let Some(else_block) = &if_stmt.else_block {
                    self.check_block_statements(else_block, true);
                }
            }
        }
    }

    fn check_let(
        &mut self,
        mutable: bool,
        name: &Ident,
        ty: Option<&VariableType>,
        init: Option<&Expr>,
        span: Span,
    ) {
        let declared = ty.map(|t| self.resolve_type(t));

        let var_ty = match init {
            Some(expr) => {
                let got = self.check_expr(expr, declared.as_ref());
                if got.is_unit() {
                    self.error(
                        codes::VOID_IN_EXPRESSION,
                        "initializer produces no value",
                        expr.span(),
                    );
                }
                if let Some(declared) = &declared {
                    if !got.compatible(declared) {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!("expected `{declared}`, found `{got}`"),
                            expr.span(),
                        );
                    }
                    declared.clone()
                } else {
                    got
                }
            }
            None => {
                if !mutable || declared.is_none() {
                    self.error(
                        codes::UNINITIALIZED_VARIABLE,
                        format!(
                            "`{}` has no initializer; uninitialized variables must be `mut` and carry an explicit type",
                            name.name
                        ),
                        span,
                    );
                }
                declared.unwrap_or(SemType::Error)
            }
        };

        if name.name.is_empty() {
            return;
        }
        let declared_ok = self.scopes.declare(Variable {
            name: name.name.clone(),
            ty: var_ty,
            mutable,
            initialized: init.is_some(),
            used: false,
            span: name.span,
        });
        if let Err(previous) = declared_ok {
            let diag = Diagnostic::error(
                format!("duplicate declaration of `{}` in this scope", name.name),
                self.file,
                name.span.start,
                name.span.len().max(1),
            )
            .with_code(codes::DUPLICATE_DECLARATION)
            .with_note(format!("previous declaration at {}", previous.start));
            self.error_with(diag);
        }
    }

    fn check_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr) {
        if target.is_bad() || value.is_bad() {
            return;
        }

        let place_ty = self.check_place(target);
        let value_ty = self.check_expr(value, Some(&place_ty));

        if let Some(binop) = op.binary_op() {
            if !place_ty.is_numeric() || !value_ty.is_numeric() {
                self.error(
                    codes::INVALID_BINARY_OP,
                    format!(
                        "`{}=` requires numeric operands, found `{place_ty}` and `{value_ty}`",
                        binop.symbol()
                    ),
                    value.span(),
                );
                return;
            }
        }
        if !value_ty.compatible(&place_ty) {
            self.error(
                codes::TYPE_MISMATCH,
                format!("cannot assign `{value_ty}` to a place of type `{place_ty}`"),
                value.span(),
            );
        }
    }

    /// Checks an assignment target and returns the type of the place,
    /// enforcing mutability and storage-write rules.
    fn check_place(&mut self, target: &Expr) -> SemType {
        match target {
            Expr::Ident(ident) => {
                let Some(var) = self.scopes.get_mut(&ident.name) else {
                    return self.undefined_variable(ident);
                };
                let ty = var.ty.clone();
                if !var.mutable && var.initialized {
                    self.error(
                        codes::INVALID_ASSIGNMENT,
                        format!("cannot assign to immutable variable `{}`", ident.name),
                        ident.span,
                    );
                    return ty;
                }
                var.initialized = true;
                ty
            }
            Expr::Field { target, field, span } => {
                let base = self.check_expr(target, None);
                let SemType::Struct(struct_name) = &base else {
                    if !base.is_error() {
                        self.error(
                            codes::INVALID_ASSIGNMENT,
                            format!("type `{base}` has no assignable fields"),
                            *span,
                        );
                    }
                    return SemType::Error;
                };
                let struct_name = struct_name.clone();
                if self.registry.is_storage(&struct_name) {
                    self.require_storage_write(&struct_name, *span);
                }
                self.field_type(&struct_name, field)
            }
            Expr::Index { target, index, span } => {
                let base = self.check_place_base(target, *span);
                match base {
                    SemType::Table(key, value) => {
                        let got = self.check_expr(index, Some(&key));
                        if !got.compatible(&key) {
                            self.error(
                                codes::TYPE_MISMATCH,
                                format!("expected key of type `{key}`, found `{got}`"),
                                index.span(),
                            );
                        }
                        *value
                    }
                    SemType::Vector(element) => {
                        self.check_expr(index, Some(&SemType::U64));
                        *element
                    }
                    SemType::Error => SemType::Error,
                    other => {
                        self.error(
                            codes::INVALID_ASSIGNMENT,
                            format!("type `{other}` cannot be indexed"),
                            *span,
                        );
                        SemType::Error
                    }
                }
            }
            Expr::Unary { operand, .. } => self.check_place(operand),
            other => {
                self.error(
                    codes::INVALID_ASSIGNMENT,
                    "invalid assignment target",
                    other.span(),
                );
                SemType::Error
            }
        }
    }

    /// The base of an indexed place (`State.balances` in
    /// `State.balances[k] = v`): field reads here are writes-in-waiting.
    fn check_place_base(&mut self, target: &Expr, span: Span) -> SemType {
        if let Expr::Field { target: inner, field, .. } = target {
            let base = self.check_expr(inner, None);
            if let SemType::Struct(struct_name) = &base {
                let struct_name = struct_name.clone();
                if self.registry.is_storage(&struct_name) {
                    self.require_storage_write(&struct_name, span);
                }
                return self.field_type(&struct_name, field);
            }
            return base;
        }
        self.check_place(target)
    }

    fn require_storage_write(&mut self, struct_name: &str, span: Span) {
        let allowed = self
            .current
            .as_ref()
            .map(|ctx| ctx.can_write(struct_name))
            .unwrap_or(false);
        if !allowed {
            let fn_name = self
                .current
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default();
            self.error(
                codes::UNDECLARED_STORAGE_ACCESS,
                format!("function `{fn_name}` writes `{struct_name}` without declaring `writes {struct_name}`"),
                span,
            );
        }
    }

    fn require_storage_read(&mut self, struct_name: &str, span: Span) {
        let allowed = self
            .current
            .as_ref()
            .map(|ctx| ctx.can_read(struct_name))
            .unwrap_or(false);
        if !allowed {
            let fn_name = self
                .current
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default();
            self.error(
                codes::UNDECLARED_STORAGE_ACCESS,
                format!("function `{fn_name}` reads `{struct_name}` without declaring `reads {struct_name}`"),
                span,
            );
        }
    }

    fn field_type(&mut self, struct_name: &str, field: &Ident) -> SemType {
        let Some(info) = self.registry.struct_info(struct_name) else {
            return SemType::Error;
        };
        if let Some(ty) = info.field(&field.name) {
            return ty.clone();
        }
        let available: Vec<String> = info.field_names().map(String::from).collect();
        let mut diag = Diagnostic::error(
            format!("struct `{struct_name}` has no field `{}`", field.name),
            self.file,
            field.span.start,
            field.span.len().max(1),
        )
        .with_code(codes::FIELD_NOT_FOUND)
        .with_note(format!("available fields: {}", available.join(", ")));
        for close in suggest_candidates(&field.name, available.iter().map(|s| s.as_str())) {
            diag = diag.with_suggestion(
                Suggestion::new(
                    format!("did you mean `{close}`?"),
                    field.span.start,
                    field.span.len(),
                )
                .replacing(close),
            );
        }
        self.error_with(diag);
        SemType::Error
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span) {
        let expected = self.current.as_ref().and_then(|c| c.return_type.clone());
        match (expected, value) {
            (None, None) => {}
            (None, Some(expr)) => {
                let got = self.check_expr(expr, None);
                if !got.is_error() {
                    self.error(
                        codes::INVALID_RETURN_TYPE,
                        format!("function has no return type but returns `{got}`"),
                        expr.span(),
                    );
                }
            }
            (Some(expected), None) => {
                self.error(
                    codes::INVALID_RETURN_TYPE,
                    format!("expected a `{expected}` return value"),
                    span,
                );
            }
            (Some(expected), Some(expr)) => {
                let got = self.check_expr(expr, Some(&expected));
                if !got.compatible(&expected) {
                    self.error(
                        codes::INVALID_RETURN_TYPE,
                        format!("expected `{expected}`, found `{got}`"),
                        expr.span(),
                    );
                }
            }
        }
    }

    fn check_require(&mut self, args: &[Expr], span: Span) {
        let Some(cond) = args.first() else {
            self.error(
                codes::INVALID_ARGUMENTS,
                "`require!` needs at least a condition argument",
                span,
            );
            return;
        };
        let cond_ty = self.check_expr(cond, Some(&SemType::Bool));
        if !cond_ty.compatible(&SemType::Bool) {
            self.error(
                codes::TYPE_MISMATCH,
                format!("`require!` condition must be `Bool`, found `{cond_ty}`"),
                cond.span(),
            );
        }
        for arg in &args[1..] {
            self.check_expr(arg, None);
        }
    }

    fn undefined_variable(&mut self, ident: &Ident) -> SemType {
        if ident.name.is_empty() {
            return SemType::Error;
        }
        let mut candidates: Vec<String> = self
            .scopes
            .visible_names()
            .into_iter()
            .map(String::from)
            .collect();
        if let Some(storage) = &self.registry.storage_struct {
            candidates.push(storage.clone());
        }
        let mut diag = Diagnostic::error(
            format!("undefined variable `{}`", ident.name),
            self.file,
            ident.span.start,
            ident.span.len().max(1),
        )
        .with_code(codes::UNDEFINED_VARIABLE);
        for close in suggest_candidates(&ident.name, candidates.iter().map(|s| s.as_str())) {
            diag = diag.with_suggestion(
                Suggestion::new(
                    format!("did you mean `{close}`?"),
                    ident.span.start,
                    ident.span.len(),
                )
                .replacing(close),
            );
        }
        self.error_with(diag);
        SemType::Error
    }

    // === Expressions ====================================================

    pub(crate) fn check_expr(&mut self, expr: &Expr, expected: Option<&SemType>) -> SemType {
        match expr {
            Expr::Bad { .. } => SemType::Error,
            Expr::Literal(lit) => self.check_literal(lit, expected),
            Expr::Ident(ident) => self.check_ident(ident),
            Expr::Path { span, .. } => {
                self.error(
                    codes::VOID_IN_EXPRESSION,
                    "module path is not a value",
                    *span,
                );
                SemType::Error
            }
            Expr::Field { target, field, .. } => self.check_field(target, field),
            Expr::Index { target, index, span } => self.check_index(target, index, *span),
            Expr::Call {
                callee,
                generics,
                args,
                span,
            } => self.check_call(callee, generics, args, *span),
            Expr::StructLit { name, fields, span } => self.check_struct_lit(name, fields, *span),
            Expr::Unary { op, operand, span } => self.check_unary(*op, operand, *span),
            Expr::Binary {
                op, left, right, ..
            } => self.check_binary(*op, left, right),
            Expr::Tuple { elements, .. } => SemType::Tuple(
                elements
                    .iter()
                    .map(|e| self.check_expr(e, None))
                    .collect(),
            ),
            Expr::Paren { inner, .. } => self.check_expr(inner, expected),
        }
    }

    fn check_literal(&mut self, lit: &Literal, expected: Option<&SemType>) -> SemType {
        match lit {
            Literal::Int { .. } | Literal::HexInt { .. } => match expected {
                Some(SemType::UInt(width)) => SemType::UInt(*width),
                _ => SemType::U256,
            },
            Literal::Str { .. } => SemType::Str,
            Literal::Bool { .. } => SemType::Bool,
        }
    }

    fn check_ident(&mut self, ident: &Ident) -> SemType {
        if let Some(var) = self.scopes.get_mut(&ident.name) {
            var.used = true;
            let ty = var.ty.clone();
            let uninitialized = !var.initialized;
            if uninitialized {
                self.error(
                    codes::UNINITIALIZED_VARIABLE,
                    format!("`{}` may be read before it is assigned", ident.name),
                    ident.span,
                );
            }
            return ty;
        }
        if self.registry.is_storage(&ident.name) {
            return SemType::Struct(ident.name.clone());
        }
        self.undefined_variable(ident)
    }

    fn check_field(&mut self, target: &Expr, field: &Ident) -> SemType {
        let base = self.check_expr(target, None);
        match base {
            SemType::Struct(struct_name) => {
                if self.registry.is_storage(&struct_name) {
                    self.require_storage_read(&struct_name, field.span);
                }
                self.field_type(&struct_name, field)
            }
            SemType::Error => SemType::Error,
            other => {
                self.error(
                    codes::FIELD_NOT_FOUND,
                    format!("type `{other}` has no fields"),
                    field.span,
                );
                SemType::Error
            }
        }
    }

    fn check_index(&mut self, target: &Expr, index: &Expr, span: Span) -> SemType {
        let base = self.check_expr(target, None);
        match base {
            SemType::Table(key, value) => {
                let got = self.check_expr(index, Some(&key));
                if !got.compatible(&key) {
                    self.error(
                        codes::TYPE_MISMATCH,
                        format!("expected key of type `{key}`, found `{got}`"),
                        index.span(),
                    );
                }
                *value
            }
            SemType::Vector(element) => {
                self.check_expr(index, Some(&SemType::U64));
                *element
            }
            SemType::Error => SemType::Error,
            other => {
                self.error(
                    codes::TYPE_MISMATCH,
                    format!("type `{other}` cannot be indexed"),
                    span,
                );
                SemType::Error
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> SemType {
        let ty = self.check_expr(operand, None);
        match op {
            UnaryOp::Not => {
                if !ty.compatible(&SemType::Bool) {
                    self.error(
                        codes::INVALID_BINARY_OP,
                        format!("`!` requires `Bool`, found `{ty}`"),
                        span,
                    );
                    return SemType::Error;
                }
                SemType::Bool
            }
            UnaryOp::Neg => {
                if !ty.is_numeric() {
                    self.error(
                        codes::INVALID_BINARY_OP,
                        format!("`-` requires a numeric operand, found `{ty}`"),
                        span,
                    );
                    return SemType::Error;
                }
                ty
            }
            UnaryOp::Deref | UnaryOp::Ref { .. } => ty,
        }
    }

    fn check_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> SemType {
        let span = left.span().to(right.span());

        if op.is_logical() {
            for side in [left, right] {
                let ty = self.check_expr(side, Some(&SemType::Bool));
                if !ty.compatible(&SemType::Bool) {
                    self.error(
                        codes::TYPE_MISMATCH,
                        format!("`{}` requires `Bool` operands, found `{ty}`", op.symbol()),
                        side.span(),
                    );
                }
            }
            return SemType::Bool;
        }

        let left_ty = self.check_expr(left, None);
        // Let an integer literal on the right adopt the left's width.
        let right_ty = self.check_expr(right, Some(&left_ty));

        if left_ty.is_unit() || right_ty.is_unit() {
            self.error(
                codes::VOID_IN_EXPRESSION,
                "operand produces no value",
                span,
            );
            return SemType::Error;
        }

        if op.is_arithmetic() {
            if !left_ty.is_numeric() || !right_ty.is_numeric() {
                self.error(
                    codes::INVALID_BINARY_OP,
                    format!(
                        "invalid operation: `{left_ty}` {} `{right_ty}`",
                        op.symbol()
                    ),
                    span,
                );
                return SemType::Error;
            }
            if !left_ty.compatible(&right_ty) {
                self.error(
                    codes::TYPE_MISMATCH,
                    format!(
                        "mismatched integer widths: `{left_ty}` {} `{right_ty}` (an explicit cast is required)",
                        op.symbol()
                    ),
                    span,
                );
                return SemType::Error;
            }
            return if left_ty.is_error() { right_ty } else { left_ty };
        }

        // Comparisons.
        match op {
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                if !left_ty.is_numeric() || !right_ty.is_numeric() {
                    self.error(
                        codes::INVALID_BINARY_OP,
                        format!(
                            "ordering comparison requires numeric operands, found `{left_ty}` and `{right_ty}`"
                        ),
                        span,
                    );
                    return SemType::Bool;
                }
            }
            _ => {}
        }
        if !left_ty.compatible(&right_ty) {
            self.error(
                codes::TYPE_MISMATCH,
                format!("cannot compare `{left_ty}` with `{right_ty}`"),
                span,
            );
        }
        SemType::Bool
    }

    fn check_struct_lit(
        &mut self,
        name: &Ident,
        fields: &[(Ident, Expr)],
        span: Span,
    ) -> SemType {
        let Some(info) = self.registry.struct_info(&name.name).cloned() else {
            let mut diag = Diagnostic::error(
                format!("unknown struct `{}`", name.name),
                self.file,
                name.span.start,
                name.span.len().max(1),
            );
            let names: Vec<&str> = self.registry.structs.iter().map(|s| s.name.as_str()).collect();
            if let Some(close) = closest_match(&name.name, names) {
                diag = diag.with_suggestion(
                    Suggestion::new(
                        format!("did you mean `{close}`?"),
                        name.span.start,
                        name.span.len(),
                    )
                    .replacing(close),
                );
            }
            self.error_with(diag);
            return SemType::Error;
        };

        let mut seen: Vec<&str> = Vec::new();
        for (field_name, value) in fields {
            if seen.contains(&field_name.name.as_str()) {
                self.error(
                    codes::DUPLICATE_FIELD,
                    format!("field `{}` supplied more than once", field_name.name),
                    field_name.span,
                );
            } else {
                seen.push(&field_name.name);
            }

            match info.field(&field_name.name) {
                Some(expected) => {
                    let expected = expected.clone();
                    let got = self.check_expr(value, Some(&expected));
                    if !got.compatible(&expected) {
                        self.error(
                            codes::TYPE_MISMATCH,
                            format!(
                                "field `{}` expects `{expected}`, found `{got}`",
                                field_name.name
                            ),
                            value.span(),
                        );
                    }
                }
                None => {
                    let available: Vec<String> = info.field_names().map(String::from).collect();
                    let diag = Diagnostic::error(
                        format!("struct `{}` has no field `{}`", info.name, field_name.name),
                        self.file,
                        field_name.span.start,
                        field_name.span.len().max(1),
                    )
                    .with_code(codes::FIELD_NOT_FOUND)
                    .with_note(format!("available fields: {}", available.join(", ")));
                    self.error_with(diag);
                    self.check_expr(value, None);
                }
            }
        }

        for (field_name, _) in &info.fields {
            if !fields.iter().any(|(f, _)| &f.name == field_name) {
                self.error(
                    codes::MISSING_FIELD,
                    format!("missing field `{field_name}` in `{}` literal", info.name),
                    span,
                );
            }
        }

        SemType::Struct(info.name)
    }

    fn check_call(
        &mut self,
        callee: &Expr,
        generics: &[VariableType],
        args: &[Expr],
        span: Span,
    ) -> SemType {
        let explicit: Vec<SemType> = generics.iter().map(|g| self.resolve_type(g)).collect();

        match callee {
            Expr::Ident(name) => self.check_named_call(name, &explicit, args, span),
            Expr::Path { segments, .. } => {
                let module_path = segments[..segments.len() - 1]
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join("::");
                let fn_name = segments.last().expect("non-empty path");
                let Some(module) = catalog::module(&module_path) else {
                    self.error(
                        codes::UNDEFINED_MODULE,
                        format!("undefined module `{module_path}`"),
                        span,
                    );
                    for arg in args {
                        self.check_expr(arg, None);
                    }
                    return SemType::Error;
                };
                let Some(func) = module.function(&fn_name.name).cloned() else {
                    let mut diag = Diagnostic::error(
                        format!("module `{module_path}` has no function `{}`", fn_name.name),
                        self.file,
                        fn_name.span.start,
                        fn_name.span.len().max(1),
                    )
                    .with_code(codes::UNDEFINED_FUNCTION);
                    let names: Vec<&str> = module.functions.iter().map(|f| f.name).collect();
                    if let Some(close) = closest_match(&fn_name.name, names) {
                        diag = diag.with_suggestion(
                            Suggestion::new(
                                format!("did you mean `{close}`?"),
                                fn_name.span.start,
                                fn_name.span.len(),
                            )
                            .replacing(close),
                        );
                    }
                    self.error_with(diag);
                    for arg in args {
                        self.check_expr(arg, None);
                    }
                    return SemType::Error;
                };
                self.check_catalog_call(&func, &explicit, args, span)
            }
            other => {
                self.error(
                    codes::UNDEFINED_FUNCTION,
                    "unsupported call target",
                    other.span(),
                );
                for arg in args {
                    self.check_expr(arg, None);
                }
                SemType::Error
            }
        }
    }

    fn check_named_call(
        &mut self,
        name: &Ident,
        explicit: &[SemType],
        args: &[Expr],
        span: Span,
    ) -> SemType {
        // Contract-local functions first.
        if let Some(info) = self.registry.function_info(&name.name).cloned() {
            if args.len() != info.params.len() {
                self.error(
                    codes::INVALID_ARGUMENTS,
                    format!(
                        "`{}` expects {} argument(s), found {}",
                        info.name,
                        info.params.len(),
                        args.len()
                    ),
                    span,
                );
            }
            for (arg, (param_name, param_ty)) in args.iter().zip(&info.params) {
                let got = self.check_expr(arg, Some(param_ty));
                if got.is_unit() {
                    self.error(
                        codes::VOID_IN_EXPRESSION,
                        "argument produces no value",
                        arg.span(),
                    );
                } else if !got.compatible(param_ty) {
                    self.error(
                        codes::TYPE_MISMATCH,
                        format!("parameter `{param_name}` expects `{param_ty}`, found `{got}`"),
                        arg.span(),
                    );
                }
            }
            for extra in args.iter().skip(info.params.len()) {
                self.check_expr(extra, None);
            }

            // The callee's declared storage effects must be covered here.
            if let Some(ctx) = self.current.clone() {
                for read in &info.reads {
                    if !ctx.can_read(read) {
                        self.error(
                            codes::UNDECLARED_STORAGE_ACCESS,
                            format!(
                                "calling `{}` requires `reads {read}` in `{}`",
                                info.name, ctx.name
                            ),
                            span,
                        );
                    }
                }
                for write in &info.writes {
                    if !ctx.can_write(write) {
                        self.error(
                            codes::UNDECLARED_STORAGE_ACCESS,
                            format!(
                                "calling `{}` requires `writes {write}` in `{}`",
                                info.name, ctx.name
                            ),
                            span,
                        );
                    }
                }
            }

            return info.return_type.clone().unwrap_or(SemType::Unit);
        }

        // Imported stdlib functions.
        if let Some(binding) = self.registry.import(&name.name).cloned() {
            if let Some(sig) = binding.signature {
                // `emit` additionally demands an #[event] struct literal.
                if sig.name == "emit" {
                    if let Some(arg) = args.first() {
                        let got = self.check_expr(arg, None);
                        let ok = matches!(&got, SemType::Struct(s) if self.registry.is_event(s))
                            || got.is_error();
                        if !ok {
                            self.error(
                                codes::INVALID_ARGUMENTS,
                                format!("`emit` expects an `#[event]` struct, found `{got}`"),
                                arg.span(),
                            );
                        }
                    } else {
                        self.error(
                            codes::INVALID_ARGUMENTS,
                            "`emit` expects an event argument",
                            span,
                        );
                    }
                    return SemType::Unit;
                }
                return self.check_catalog_call(&sig, explicit, args, span);
            }
        }

        // Unknown: suggest close names and candidate imports.
        let mut diag = Diagnostic::error(
            format!("undefined function `{}`", name.name),
            self.file,
            name.span.start,
            name.span.len().max(1),
        )
        .with_code(codes::UNDEFINED_FUNCTION);
        let known: Vec<String> = self
            .registry
            .functions
            .iter()
            .map(|f| f.name.clone())
            .chain(self.registry.imports.keys().cloned())
            .collect();
        for close in suggest_candidates(&name.name, known.iter().map(|s| s.as_str())) {
            diag = diag.with_suggestion(
                Suggestion::new(
                    format!("did you mean `{close}`?"),
                    name.span.start,
                    name.span.len(),
                )
                .replacing(close),
            );
        }
        for module in catalog::modules_exporting(&name.name) {
            diag = diag.with_suggestion(Suggestion::new(
                format!(
                    "consider importing it: `use {}::{{{}}};`",
                    module.path, name.name
                ),
                name.span.start,
                name.span.len(),
            ));
        }
        self.error_with(diag);
        for arg in args {
            self.check_expr(arg, None);
        }
        SemType::Error
    }

    /// Checks a call against a catalog signature, binding generic
    /// parameters from explicit arguments and then from argument types.
    fn check_catalog_call(
        &mut self,
        sig: &CatalogFn,
        explicit: &[SemType],
        args: &[Expr],
        span: Span,
    ) -> SemType {
        if args.len() != sig.params.len() {
            self.error(
                codes::INVALID_ARGUMENTS,
                format!(
                    "`{}` expects {} argument(s), found {}",
                    sig.name,
                    sig.params.len(),
                    args.len()
                ),
                span,
            );
        }

        // Generic parameter names in order of first appearance.
        let mut order: Vec<&str> = Vec::new();
        fn collect<'a>(tr: &'a TypeRef, order: &mut Vec<&'a str>) {
            match tr {
                TypeRef::Param(p) => {
                    if !order.contains(p) {
                        order.push(p);
                    }
                }
                TypeRef::Named { args, .. } => {
                    for a in args {
                        collect(a, order);
                    }
                }
            }
        }
        for (_, tr) in &sig.params {
            collect(tr, &mut order);
        }
        if let Some(ret) = &sig.ret {
            collect(ret, &mut order);
        }

        let mut bindings: BTreeMap<&str, SemType> = BTreeMap::new();
        for (param, ty) in order.iter().zip(explicit) {
            bindings.insert(*param, ty.clone());
        }

        for (arg, (param_name, param_tr)) in args.iter().zip(&sig.params) {
            // Unbound generic parameters adopt the argument's type.
            if let TypeRef::Param(p) = param_tr {
                let bound = bindings.get(*p).cloned();
                let got = self.check_expr(arg, bound.as_ref());
                bindings.entry(*p).or_insert(got);
                continue;
            }
            let expected = self.typeref_to_sem(param_tr, &bindings);
            let got = self.check_expr(arg, Some(&expected));
            if !got.compatible(&expected) {
                self.error(
                    codes::TYPE_MISMATCH,
                    format!("parameter `{param_name}` expects `{expected}`, found `{got}`"),
                    arg.span(),
                );
            }
        }
        for extra in args.iter().skip(sig.params.len()) {
            self.check_expr(extra, None);
        }

        match &sig.ret {
            Some(ret) => self.typeref_to_sem(ret, &bindings),
            None => SemType::Unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanso_core::Severity;
    use pretty_assertions::assert_eq;

    fn analyze_source(source: &str) -> (ContextRegistry, DiagnosticSink) {
        let mut sink = DiagnosticSink::new();
        let contract = kanso_parser::parse("test.ks", source, &mut sink);
        let registry = analyze("test.ks", &contract, &mut sink);
        (registry, sink)
    }

    fn codes_of(sink: &DiagnosticSink) -> Vec<&'static str> {
        sink.iter().filter_map(|d| d.code).collect()
    }

    fn assert_clean(source: &str) -> ContextRegistry {
        let (registry, sink) = analyze_source(source);
        let rendered: Vec<String> = sink.iter().map(|d| d.render(source)).collect();
        assert!(
            !sink.has_errors(),
            "unexpected errors:\n{}",
            rendered.join("\n")
        );
        registry
    }

    const TOKEN: &str = r#"contract Token {
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

    #[test]
    fn erc20_token_analyzes_clean() {
        let registry = assert_clean(TOKEN);
        assert_eq!(registry.contract_name, "Token");
        assert_eq!(registry.storage_struct.as_deref(), Some("State"));
        assert_eq!(registry.events, ["Transfer"]);
        let transfer = registry.function_info("transfer").unwrap();
        assert!(transfer.external);
        assert_eq!(transfer.return_type, Some(SemType::Bool));
        let create = registry.function_info("create").unwrap();
        assert!(create.create);
    }

    #[test]
    fn same_scope_shadowing_is_e0009_at_second_binding() {
        let source = r#"contract C {
    fn f() {
        let x = 1;
        let x = 2;
    }
}
"#;
        let (_, sink) = analyze_source(source);
        let dup: Vec<_> = sink
            .iter()
            .filter(|d| d.code == Some(codes::DUPLICATE_DECLARATION))
            .collect();
        assert_eq!(dup.len(), 1);
        // Anchored at the second `x`.
        assert_eq!(dup[0].position.line, 4);
        let second_x = source.lines().nth(3).unwrap().find('x').unwrap() + 1;
        assert_eq!(dup[0].position.column as usize, second_x);
    }

    #[test]
    fn outer_scope_shadowing_is_allowed() {
        assert_clean(
            r#"contract C {
    fn f(c: Bool) {
        let x = 1;
        if c {
            let x = 2;
            let _use = x;
        }
        let _use2 = x;
    }
}
"#,
        );
    }

    #[test]
    fn undefined_function_suggests_close_name() {
        let source = r#"contract C {
    fn balance() -> U256 { return 1; }
    fn f() -> U256 { return balace(); }
}
"#;
        let (_, sink) = analyze_source(source);
        let diag = sink
            .iter()
            .find(|d| d.code == Some(codes::UNDEFINED_FUNCTION))
            .expect("expected E0002");
        assert!(diag.message.contains("balace"));
        assert!(diag
            .suggestions
            .iter()
            .any(|s| s.message == "did you mean `balance`?"));
    }

    #[test]
    fn undefined_function_suggests_import() {
        let source = r#"contract C {
    fn f() -> Address { return sender(); }
}
"#;
        let (_, sink) = analyze_source(source);
        let diag = sink
            .iter()
            .find(|d| d.code == Some(codes::UNDEFINED_FUNCTION))
            .unwrap();
        assert!(diag
            .suggestions
            .iter()
            .any(|s| s.message.contains("use std::evm::{sender};")));
    }

    #[test]
    fn unknown_module_is_e0021() {
        let (_, sink) = analyze_source("contract C { use std::io; }");
        assert_eq!(codes_of(&sink), [codes::UNDEFINED_MODULE]);
    }

    #[test]
    fn unknown_import_item_suggests_export() {
        let (_, sink) = analyze_source("contract C { use std::evm::{sendr}; }");
        let diag = sink.iter().next().unwrap();
        assert_eq!(diag.code, Some(codes::UNDEFINED_MODULE));
        assert!(diag
            .suggestions
            .iter()
            .any(|s| s.message == "did you mean `sender`?"));
    }

    #[test]
    fn attribute_typo_gets_did_you_mean() {
        let (_, sink) = analyze_source("contract C { #[storge] struct S { x: U256 } }");
        let diag = sink
            .iter()
            .find(|d| d.code == Some(codes::INVALID_ATTRIBUTE))
            .unwrap();
        assert!(diag
            .suggestions
            .iter()
            .any(|s| s.message == "did you mean `storage`?"));
    }

    #[test]
    fn second_storage_struct_is_rejected() {
        let source = r#"contract C {
    #[storage] struct A { x: U256 }
    #[storage] struct B { y: U256 }
}
"#;
        let (registry, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_ATTRIBUTE));
        assert_eq!(registry.storage_struct.as_deref(), Some("A"));
    }

    #[test]
    fn reads_writes_must_name_storage_structs() {
        let source = r#"contract C {
    #[event] struct E { value: U256 }
    fn f() reads E { }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_READS_WRITES));
    }

    #[test]
    fn create_with_return_type_is_e0012() {
        let source = r#"contract C {
    #[storage] struct State { x: U256 }
    #[create] fn create() -> U256 writes State { return 1; }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_CONSTRUCTOR));
    }

    #[test]
    fn create_must_write_state_exactly() {
        let source = r#"contract C {
    #[storage] struct State { x: U256 }
    #[create] fn create() { }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_CONSTRUCTOR));
    }

    #[test]
    fn arity_mismatch_is_e0013() {
        let source = r#"contract C {
    fn g(a: U256) { let _x = a; }
    fn f() { g(1, 2); }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_ARGUMENTS));
    }

    #[test]
    fn argument_type_mismatch_is_e0003() {
        let source = r#"contract C {
    fn g(a: Bool) { let _x = a; }
    fn f() { g(1); }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::TYPE_MISMATCH));
    }

    #[test]
    fn callee_storage_effects_must_be_declared() {
        let source = r#"contract C {
    #[storage] struct State { x: U256 }
    fn read_x() -> U256 reads State { return State.x; }
    fn f() -> U256 { return read_x(); }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::UNDECLARED_STORAGE_ACCESS));
    }

    #[test]
    fn storage_read_requires_reads_clause() {
        let source = r#"contract C {
    #[storage] struct State { x: U256 }
    fn f() -> U256 { return State.x; }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::UNDECLARED_STORAGE_ACCESS));
    }

    #[test]
    fn storage_write_requires_writes_clause() {
        let source = r#"contract C {
    #[storage] struct State { x: U256 }
    fn f() reads State { State.x = 1; }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::UNDECLARED_STORAGE_ACCESS));
    }

    #[test]
    fn field_not_found_lists_alternatives() {
        let source = r#"contract C {
    #[storage] struct State { balances: Table<Address, U256>, total_supply: U256 }
    fn f() -> U256 reads State { return State.total_suply; }
}
"#;
        let (_, sink) = analyze_source(source);
        let diag = sink
            .iter()
            .find(|d| d.code == Some(codes::FIELD_NOT_FOUND))
            .unwrap();
        assert!(diag
            .suggestions
            .iter()
            .any(|s| s.message == "did you mean `total_supply`?"));
        assert!(diag.notes[0].contains("balances"));
    }

    #[test]
    fn struct_literal_field_rules() {
        let source = r#"contract C {
    #[event] struct E { a: U256, b: Bool }
    use std::evm::{emit};
    fn f() {
        emit(E { a: 1, a: 2 });
    }
}
"#;
        let (_, sink) = analyze_source(source);
        let codes = codes_of(&sink);
        assert!(codes.contains(&codes::DUPLICATE_FIELD));
        assert!(codes.contains(&codes::MISSING_FIELD));
    }

    #[test]
    fn emit_requires_event_struct() {
        let source = r#"contract C {
    use std::evm::{emit};
    struct Plain { a: U256 }
    fn f() { emit(Plain { a: 1 }); }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_ARGUMENTS));
    }

    #[test]
    fn width_mismatch_needs_cast() {
        let source = r#"contract C {
    fn f(a: U64, b: U256) -> U256 { return a + b; }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::TYPE_MISMATCH));
    }

    #[test]
    fn arithmetic_on_bool_is_e0008() {
        let source = r#"contract C {
    fn f(a: Bool) -> U256 { return a + 1; }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_BINARY_OP));
    }

    #[test]
    fn logical_requires_bool() {
        let source = r#"contract C {
    fn f(a: U256) -> Bool { return a && true; }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::TYPE_MISMATCH));
    }

    #[test]
    fn immutable_assignment_is_e0014() {
        let source = r#"contract C {
    fn f() {
        let x = 1;
        x = 2;
    }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::INVALID_ASSIGNMENT));
    }

    #[test]
    fn uninitialized_let_must_be_mut_and_typed() {
        let (_, sink) = analyze_source("contract C { fn f() { let x; } }");
        assert!(codes_of(&sink).contains(&codes::UNINITIALIZED_VARIABLE));
    }

    #[test]
    fn read_before_assignment_is_e0017() {
        let source = r#"contract C {
    fn f() -> U256 {
        let mut x: U256;
        let y = x;
        x = 1;
        return y;
    }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::UNINITIALIZED_VARIABLE));
    }

    #[test]
    fn void_call_in_value_position_is_e0020() {
        let source = r#"contract C {
    fn g() { }
    fn f() { let _x = g(); }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::VOID_IN_EXPRESSION));
    }

    #[test]
    fn missing_return_on_some_path_is_e0600() {
        let source = r#"contract C {
    fn f(c: Bool) -> U256 {
        if c {
            return 1;
        }
    }
}
"#;
        let (_, sink) = analyze_source(source);
        assert!(codes_of(&sink).contains(&codes::MISSING_RETURN));
    }

    #[test]
    fn both_branches_returning_satisfies_e0600() {
        assert_clean(
            r#"contract C {
    fn f(c: Bool) -> U256 {
        if c {
            return 1;
        } else {
            return 2;
        }
    }
}
"#,
        );
    }

    #[test]
    fn tail_expression_counts_as_return_value() {
        assert_clean(
            r#"contract C {
    fn f(a: U256) -> U256 {
        a + 1
    }
}
"#,
        );
    }

    #[test]
    fn unreachable_statement_is_w0002() {
        let source = r#"contract C {
    fn f() -> U256 {
        return 1;
        let x = 2;
    }
}
"#;
        let (_, sink) = analyze_source(source);
        let warning = sink
            .iter()
            .find(|d| d.code == Some(codes::UNREACHABLE_CODE_WARNING))
            .unwrap();
        assert_eq!(warning.severity, Severity::Warning);
    }

    #[test]
    fn unused_variable_is_w0001_with_underscore_fix() {
        let source = r#"contract C {
    fn f() {
        let x = 1;
    }
}
"#;
        let (_, sink) = analyze_source(source);
        let warning = sink
            .iter()
            .find(|d| d.code == Some(codes::UNUSED_VARIABLE))
            .unwrap();
        assert_eq!(warning.suggestions[0].replacement.as_deref(), Some("_x"));
        assert!(!sink.has_errors());
    }

    #[test]
    fn underscore_suppresses_w0001() {
        let (_, sink) = analyze_source("contract C { fn f() { let _x = 1; } }");
        assert!(sink.is_empty());
    }

    #[test]
    fn generic_catalog_call_binds_explicit_arguments() {
        assert_clean(
            r#"contract C {
    use std::vector::{empty, push_back};
    fn f() {
        let v = empty<U256>();
        push_back(v, 3);
    }
}
"#,
        );
    }

    #[test]
    fn tuple_keyed_table_access() {
        assert_clean(
            r#"contract C {
    use std::evm::{sender};
    #[storage]
    struct State { allowances: Table<(Address, Address), U256> }
    ext fn approve(spender: Address, amount: U256) writes State {
        State.allowances[(sender(), spender)] = amount;
    }
}
"#,
        );
    }

    #[test]
    fn bad_nodes_are_skipped_silently() {
        // The parse error is reported; the analyzer must not add noise
        // for the Bad placeholder.
        let source = "contract C { fn f() { let x = ; } }";
        let (_, sink) = analyze_source(source);
        let semantic: Vec<_> = sink
            .iter()
            .filter(|d| d.code.is_some() && d.code != Some(codes::UNUSED_VARIABLE))
            .collect();
        assert!(semantic.is_empty(), "{semantic:?}");
    }
}
