// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Lexical scopes.
//!
//! A new scope opens at every `{` and closes at the matching `}`.
//! Shadowing a name from an enclosing scope is allowed; redeclaring within
//! the same scope is a duplicate-declaration error the analyzer reports.

use crate::types::SemType;
use kanso_core::Span;

/// One variable binding.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: SemType,
    pub mutable: bool,
    /// False for `let mut x: T;` until the first assignment.
    pub initialized: bool,
    /// Set when the variable is read; drives unused-variable warnings.
    pub used: bool,
    pub span: Span,
}

#[derive(Debug, Default)]
struct Scope {
    vars: Vec<Variable>,
}

/// Stack of lexical scopes for one function walk.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    /// Bindings from scopes that already closed, kept for use analysis.
    retired: Vec<Variable>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            self.retired.extend(scope.vars);
        }
    }

    /// Declares a variable in the innermost scope. Returns the previous
    /// same-scope binding's span on redeclaration.
    pub fn declare(&mut self, var: Variable) -> Result<(), Span> {
        let scope = self.scopes.last_mut().expect("no open scope");
        if let Some(existing) = scope.vars.iter().find(|v| v.name == var.name) {
            return Err(existing.span);
        }
        scope.vars.push(var);
        Ok(())
    }

    /// Innermost binding for `name`, if any.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|s| s.vars.iter_mut().rev().find(|v| v.name == name))
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.vars.iter().rev().find(|v| v.name == name))
    }

    /// All names currently visible, innermost last.
    pub fn visible_names(&self) -> Vec<&str> {
        self.scopes
            .iter()
            .flat_map(|s| s.vars.iter().map(|v| v.name.as_str()))
            .collect()
    }

    /// Drains every binding seen during the walk, open or retired.
    pub fn drain_all(&mut self) -> Vec<Variable> {
        let mut all = std::mem::take(&mut self.retired);
        for scope in self.scopes.drain(..) {
            all.extend(scope.vars);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable {
            name: name.to_string(),
            ty: SemType::U256,
            mutable: false,
            initialized: true,
            used: false,
            span: Span::default(),
        }
    }

    #[test]
    fn same_scope_redeclaration_is_rejected() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.declare(var("x")).unwrap();
        assert!(scopes.declare(var("x")).is_err());
    }

    #[test]
    fn outer_scope_shadowing_is_allowed() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.declare(var("x")).unwrap();
        scopes.push();
        scopes.declare(var("x")).unwrap();
        assert_eq!(scopes.visible_names(), ["x", "x"]);
        scopes.pop();
        assert!(scopes.get("x").is_some());
    }

    #[test]
    fn retired_bindings_survive_for_use_analysis() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.push();
        scopes.declare(var("inner")).unwrap();
        scopes.pop();
        scopes.declare(var("outer")).unwrap();
        let names: Vec<String> = scopes.drain_all().into_iter().map(|v| v.name).collect();
        assert!(names.contains(&"inner".to_string()));
        assert!(names.contains(&"outer".to_string()));
    }
}
