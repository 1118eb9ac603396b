// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The analyzer's output: resolved bindings for the IR builder.

use crate::catalog::CatalogFn;
use crate::types::SemType;
use std::collections::BTreeMap;

/// Validated attribute of a struct declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructAttr {
    Storage,
    Event,
}

/// A contract struct with resolved field types, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructInfo {
    pub name: String,
    pub attr: Option<StructAttr>,
    pub fields: Vec<(String, SemType)>,
}

impl StructInfo {
    pub fn field(&self, name: &str) -> Option<&SemType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

/// A contract function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub external: bool,
    pub create: bool,
    pub params: Vec<(String, SemType)>,
    pub return_type: Option<SemType>,
    pub reads: Vec<String>,
    pub writes: Vec<String>,
}

/// What an imported name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Type,
    Function,
    /// The module itself (`use Table;` with no brace list).
    Module,
}

/// One name bound by a `use` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub module: String,
    pub kind: ImportKind,
    /// Catalog signature for function imports.
    pub signature: Option<CatalogFn>,
}

/// Everything the builder needs to know about a validated contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextRegistry {
    pub contract_name: String,
    /// Structs in declaration order.
    pub structs: Vec<StructInfo>,
    /// Functions in declaration order.
    pub functions: Vec<FunctionInfo>,
    /// Imported name → binding.
    pub imports: BTreeMap<String, ImportBinding>,
    /// The unique `#[storage]` struct, if declared.
    pub storage_struct: Option<String>,
    /// `#[event]` struct names in declaration order.
    pub events: Vec<String>,
}

impl ContextRegistry {
    pub fn struct_info(&self, name: &str) -> Option<&StructInfo> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn function_info(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn import(&self, name: &str) -> Option<&ImportBinding> {
        self.imports.get(name)
    }

    pub fn is_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e == name)
    }

    pub fn is_storage(&self, name: &str) -> bool {
        self.storage_struct.as_deref() == Some(name)
    }
}
