// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The closed standard-library catalog.
//!
//! Everything the analyzer knows about `std` lives in this one table;
//! adding a stdlib function is a table edit and nothing else. Modules are
//! keyed by their dotted path as written in `use` declarations.

use lazy_static::lazy_static;
use std::collections::BTreeMap;

/// A type reference inside a catalog signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A named built-in or catalog type with generic arguments.
    Named {
        name: &'static str,
        args: Vec<TypeRef>,
    },
    /// A generic parameter (`T`, `K`, `V`) bound at the call site.
    Param(&'static str),
}

impl TypeRef {
    pub const fn named(name: &'static str) -> TypeRef {
        TypeRef::Named { name, args: Vec::new() }
    }
}

/// An exported type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogType {
    pub name: &'static str,
    pub generic: bool,
}

/// An exported function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFn {
    pub name: &'static str,
    pub params: Vec<(&'static str, TypeRef)>,
    pub ret: Option<TypeRef>,
}

/// One stdlib module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogModule {
    pub path: &'static str,
    pub types: Vec<CatalogType>,
    pub functions: Vec<CatalogFn>,
}

impl CatalogModule {
    pub fn function(&self, name: &str) -> Option<&CatalogFn> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn type_export(&self, name: &str) -> Option<&CatalogType> {
        self.types.iter().find(|t| t.name == name)
    }
}

lazy_static! {
    /// The full standard library, keyed by dotted module path.
    pub static ref CATALOG: BTreeMap<&'static str, CatalogModule> = {
        let modules = [
            CatalogModule {
                path: "std::evm",
                types: vec![],
                functions: vec![
                    CatalogFn {
                        name: "sender",
                        params: vec![],
                        ret: Some(TypeRef::named("Address")),
                    },
                    CatalogFn {
                        name: "emit",
                        params: vec![("event", TypeRef::Param("T"))],
                        ret: None,
                    },
                ],
            },
            CatalogModule {
                path: "std::address",
                types: vec![CatalogType { name: "Address", generic: false }],
                functions: vec![CatalogFn {
                    name: "zero",
                    params: vec![],
                    ret: Some(TypeRef::named("Address")),
                }],
            },
            CatalogModule {
                path: "std::ascii",
                types: vec![CatalogType { name: "String", generic: false }],
                functions: vec![CatalogFn {
                    name: "length",
                    params: vec![("s", TypeRef::named("String"))],
                    ret: Some(TypeRef::named("U64")),
                }],
            },
            CatalogModule {
                path: "std::errors",
                types: vec![],
                functions: vec![
                    CatalogFn {
                        name: "invalid_argument",
                        params: vec![("code", TypeRef::named("U64"))],
                        ret: Some(TypeRef::named("U64")),
                    },
                    CatalogFn {
                        name: "limit_exceeded",
                        params: vec![("code", TypeRef::named("U64"))],
                        ret: Some(TypeRef::named("U64")),
                    },
                ],
            },
            CatalogModule {
                path: "std::vector",
                types: vec![CatalogType { name: "Vector", generic: true }],
                functions: vec![
                    CatalogFn {
                        name: "empty",
                        params: vec![],
                        ret: Some(TypeRef::Named {
                            name: "Vector",
                            args: vec![TypeRef::Param("T")],
                        }),
                    },
                    CatalogFn {
                        name: "length",
                        params: vec![(
                            "v",
                            TypeRef::Named {
                                name: "Vector",
                                args: vec![TypeRef::Param("T")],
                            },
                        )],
                        ret: Some(TypeRef::named("U64")),
                    },
                    CatalogFn {
                        name: "push_back",
                        params: vec![
                            (
                                "v",
                                TypeRef::Named {
                                    name: "Vector",
                                    args: vec![TypeRef::Param("T")],
                                },
                            ),
                            ("e", TypeRef::Param("T")),
                        ],
                        ret: None,
                    },
                ],
            },
            CatalogModule {
                path: "Table",
                types: vec![CatalogType { name: "Table", generic: true }],
                functions: vec![
                    CatalogFn {
                        name: "new",
                        params: vec![],
                        ret: Some(TypeRef::Named {
                            name: "Table",
                            args: vec![TypeRef::Param("K"), TypeRef::Param("V")],
                        }),
                    },
                    CatalogFn {
                        name: "contains",
                        params: vec![
                            (
                                "t",
                                TypeRef::Named {
                                    name: "Table",
                                    args: vec![TypeRef::Param("K"), TypeRef::Param("V")],
                                },
                            ),
                            ("k", TypeRef::Param("K")),
                        ],
                        ret: Some(TypeRef::named("Bool")),
                    },
                ],
            },
        ];
        modules.into_iter().map(|m| (m.path, m)).collect()
    };
}

/// Looks up a module by its dotted path.
pub fn module(path: &str) -> Option<&'static CatalogModule> {
    CATALOG.get(path)
}

/// Modules exporting a function called `name`; used for `use` suggestions
/// on undefined functions.
pub fn modules_exporting(name: &str) -> Vec<&'static CatalogModule> {
    CATALOG
        .values()
        .filter(|m| m.function(name).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_modules_resolve() {
        assert!(module("std::evm").is_some());
        assert!(module("Table").is_some());
        assert!(module("std::io").is_none());
    }

    #[test]
    fn signatures_are_reachable() {
        let sender = module("std::evm").unwrap().function("sender").unwrap();
        assert!(sender.params.is_empty());
        assert_eq!(sender.ret, Some(TypeRef::named("Address")));
    }

    #[test]
    fn export_search_finds_sender() {
        let exporters = modules_exporting("sender");
        assert_eq!(exporters.len(), 1);
        assert_eq!(exporters[0].path, "std::evm");
        // `length` is exported by two modules.
        assert_eq!(modules_exporting("length").len(), 2);
    }
}
