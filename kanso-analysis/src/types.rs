// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! The semantic type lattice.
//!
//! `Error` is the poison type: it enters wherever a diagnostic was already
//! reported and is compatible with everything, so one mistake does not
//! cascade into a page of follow-on errors.

use std::fmt;

/// A resolved Kanso type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemType {
    /// Unsigned integer of the given bit width (8..=256).
    UInt(u16),
    Bool,
    Address,
    Str,
    /// Keyed storage mapping, `Table<K, V>` in source.
    Table(Box<SemType>, Box<SemType>),
    Vector(Box<SemType>),
    Tuple(Vec<SemType>),
    /// A user-declared struct, by name.
    Struct(String),
    /// The type of expressions that produce no value.
    Unit,
    /// Poison: a diagnostic has already been reported.
    Error,
}

impl SemType {
    pub const U256: SemType = SemType::UInt(256);
    pub const U64: SemType = SemType::UInt(64);

    /// Parses a built-in type name (`U256`, `Bool`, `Address`, `String`).
    pub fn builtin(name: &str) -> Option<SemType> {
        Some(match name {
            "U8" => SemType::UInt(8),
            "U16" => SemType::UInt(16),
            "U32" => SemType::UInt(32),
            "U64" => SemType::UInt(64),
            "U128" => SemType::UInt(128),
            "U256" => SemType::UInt(256),
            "Bool" => SemType::Bool,
            "Address" => SemType::Address,
            "String" => SemType::Str,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SemType::UInt(_) | SemType::Error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SemType::Error)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, SemType::Unit)
    }

    /// Type compatibility: exact match, with `Error` absorbing anything.
    ///
    /// Widths never coerce implicitly; narrowing requires an explicit
    /// cast, which surfaces here as plain inequality.
    pub fn compatible(&self, other: &SemType) -> bool {
        if self.is_error() || other.is_error() {
            return true;
        }
        match (self, other) {
            (SemType::Table(ka, va), SemType::Table(kb, vb)) => {
                ka.compatible(kb) && va.compatible(vb)
            }
            (SemType::Vector(a), SemType::Vector(b)) => a.compatible(b),
            (SemType::Tuple(a), SemType::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.compatible(y))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::UInt(width) => write!(f, "U{width}"),
            SemType::Bool => f.write_str("Bool"),
            SemType::Address => f.write_str("Address"),
            SemType::Str => f.write_str("String"),
            SemType::Table(k, v) => write!(f, "Table<{k}, {v}>"),
            SemType::Vector(e) => write!(f, "Vector<{e}>"),
            SemType::Tuple(elements) => {
                f.write_str("(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
            SemType::Struct(name) => f.write_str(name),
            SemType::Unit => f.write_str("()"),
            SemType::Error => f.write_str("{error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtins_resolve() {
        assert_eq!(SemType::builtin("U256"), Some(SemType::U256));
        assert_eq!(SemType::builtin("Bool"), Some(SemType::Bool));
        assert_eq!(SemType::builtin("u256"), None);
    }

    #[test]
    fn widths_do_not_coerce() {
        assert!(!SemType::UInt(64).compatible(&SemType::UInt(256)));
        assert!(SemType::U256.compatible(&SemType::U256));
    }

    #[test]
    fn error_absorbs_everything() {
        assert!(SemType::Error.compatible(&SemType::Bool));
        assert!(SemType::Table(Box::new(SemType::Address), Box::new(SemType::Error))
            .compatible(&SemType::Table(Box::new(SemType::Address), Box::new(SemType::U256))));
    }

    #[test]
    fn display_forms() {
        let table = SemType::Table(
            Box::new(SemType::Tuple(vec![SemType::Address, SemType::Address])),
            Box::new(SemType::U256),
        );
        assert_eq!(table.to_string(), "Table<(Address, Address), U256>");
    }
}
