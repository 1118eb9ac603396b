// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! IR-level types.

use kanso_analysis::SemType;
use std::fmt;

/// The type of an IR value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    /// Unsigned integer, bit width in {8, 16, 32, 64, 128, 256}.
    UInt(u16),
    Bool,
    Address,
    Str,
    /// Abstract storage mapping from key to value.
    Slots(Box<IrType>, Box<IrType>),
    Tuple(Vec<IrType>),
    /// An abstract storage address derived from a base slot and keys.
    StorageAddr,
}

impl IrType {
    pub const U256: IrType = IrType::UInt(256);

    /// Converts an analyzed semantic type; `Table` becomes [`IrType::Slots`].
    pub fn from_sem(ty: &SemType) -> IrType {
        match ty {
            SemType::UInt(w) => IrType::UInt(*w),
            SemType::Bool => IrType::Bool,
            SemType::Address => IrType::Address,
            SemType::Str => IrType::Str,
            SemType::Table(k, v) => IrType::Slots(
                Box::new(IrType::from_sem(k)),
                Box::new(IrType::from_sem(v)),
            ),
            SemType::Tuple(elements) => {
                IrType::Tuple(elements.iter().map(IrType::from_sem).collect())
            }
            // Vectors, structs and poison types have no first-class IR
            // value representation; they surface as opaque 256-bit words.
            SemType::Vector(_) | SemType::Struct(_) | SemType::Unit | SemType::Error => {
                IrType::U256
            }
        }
    }

    /// The canonical ABI spelling used in event signatures.
    pub fn abi_name(&self) -> String {
        match self {
            IrType::UInt(w) => format!("uint{w}"),
            IrType::Bool => "bool".to_string(),
            IrType::Address => "address".to_string(),
            IrType::Str => "string".to_string(),
            IrType::Slots(..) | IrType::Tuple(_) | IrType::StorageAddr => "bytes32".to_string(),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::UInt(w) => write!(f, "U{w}"),
            IrType::Bool => f.write_str("Bool"),
            IrType::Address => f.write_str("Address"),
            IrType::Str => f.write_str("String"),
            IrType::Slots(k, v) => write!(f, "Slots<{k}, {v}>"),
            IrType::Tuple(elements) => {
                f.write_str("(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                f.write_str(")")
            }
            IrType::StorageAddr => f.write_str("StorageAddr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn abi_spellings() {
        assert_eq!(IrType::U256.abi_name(), "uint256");
        assert_eq!(IrType::Bool.abi_name(), "bool");
        assert_eq!(IrType::Address.abi_name(), "address");
    }

    #[test]
    fn table_becomes_slots() {
        let sem = SemType::Table(Box::new(SemType::Address), Box::new(SemType::U256));
        assert_eq!(
            IrType::from_sem(&sem),
            IrType::Slots(Box::new(IrType::Address), Box::new(IrType::U256))
        );
        assert_eq!(IrType::from_sem(&sem).to_string(), "Slots<Address, U256>");
    }
}
