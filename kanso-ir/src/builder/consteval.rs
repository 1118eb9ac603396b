// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Const-eval intrinsics.
//!
//! A closed table of zero-argument standard-library calls that lower to a
//! compile-time constant instead of a `Call`. Extending it is a table
//! edit, matching the catalog's closed-surface design.

use super::Builder;
use crate::value::ValueId;

/// The constant an intrinsic produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intrinsic {
    /// `std::address::zero()` → the canonical `zero_addr`.
    ZeroAddress,
}

fn lookup(module: &str, name: &str) -> Option<Intrinsic> {
    match (module, name) {
        ("std::address", "zero") => Some(Intrinsic::ZeroAddress),
        _ => None,
    }
}

/// The canonical value for an intrinsic call, if `module::name` is one.
pub(crate) fn intrinsic_value(
    builder: &Builder<'_>,
    module: &str,
    name: &str,
) -> Option<ValueId> {
    match lookup(module, name)? {
        Intrinsic::ZeroAddress => Some(builder.program.constants.zero_addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_intrinsics_resolve() {
        assert_eq!(
            lookup("std::address", "zero"),
            Some(Intrinsic::ZeroAddress)
        );
        assert_eq!(lookup("std::evm", "sender"), None);
        assert_eq!(lookup("std::address", "new"), None);
    }
}
