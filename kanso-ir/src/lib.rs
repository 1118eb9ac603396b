// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! EVM-flavored SSA intermediate representation for Kanso.
//!
//! The model is arena-based: a [`Program`] owns a value arena, each
//! [`Function`] owns its block and instruction arenas, and every cross
//! reference is an index (`ValueId`, `BlockId`, `InstId`). That keeps the
//! control-flow graph free of ownership cycles and makes the whole program
//! trivially serializable.
//!
//! [`build`] lowers an analyzed AST into a program; [`optimize`] runs the
//! fixed pass pipeline over it; [`print_program`] renders the stable text
//! form used by golden tests.

pub mod block;
pub mod builder;
pub mod cfg;
pub mod inst;
pub mod opt;
pub mod printer;
pub mod program;
pub mod types;
pub mod value;

pub use block::{BasicBlock, BlockId, Terminator};
pub use builder::{build, BuildError};
pub use cfg::ProgramCfg;
pub use inst::{BinOp, CheckedOp, ConstVal, Effect, Inst, InstId, InstKind, MemoryEffect, SlotRef, StorageEffect};
pub use opt::optimize;
pub use printer::print_program;
pub use program::{EventSignature, Function, Program, StorageSlot};
pub use types::IrType;
pub use value::{Value, ValueId, CANONICAL_ID};
