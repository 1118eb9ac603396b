// Copyright 2025-2026, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/kanso-lang/blob/main/licenses/COPYRIGHT.md

//! Event emission.
//!
//! `emit(Transfer { from, to, value })` lowers to the canonical EVM log
//! shape: address fields become indexed topics via `TopicAddr`, the
//! numeric field is ABI-encoded into a fresh 32-byte data region, and a
//! single `LOG{1+n}` fires with the event's signature hash as topic 0.

use super::{BuildError, Builder};
use crate::inst::{ConstVal, InstKind};
use crate::types::IrType;
use crate::value::ValueId;
use alloy_primitives::U256;
use kanso_parser::ast::Expr;
use log::warn;

impl Builder<'_> {
    /// Lowers `emit(<event literal>)`.
    pub(crate) fn lower_emit(&mut self, arg: &Expr) -> Result<(), BuildError> {
        let Expr::StructLit { name, fields, .. } = arg else {
            return Err(BuildError::Unsupported(
                "emit expects an event struct literal".to_string(),
            ));
        };

        let signature = self
            .program
            .event(&name.name)
            .ok_or_else(|| {
                BuildError::Unsupported(format!("`{}` is not a registered event", name.name))
            })?
            .value;

        // Field values evaluate in declaration order.
        let mut lowered: Vec<(ValueId, IrType)> = Vec::with_capacity(fields.len());
        for (_, value_expr) in fields {
            let value = self.lower_expr(value_expr, None)?;
            let ty = self.program.value(value).ty.clone();
            lowered.push((value, ty));
        }

        let mut topic_args = Vec::new();
        let mut data_field = None;
        for (value, ty) in &lowered {
            match ty {
                IrType::Address => {
                    let topic_name = self.temp_name();
                    let topic = self.emit(
                        InstKind::TopicAddr { address: *value },
                        topic_name,
                        IrType::U256,
                        0,
                    );
                    topic_args.push(topic);
                }
                _ => {
                    if data_field.is_none() {
                        data_field = Some(*value);
                    } else {
                        warn!(
                            "event `{}`: only the first data field is packed",
                            name.name
                        );
                    }
                }
            }
        }

        let (data_ptr, data_len) = match data_field {
            Some(value) => {
                let region = self.next_region();
                let ptr_name = self.temp_name();
                let ptr = self.emit(
                    InstKind::AbiEncU256 { value, region },
                    ptr_name,
                    IrType::U256,
                    0,
                );
                let len_name = self.temp_name();
                let len = self.emit(
                    InstKind::Constant {
                        value: ConstVal::Int(U256::from(32u64)),
                    },
                    len_name,
                    IrType::U256,
                    0,
                );
                (ptr, len)
            }
            None => (self.program.constants.zero, self.program.constants.zero),
        };

        let topics_n = 1 + topic_args.len() as u8;
        self.emit_void(InstKind::Log {
            topics_n,
            signature,
            topic_args,
            data_ptr,
            data_len,
        });
        Ok(())
    }
}
