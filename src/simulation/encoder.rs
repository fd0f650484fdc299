// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Conversion of sampled values into register cells

use crate::codec::{encode_float32, encode_uint32};
use crate::error::EncodeError;
use crate::registry::{DataType, VariableDefinition};

use super::sampler::SampledValue;

/// Encoded cells of one variable, ready to be written at its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cells {
    Single([u16; 1]),
    Pair([u16; 2]),
}

impl Cells {
    pub fn as_slice(&self) -> &[u16] {
        match self {
            Cells::Single(cells) => cells,
            Cells::Pair(cells) => cells,
        }
    }
}

/// Encode `value` for `definition`.
///
/// The value must match the declared type and lie within its domain; floats
/// must also be finite.
pub fn encode_sample(
    definition: &VariableDefinition,
    value: SampledValue,
) -> Result<Cells, EncodeError> {
    let reject = |reason: String| EncodeError {
        name: definition.name.clone(),
        value: value.to_string(),
        reason,
    };

    match (definition.data_type, value) {
        (DataType::Bool, SampledValue::Bool(bit)) => Ok(Cells::Single([u16::from(bit)])),
        (DataType::Float32 { min, max }, SampledValue::Float32(v)) => {
            if !v.is_finite() {
                return Err(reject("not a finite number".to_string()));
            }
            if v < min || v > max {
                return Err(reject(format!("outside domain [{min}, {max}]")));
            }
            let (hi, lo) = encode_float32(v);
            Ok(Cells::Pair([hi, lo]))
        }
        (DataType::UInt32 { min, max }, SampledValue::UInt32(v)) => {
            if v < min || v > max {
                return Err(reject(format!("outside domain [{min}, {max}]")));
            }
            let (hi, lo) = encode_uint32(v);
            Ok(Cells::Pair([hi, lo]))
        }
        (declared, sampled) => Err(reject(format!(
            "declared as {} but sampled as {}",
            declared.type_name(),
            sampled.type_name()
        ))),
    }
}
