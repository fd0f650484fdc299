// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Variable registry
//!
//! The registry is the declarative model of everything the simulated chiller
//! exposes on the network. Each [`VariableDefinition`] names a value, places it
//! in one of the four Modbus blocks and carries a typed domain that the
//! simulation engine samples from.
//!
//! A [`Registry`] can only be obtained through validation: names must be
//! unique, domains well formed and address ranges must neither leave the
//! 16-bit address space nor overlap inside a block. The registry is read-only
//! once built.
//!
//! ```
//! use rust_chiller_sim::registry::{Block, Registry};
//!
//! let registry = Registry::load()?;
//! assert_eq!(registry.layout().bank_size(Block::HoldingRegister), 4121);
//! # Ok::<(), rust_chiller_sim::error::ConfigurationError>(())
//! ```

pub mod chiller;
pub mod layout;

use std::collections::HashSet;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub use layout::{compute_layout, RegisterLayout};

/// Modbus register spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// Read-only bits
    DiscreteInput,
    /// Read-write bits
    Coil,
    /// Read-write 16-bit registers
    HoldingRegister,
    /// Read-only 16-bit registers
    InputRegister,
}

impl Block {
    /// All blocks, in Modbus table order.
    pub const ALL: [Block; 4] = [
        Block::DiscreteInput,
        Block::Coil,
        Block::HoldingRegister,
        Block::InputRegister,
    ];

    /// Short name used in log output ("DI", "CO", "HR", "IR").
    pub fn short_name(&self) -> &'static str {
        match self {
            Block::DiscreteInput => "DI",
            Block::Coil => "CO",
            Block::HoldingRegister => "HR",
            Block::InputRegister => "IR",
        }
    }

    /// Whether network clients may write into this block.
    pub fn is_writable(&self) -> bool {
        matches!(self, Block::Coil | Block::HoldingRegister)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Block::DiscreteInput => "discrete inputs",
            Block::Coil => "coils",
            Block::HoldingRegister => "holding registers",
            Block::InputRegister => "input registers",
        };
        f.write_str(name)
    }
}

/// Value type of a variable, with its inclusive sampling domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataType {
    /// One cell holding 0 or 1
    Bool,
    /// Two cells, IEEE-754 single precision, high word first
    Float32 { min: f32, max: f32 },
    /// Two cells, unsigned 32-bit integer, high word first
    UInt32 { min: u32, max: u32 },
}

impl DataType {
    /// Number of 16-bit cells occupied by a value of this type.
    pub fn width(&self) -> u16 {
        match self {
            DataType::Bool => 1,
            DataType::Float32 { .. } | DataType::UInt32 { .. } => 2,
        }
    }

    /// Lower-case type name, as written in configuration files.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Float32 { .. } => "float32",
            DataType::UInt32 { .. } => "uint32",
        }
    }

    fn check_domain(&self) -> Result<(), String> {
        match *self {
            DataType::Bool => Ok(()),
            DataType::Float32 { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    Err(format!("bounds [{min}, {max}] must be finite"))
                } else if min > max {
                    Err(format!("min {min} is greater than max {max}"))
                } else if !(max - min).is_finite() {
                    // Uniform sampling needs a finite span
                    Err(format!("span of [{min}, {max}] overflows f32"))
                } else {
                    Ok(())
                }
            }
            DataType::UInt32 { min, max } => {
                if min > max {
                    Err(format!("min {min} is greater than max {max}"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Immutable descriptor of one addressable variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Unique identifier, e.g. `SETPOINT_csp1`
    pub name: String,
    /// Register space the variable lives in
    pub block: Block,
    /// Zero-based offset of the first cell within the block
    pub address: u16,
    /// Type and sampling domain
    pub data_type: DataType,
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, block: Block, address: u16, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            block,
            address,
            data_type,
        }
    }

    pub fn bool(name: impl Into<String>, block: Block, address: u16) -> Self {
        Self::new(name, block, address, DataType::Bool)
    }

    pub fn float32(name: impl Into<String>, block: Block, address: u16, min: f32, max: f32) -> Self {
        Self::new(name, block, address, DataType::Float32 { min, max })
    }

    pub fn uint32(name: impl Into<String>, block: Block, address: u16, min: u32, max: u32) -> Self {
        Self::new(name, block, address, DataType::UInt32 { min, max })
    }

    /// Number of cells occupied by this variable.
    pub fn width(&self) -> u16 {
        self.data_type.width()
    }

    /// One past the last cell, computed without 16-bit overflow.
    pub fn end(&self) -> u32 {
        self.address as u32 + self.width() as u32
    }
}

/// Validated, read-only table of variables together with its register layout.
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: Vec<VariableDefinition>,
    layout: RegisterLayout,
}

impl Registry {
    /// Validate a variable table and compute its layout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for an empty or duplicated name, a
    /// malformed domain, a range leaving the 16-bit address space or two
    /// overlapping ranges in the same block.
    pub fn new(definitions: Vec<VariableDefinition>) -> Result<Self, ConfigurationError> {
        check_definitions(&definitions)?;

        let layout = compute_layout(&definitions)?;
        debug!(
            "Registry validated: {} variables, bank sizes DI={} CO={} HR={} IR={}",
            definitions.len(),
            layout.bank_size(Block::DiscreteInput),
            layout.bank_size(Block::Coil),
            layout.bank_size(Block::HoldingRegister),
            layout.bank_size(Block::InputRegister),
        );

        Ok(Self {
            definitions,
            layout,
        })
    }

    /// The built-in chiller register map.
    pub fn load() -> Result<Self, ConfigurationError> {
        Self::new(chiller::variables())
    }

    /// Use the configured table when present, the built-in one otherwise.
    pub fn from_definitions(
        definitions: Option<Vec<VariableDefinition>>,
    ) -> Result<Self, ConfigurationError> {
        match definitions {
            Some(definitions) => Self::new(definitions),
            None => Self::load(),
        }
    }

    /// Variables in declaration order.
    pub fn definitions(&self) -> &[VariableDefinition] {
        &self.definitions
    }

    pub fn layout(&self) -> &RegisterLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Find a variable by name.
    pub fn get(&self, name: &str) -> Option<&VariableDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Find the variable whose first cell is at `address` in `block`.
    pub fn lookup(&self, block: Block, address: u16) -> Option<&VariableDefinition> {
        self.layout.variable_at(block, address)
    }
}

/// Name and domain checks that do not depend on the layout.
fn check_definitions(definitions: &[VariableDefinition]) -> Result<(), ConfigurationError> {
    let mut names = HashSet::with_capacity(definitions.len());
    for definition in definitions {
        if definition.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName {
                block: definition.block,
                address: definition.address,
            });
        }
        if !names.insert(definition.name.as_str()) {
            return Err(ConfigurationError::DuplicateName {
                name: definition.name.clone(),
            });
        }
        definition
            .data_type
            .check_domain()
            .map_err(|reason| ConfigurationError::InvalidDomain {
                name: definition.name.clone(),
                reason,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_loads() {
        let registry = Registry::load().unwrap();
        assert_eq!(registry.len(), 30);
        assert_eq!(registry.layout().bank_size(Block::DiscreteInput), 1);
        assert_eq!(registry.layout().bank_size(Block::Coil), 1);
        assert_eq!(registry.layout().bank_size(Block::HoldingRegister), 4121);
        assert_eq!(registry.layout().bank_size(Block::InputRegister), 9111);

        let csp1 = registry.get("SETPOINT_csp1").unwrap();
        assert_eq!(csp1.block, Block::HoldingRegister);
        assert_eq!(csp1.address, 899);
        assert_eq!(
            csp1.data_type,
            DataType::Float32 {
                min: -28.88,
                max: 26.0
            }
        );
        assert_eq!(
            registry.lookup(Block::InputRegister, 41).map(|d| d.name.as_str()),
            Some("UNIT_STATUS")
        );
        assert!(registry.lookup(Block::InputRegister, 42).is_none());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let result = Registry::new(vec![
            VariableDefinition::bool("ALM", Block::DiscreteInput, 0),
            VariableDefinition::uint32("ALM", Block::InputRegister, 0, 0, 1),
        ]);
        assert_eq!(
            result.unwrap_err(),
            ConfigurationError::DuplicateName {
                name: "ALM".to_string()
            }
        );
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let result = Registry::new(vec![VariableDefinition::bool(" ", Block::Coil, 3)]);
        assert!(matches!(
            result,
            Err(ConfigurationError::EmptyName {
                block: Block::Coil,
                address: 3
            })
        ));
    }

    #[test]
    fn test_invalid_domains_are_rejected() {
        let reversed = Registry::new(vec![VariableDefinition::uint32(
            "LIM",
            Block::HoldingRegister,
            0,
            10,
            1,
        )]);
        assert!(matches!(
            reversed,
            Err(ConfigurationError::InvalidDomain { ref name, .. }) if name == "LIM"
        ));

        let infinite = Registry::new(vec![VariableDefinition::float32(
            "TEMP",
            Block::InputRegister,
            0,
            0.0,
            f32::INFINITY,
        )]);
        assert!(matches!(
            infinite,
            Err(ConfigurationError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn test_float_domain_with_overflowing_span_is_rejected() {
        let wide = Registry::new(vec![VariableDefinition::float32(
            "WIDE",
            Block::InputRegister,
            0,
            -3.0e38,
            3.0e38,
        )]);
        assert!(matches!(
            wide,
            Err(ConfigurationError::InvalidDomain { ref name, .. }) if name == "WIDE"
        ));

        // A wide span that stays finite is accepted
        assert!(Registry::new(vec![VariableDefinition::float32(
            "HALF",
            Block::InputRegister,
            0,
            -1.0e38,
            1.0e38,
        )])
        .is_ok());
    }

    #[test]
    fn test_from_definitions_falls_back_to_builtin_table() {
        let registry = Registry::from_definitions(None).unwrap();
        assert_eq!(registry.len(), Registry::load().unwrap().len());

        let custom = Registry::from_definitions(Some(vec![VariableDefinition::bool(
            "ALM",
            Block::DiscreteInput,
            0,
        )]))
        .unwrap();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom.layout().bank_size(Block::DiscreteInput), 1);
    }

    #[test]
    fn test_variable_definition_yaml_shape() {
        let yaml = r#"
name: SETPOINT_csp1
block: holding_register
address: 899
data_type:
  type: float32
  min: -28.88
  max: 26.0
"#;
        let definition: VariableDefinition = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            definition,
            VariableDefinition::float32("SETPOINT_csp1", Block::HoldingRegister, 899, -28.88, 26.0)
        );

        let alarm: VariableDefinition = serde_yml::from_str(
            "name: ALM\nblock: discrete_input\naddress: 0\ndata_type:\n  type: bool\n",
        )
        .unwrap();
        assert_eq!(alarm.data_type, DataType::Bool);
    }
}
