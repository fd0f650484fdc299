// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Block sizing and address validation
//!
//! Each Modbus block is sized to hold its highest variable: the bank size is
//! `max(address + width)` over the variables mapped to it, or a single cell
//! when no variable maps to it so that every bank stays addressable.
//!
//! While grouping, the variables of each block are sorted by address and
//! neighbours are checked for intersecting ranges. Overlaps are rejected
//! instead of letting two variables silently overwrite each other.

use std::collections::{BTreeMap, HashMap};

use crate::error::ConfigurationError;

use super::{Block, VariableDefinition};

/// Number of addressable cells in one Modbus block.
pub const ADDRESS_SPACE: u32 = 1 << 16;

/// Bank sizes and address index derived from a variable table.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterLayout {
    bank_sizes: HashMap<Block, usize>,
    address_index: BTreeMap<(Block, u16), VariableDefinition>,
}

impl RegisterLayout {
    /// Allocated number of cells for `block`. Never zero.
    pub fn bank_size(&self, block: Block) -> usize {
        self.bank_sizes.get(&block).copied().unwrap_or(1)
    }

    pub fn bank_sizes(&self) -> &HashMap<Block, usize> {
        &self.bank_sizes
    }

    /// Variables keyed by `(block, first cell)`.
    pub fn address_index(&self) -> &BTreeMap<(Block, u16), VariableDefinition> {
        &self.address_index
    }

    pub fn variable_at(&self, block: Block, address: u16) -> Option<&VariableDefinition> {
        self.address_index.get(&(block, address))
    }
}

/// Compute bank sizes for the four blocks and check address ranges.
///
/// # Errors
///
/// * [`ConfigurationError::AddressOutOfRange`] when a variable does not fit
///   in the 16-bit address space
/// * [`ConfigurationError::Overlap`] when two variables of the same block
///   share at least one cell
pub fn compute_layout(
    definitions: &[VariableDefinition],
) -> Result<RegisterLayout, ConfigurationError> {
    let mut groups: HashMap<Block, Vec<&VariableDefinition>> = HashMap::new();
    for definition in definitions {
        if definition.end() > ADDRESS_SPACE {
            return Err(ConfigurationError::AddressOutOfRange {
                name: definition.name.clone(),
                block: definition.block,
                address: definition.address,
                width: definition.width(),
            });
        }
        groups.entry(definition.block).or_default().push(definition);
    }

    let mut bank_sizes = HashMap::with_capacity(Block::ALL.len());
    let mut address_index = BTreeMap::new();

    for block in Block::ALL {
        let Some(group) = groups.get_mut(&block) else {
            bank_sizes.insert(block, 1);
            continue;
        };
        group.sort_by_key(|d| d.address);

        for pair in group.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            if u32::from(second.address) < first.end() {
                return Err(ConfigurationError::Overlap {
                    block,
                    first: first.name.clone(),
                    first_start: first.address as u32,
                    first_end: first.end(),
                    second: second.name.clone(),
                    second_start: second.address as u32,
                    second_end: second.end(),
                });
            }
        }

        // Sorted and disjoint, so the last variable ends highest.
        let size = group.last().map(|d| d.end() as usize).unwrap_or(1);
        bank_sizes.insert(block, size.max(1));

        for definition in group.iter() {
            address_index.insert((block, definition.address), (*definition).clone());
        }
    }

    Ok(RegisterLayout {
        bank_sizes,
        address_index,
    })
}
