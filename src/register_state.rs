// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared register banks
//!
//! [`RegisterState`] holds the four Modbus banks of the simulated device and
//! its unit identifier. It is shared between the simulation engine, which
//! writes freshly sampled values, and the Modbus server, which serves client
//! reads and writes.
//!
//! ### Thread Safety
//!
//! Each bank sits behind its own `Mutex`, held for exactly one logical read or
//! write. A two-cell value written in one call is therefore never observed
//! half updated by a concurrent read of the same range. Nothing awaits while a
//! lock is held.
//!
//! ```
//! use std::sync::Arc;
//! use rust_chiller_sim::register_state::RegisterState;
//! use rust_chiller_sim::registry::{Block, Registry};
//!
//! let registry = Registry::load()?;
//! let state = Arc::new(RegisterState::from_layout(registry.layout(), 1));
//! state.write(Block::HoldingRegister, 899, &[0x41CC, 0x0000])?;
//! assert_eq!(state.read(Block::HoldingRegister, 899, 2)?, vec![0x41CC, 0x0000]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::error::RegisterError;
use crate::registry::{Block, RegisterLayout};

/// The four register banks of one Modbus unit.
#[derive(Debug)]
pub struct RegisterState {
    unit_id: u8,
    discrete_inputs: Mutex<Vec<u16>>,
    coils: Mutex<Vec<u16>>,
    holding_registers: Mutex<Vec<u16>>,
    input_registers: Mutex<Vec<u16>>,
}

impl RegisterState {
    /// Allocate zeroed banks sized by `layout`.
    pub fn from_layout(layout: &RegisterLayout, unit_id: u8) -> Self {
        Self::with_sizes(
            unit_id,
            layout.bank_size(Block::DiscreteInput),
            layout.bank_size(Block::Coil),
            layout.bank_size(Block::HoldingRegister),
            layout.bank_size(Block::InputRegister),
        )
    }

    /// Allocate zeroed banks with explicit sizes. A size of zero is raised to
    /// one cell.
    pub fn with_sizes(
        unit_id: u8,
        discrete_inputs: usize,
        coils: usize,
        holding_registers: usize,
        input_registers: usize,
    ) -> Self {
        debug!(
            "Allocating register banks for unit {}: DI={} CO={} HR={} IR={}",
            unit_id, discrete_inputs, coils, holding_registers, input_registers
        );
        Self {
            unit_id,
            discrete_inputs: Mutex::new(vec![0; discrete_inputs.max(1)]),
            coils: Mutex::new(vec![0; coils.max(1)]),
            holding_registers: Mutex::new(vec![0; holding_registers.max(1)]),
            input_registers: Mutex::new(vec![0; input_registers.max(1)]),
        }
    }

    /// Unit (slave) identifier served by this state.
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    /// Number of cells in `block`.
    pub fn size(&self, block: Block) -> usize {
        self.lock(block).map(|bank| bank.len()).unwrap_or(0)
    }

    /// Read `count` consecutive cells starting at `address`.
    ///
    /// # Errors
    ///
    /// [`RegisterError::OutOfRange`] if the range leaves the bank,
    /// [`RegisterError::Unavailable`] if the bank lock is poisoned.
    pub fn read(&self, block: Block, address: u16, count: u16) -> Result<Vec<u16>, RegisterError> {
        let bank = self.lock(block)?;
        let range = checked_range(block, &bank, address, count as usize)?;
        Ok(bank[range].to_vec())
    }

    /// Replace `words.len()` consecutive cells starting at `address`.
    ///
    /// The whole slice is written under one lock acquisition.
    pub fn write(&self, block: Block, address: u16, words: &[u16]) -> Result<(), RegisterError> {
        let mut bank = self.lock(block)?;
        let range = checked_range(block, &bank, address, words.len())?;
        bank[range].copy_from_slice(words);
        Ok(())
    }

    /// Read cells as bits, a cell being on when non-zero.
    pub fn read_bits(&self, block: Block, address: u16, count: u16) -> Result<Vec<bool>, RegisterError> {
        Ok(self
            .read(block, address, count)?
            .into_iter()
            .map(|cell| cell != 0)
            .collect())
    }

    /// Write bits as `0`/`1` cells.
    pub fn write_bits(&self, block: Block, address: u16, bits: &[bool]) -> Result<(), RegisterError> {
        let words: Vec<u16> = bits.iter().map(|&bit| u16::from(bit)).collect();
        self.write(block, address, &words)
    }

    /// Copy of a whole bank.
    pub fn snapshot(&self, block: Block) -> Result<Vec<u16>, RegisterError> {
        Ok(self.lock(block)?.clone())
    }

    fn bank(&self, block: Block) -> &Mutex<Vec<u16>> {
        match block {
            Block::DiscreteInput => &self.discrete_inputs,
            Block::Coil => &self.coils,
            Block::HoldingRegister => &self.holding_registers,
            Block::InputRegister => &self.input_registers,
        }
    }

    fn lock(&self, block: Block) -> Result<MutexGuard<'_, Vec<u16>>, RegisterError> {
        self.bank(block)
            .lock()
            .map_err(|err| RegisterError::Unavailable {
                block,
                reason: err.to_string(),
            })
    }
}

fn checked_range(
    block: Block,
    bank: &[u16],
    address: u16,
    count: usize,
) -> Result<std::ops::Range<usize>, RegisterError> {
    let start = address as usize;
    let end = start + count;
    if end > bank.len() {
        return Err(RegisterError::OutOfRange {
            block,
            address,
            end: end as u32,
            size: bank.len(),
        });
    }
    Ok(start..end)
}
