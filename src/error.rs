// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types for the chiller simulator
//!
//! Configuration problems are fatal and surface to the caller of startup.
//! Everything that can go wrong while the simulation runs is reported as a
//! [`SimulationError`] and contained inside the engine.

use thiserror::Error;

use crate::registry::Block;

/// Invalid register map, detected while building the registry or its layout.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Variable at {block} address {address} has an empty name")]
    EmptyName { block: Block, address: u16 },

    #[error("Variable name '{name}' is defined more than once")]
    DuplicateName { name: String },

    #[error("Variable '{name}' has an invalid domain: {reason}")]
    InvalidDomain { name: String, reason: String },

    #[error(
        "Variable '{name}' at {block} address {address} needs {width} cells and overflows the 16-bit address space"
    )]
    AddressOutOfRange {
        name: String,
        block: Block,
        address: u16,
        width: u16,
    },

    #[error(
        "Variables '{first}' and '{second}' overlap in {block} (cells {first_start}..{first_end} and {second_start}..{second_end})"
    )]
    Overlap {
        block: Block,
        first: String,
        first_start: u32,
        first_end: u32,
        second: String,
        second_start: u32,
        second_end: u32,
    },
}

/// A sampled value that cannot be stored under its declared type.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot encode value {value} for '{name}': {reason}")]
pub struct EncodeError {
    pub name: String,
    pub value: String,
    pub reason: String,
}

/// A value that could not be committed into the register banks.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to write {count} cell(s) at {block} address {address}: {reason}")]
pub struct TransientWriteError {
    pub block: Block,
    pub address: u16,
    pub count: usize,
    pub reason: String,
}

/// Runtime failure of one variable during a simulation tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    TransientWrite(#[from] TransientWriteError),
}

/// Access failure on one of the register banks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error("{block} range {address}..{end} is outside the bank of {size} cells")]
    OutOfRange {
        block: Block,
        address: u16,
        end: u32,
        size: usize,
    },

    #[error("{block} bank is unavailable: {reason}")]
    Unavailable { block: Block, reason: String },
}
