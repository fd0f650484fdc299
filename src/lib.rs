// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust chiller simulator library
//!
//! This library simulates an industrial water chiller exposed over Modbus TCP.
//! A fixed table of named variables is mapped onto the four Modbus register
//! banks; a periodic engine fills them with random in-range values that any
//! Modbus client can read.
//!
//! ## Modules
//!
//! - [`registry`]: variable definitions, the built-in chiller map and the
//!   register layout derived from it
//! - [`codec`]: 32-bit values over two 16-bit registers, high word first
//! - [`register_state`]: the shared register banks
//! - [`simulation`]: the sampling loop and its cancellation
//! - [`modbus`]: the Modbus TCP server
//! - [`config`]: YAML configuration with schema validation
//! - [`daemon`]: task orchestration for the binary

pub mod codec;
pub mod config;
pub mod daemon;
pub mod error;
pub mod modbus;
pub mod register_state;
pub mod registry;
pub mod simulation;
