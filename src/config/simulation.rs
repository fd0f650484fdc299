// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulation engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::VariableDefinition;

/// Settings of the periodic simulation engine.
///
/// # Example
///
/// ```yaml
/// simulation:
///   enabled: true
///   tick_interval_ms: 2000
///   backoff_interval_ms: 1000
///   seed: 42
///   variables:
///     - name: SETPOINT_csp1
///       block: holding_register
///       address: 899
///       data_type:
///         type: float32
///         min: -28.88
///         max: 26.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run the simulation engine.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Delay between two ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Delay after a tick that had failures, in milliseconds.
    #[serde(default = "default_backoff_interval_ms")]
    pub backoff_interval_ms: u64,

    /// Seed for reproducible samples. Random when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Replacement for the built-in chiller register map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<VariableDefinition>>,
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn backoff_interval(&self) -> Duration {
        Duration::from_millis(self.backoff_interval_ms)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    2000
}

fn default_backoff_interval_ms() -> u64 {
    1000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tick_interval_ms: default_tick_interval_ms(),
            backoff_interval_ms: default_backoff_interval_ms(),
            seed: None,
            variables: None,
        }
    }
}
