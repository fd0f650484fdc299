// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus TCP server configuration

use serde::{Deserialize, Serialize};

/// Configuration for the Modbus TCP server component.
///
/// # Example
///
/// ```
/// use rust_chiller_sim::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     enabled: true,
///     port: 5020,
///     address: "0.0.0.0".to_string(),
///     unit_id: 1,
///     strict_unit_id: true,
/// };
/// assert_eq!(modbus_config.socket_address(), "0.0.0.0:5020");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Flag to enable or disable the Modbus server.
    ///
    /// With the server disabled the simulation still runs, which is only
    /// useful for testing the engine.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// The TCP port the Modbus server will listen on.
    ///
    /// Default value is 502, the standard Modbus TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The network address the Modbus server will bind to.
    ///
    /// Use "0.0.0.0" to bind to all IPv4 interfaces.
    #[serde(default = "default_address")]
    pub address: String,

    /// Unit (slave) identifier of the simulated chiller.
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// Only answer requests addressed to `unit_id`.
    ///
    /// When false (the default) every unit id is answered, as a single-device
    /// gateway would.
    #[serde(default)]
    pub strict_unit_id: bool,
}

impl ModbusConfig {
    /// `address:port` string suitable for binding.
    pub fn socket_address(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    502
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_unit_id() -> u8 {
    255
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            address: default_address(),
            unit_id: default_unit_id(),
            strict_unit_id: false,
        }
    }
}
