// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::{debug, warn};

use super::{Config, CONFIG_SCHEMA};
use crate::registry::Registry;

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_chiller_sim --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Check if a string is a valid IP address
///
/// Validates that a string represents a valid IPv4 or IPv6 address,
/// or is one of the special values like "localhost" or "0.0.0.0".
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    // Special cases
    matches!(addr, "localhost" | "::" | "::0" | "0.0.0.0")
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Port Range**: the Modbus port must be within 1-65535
/// - **IP Address Format**: an unusual bind address only produces a warning
/// - **Intervals**: tick and backoff intervals must be strictly positive
/// - **Variables**: a custom variable table must be a valid register map
///   (unique non-empty names, sane domains, in range, no overlaps)
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    if config.modbus.port == 0 {
        anyhow::bail!("Invalid Modbus port number: {}", config.modbus.port);
    }

    if !is_valid_ip_address(&config.modbus.address) {
        warn!(
            "Potentially invalid Modbus address format: {}",
            config.modbus.address
        );
    }

    if config.simulation.tick_interval_ms == 0 {
        anyhow::bail!("Simulation tick interval must be greater than zero");
    }
    if config.simulation.backoff_interval_ms == 0 {
        anyhow::bail!("Simulation backoff interval must be greater than zero");
    }

    if let Some(variables) = &config.simulation.variables {
        if variables.is_empty() {
            anyhow::bail!("Custom variable table is empty");
        }
        Registry::new(variables.clone()).context("Invalid simulation variable table")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Block, VariableDefinition};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_specific_rules(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config.modbus.port = 0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = Config::default();
        config.simulation.tick_interval_ms = 0;
        assert!(validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.simulation.backoff_interval_ms = 0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_overlapping_variables_rejected() {
        let mut config = Config::default();
        config.simulation.variables = Some(vec![
            VariableDefinition::uint32("LIM", Block::HoldingRegister, 10, 0, 100),
            VariableDefinition::bool("FLAG", Block::HoldingRegister, 11),
        ]);
        let err = validate_specific_rules(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("overlap"));
    }

    #[test]
    fn test_ip_addresses() {
        assert!(is_valid_ip_address("127.0.0.1"));
        assert!(is_valid_ip_address("::1"));
        assert!(is_valid_ip_address("localhost"));
        assert!(!is_valid_ip_address("not an address"));
    }
}
