// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the chiller simulator
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings for the simulator. The configuration is backed by a
//! YAML file and validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! - `modbus`: Settings for the Modbus TCP server (bind address, unit id)
//! - `simulation`: Settings for the simulation engine (intervals, seed and an
//!   optional replacement variable table)
//!
//! ## Usage
//!
//! ```no_run
//! use rust_chiller_sim::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     None,                        // Modbus enabled
//!     Some("0.0.0.0".to_string()), // Modbus address
//!     Some(5020),                  // Modbus port
//!     Some(1),                     // Unit id
//!     Some(500),                   // Tick interval (ms)
//!     None,                        // Seed
//! );
//!
//! println!("Modbus port: {}", config.modbus.port);
//! ```

pub mod modbus;
pub mod simulation;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use modbus::ModbusConfig;
pub use simulation::SimulationConfig;
pub use utils::{is_valid_ip_address, output_config_schema};

/// Embedded JSON schema the YAML configuration is validated against.
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure for the simulator.
///
/// The configuration is deserialized from and serialized to YAML using serde.
/// Both sections fall back to their defaults when absent, so an empty file is
/// a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Modbus TCP server settings.
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Simulation engine settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. An existing file is
    /// parsed as YAML, validated against [`CONFIG_SCHEMA`], deserialized and
    /// finally checked by [`utils::validate_specific_rules`]. When any step
    /// fails a `<name>.sample.yaml` file with default values is written next
    /// to it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        Self::from_yaml_str(&contents).or_else(|err| {
            error!("Configuration error in {}: {:#}", path.display(), err);
            if let Err(sample_err) = Self::create_sample_config(path) {
                error!("Failed to create sample config: {}", sample_err);
            }
            Err(err.context(format!(
                "Invalid configuration file {}",
                path.display()
            )))
        })
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // An empty document is a valid, all-defaults configuration
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating configuration against schema");
        if let Err(error) = validator.validate(&json_value) {
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config =
            serde_yml::from_str(contents).context("Failed to deserialize configuration")?;

        utils::validate_specific_rules(&config)?;
        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only the values that are provided override the loaded configuration.
    ///
    /// # Parameters
    ///
    /// * `modbus_enabled` - Optional flag to enable/disable the Modbus server
    /// * `modbus_address` - Optional network address for the Modbus server
    /// * `modbus_port` - Optional TCP port for the Modbus server
    /// * `unit_id` - Optional Modbus unit (slave) identifier
    /// * `tick_interval_ms` - Optional delay between two simulation ticks
    /// * `seed` - Optional seed for reproducible samples
    pub fn apply_args(
        &mut self,
        modbus_enabled: Option<bool>,
        modbus_address: Option<String>,
        modbus_port: Option<u16>,
        unit_id: Option<u8>,
        tick_interval_ms: Option<u64>,
        seed: Option<u64>,
    ) {
        if let Some(enabled) = modbus_enabled {
            debug!("Overriding Modbus enabled from command line: {}", enabled);
            self.modbus.enabled = enabled;
        }
        if let Some(address) = modbus_address {
            debug!("Overriding Modbus address from command line: {}", address);
            self.modbus.address = address;
        }
        if let Some(port) = modbus_port {
            debug!("Overriding Modbus port from command line: {}", port);
            self.modbus.port = port;
        }
        if let Some(unit_id) = unit_id {
            debug!("Overriding Modbus unit id from command line: {}", unit_id);
            self.modbus.unit_id = unit_id;
        }
        if let Some(interval) = tick_interval_ms {
            debug!("Overriding tick interval from command line: {} ms", interval);
            self.simulation.tick_interval_ms = interval;
        }
        if let Some(seed) = seed {
            debug!("Overriding simulation seed from command line: {}", seed);
            self.simulation.seed = Some(seed);
        }
    }
}
