// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Periodic simulation engine
//!
//! The engine cycles through four phases: **sampling** a value for every
//! variable, **encoding** it into cells, **writing** the cells into the
//! register banks and **sleeping** until the next tick.
//!
//! Failures are contained per variable: an encode or write error is logged,
//! the remaining variables are still updated and the engine keeps running.
//! After a tick with failures the engine waits the (shorter) backoff interval
//! instead of the tick interval.
//!
//! The loop stops only when its [`ShutdownSignal`] fires. The signal is
//! checked before each tick and raced against the sleep, so stopping takes at
//! most one interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::config::SimulationConfig;
use crate::error::{SimulationError, TransientWriteError};
use crate::register_state::RegisterState;
use crate::registry::{Block, Registry, VariableDefinition};

use super::encoder::encode_sample;
use super::sampler::{SampledValue, ValueSampler};
use super::shutdown::ShutdownSignal;

/// Destination of encoded cells.
#[cfg_attr(test, mockall::automock)]
pub trait RegisterSink: Send + Sync {
    /// Write `words` starting at `address` in `block` as one atomic update.
    fn write_cells(&self, block: Block, address: u16, words: &[u16]) -> Result<(), TransientWriteError>;
}

impl RegisterSink for RegisterState {
    fn write_cells(&self, block: Block, address: u16, words: &[u16]) -> Result<(), TransientWriteError> {
        self.write(block, address, words)
            .map_err(|err| TransientWriteError {
                block,
                address,
                count: words.len(),
                reason: err.to_string(),
            })
    }
}

/// Suspension point between ticks.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Outcome of one pass over the registry.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Tick sequence number, starting at 1
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    /// Successfully written values, in registry order
    pub samples: Vec<(String, SampledValue)>,
    pub failures: Vec<SimulationError>,
}

impl TickReport {
    fn new(tick: u64) -> Self {
        Self {
            tick,
            timestamp: Utc::now(),
            samples: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn value_of(&self, name: &str) -> Option<SampledValue> {
        self.samples
            .iter()
            .find(|(sample_name, _)| sample_name == name)
            .map(|(_, value)| *value)
    }

    /// One-line summary: `Updated: NAME: value | NAME: value`.
    pub fn summary(&self) -> String {
        let values = self
            .samples
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join(" | ");
        if self.failures.is_empty() {
            format!("Updated: {values}")
        } else {
            format!("Updated: {values} ({} failed)", self.failures.len())
        }
    }
}

/// Sampling loop writing into the register banks.
pub struct SimulationEngine {
    registry: Arc<Registry>,
    sink: Arc<dyn RegisterSink>,
    sampler: Box<dyn ValueSampler>,
    tick_interval: Duration,
    backoff_interval: Duration,
    ticks: u64,
}

impl SimulationEngine {
    pub fn new(
        registry: Arc<Registry>,
        sink: Arc<dyn RegisterSink>,
        sampler: Box<dyn ValueSampler>,
        tick_interval: Duration,
        backoff_interval: Duration,
    ) -> Self {
        Self {
            registry,
            sink,
            sampler,
            tick_interval,
            backoff_interval,
            ticks: 0,
        }
    }

    /// Engine configured from the `simulation` section of the config file.
    pub fn from_config(
        registry: Arc<Registry>,
        sink: Arc<dyn RegisterSink>,
        sampler: Box<dyn ValueSampler>,
        config: &SimulationConfig,
    ) -> Self {
        Self::new(
            registry,
            sink,
            sampler,
            config.tick_interval(),
            config.backoff_interval(),
        )
    }

    /// Number of ticks performed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn backoff_interval(&self) -> Duration {
        self.backoff_interval
    }

    /// Sample, encode and write every variable once.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport::new(self.ticks);
        let registry = Arc::clone(&self.registry);

        for definition in registry.definitions() {
            let value = self.sampler.sample(definition);
            match self.commit(definition, value) {
                Ok(()) => report.samples.push((definition.name.clone(), value)),
                Err(err) => {
                    error!("Update error: {}", err);
                    report.failures.push(err);
                }
            }
        }

        info!("{}", report.summary());
        report
    }

    fn commit(&self, definition: &VariableDefinition, value: SampledValue) -> Result<(), SimulationError> {
        let cells = encode_sample(definition, value)?;
        self.sink
            .write_cells(definition.block, definition.address, cells.as_slice())?;
        Ok(())
    }

    /// Interval to wait after a tick with the given report.
    pub fn pause_after(&self, report: &TickReport) -> Duration {
        if report.is_clean() {
            self.tick_interval
        } else {
            self.backoff_interval
        }
    }

    /// Run until `shutdown` fires and return the number of ticks performed.
    pub async fn run(mut self, sleeper: Arc<dyn Sleeper>, mut shutdown: ShutdownSignal) -> u64 {
        info!(
            "Simulation engine started: {} variables, tick interval {:?}, backoff {:?}",
            self.registry.len(),
            self.tick_interval,
            self.backoff_interval
        );

        loop {
            if shutdown.is_triggered() {
                break;
            }

            let report = self.tick();
            let pause = self.pause_after(&report);
            if !report.is_clean() {
                warn!(
                    "Tick {} had {} failure(s), backing off for {:?}",
                    report.tick,
                    report.failures.len(),
                    pause
                );
            }

            tokio::select! {
                _ = sleeper.sleep(pause) => {}
                _ = shutdown.wait() => break,
            }
        }

        info!("Simulation engine stopped after {} ticks", self.ticks);
        self.ticks
    }
}
