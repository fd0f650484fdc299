// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register simulation
//!
//! This module drives the simulated chiller: it samples a value for every
//! registered variable, encodes it into Modbus cells and writes the cells into
//! the shared [`RegisterState`](crate::register_state::RegisterState).
//!
//! ## Key Components
//!
//! - [`SimulationEngine`]: the periodic sampling loop
//! - [`ValueSampler`] / [`RandomSampler`]: where values come from
//! - [`RegisterSink`]: where encoded cells go
//! - [`Sleeper`]: the pause between ticks, replaceable in tests
//! - [`ShutdownSignal`]: cooperative cancellation
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rust_chiller_sim::register_state::RegisterState;
//! use rust_chiller_sim::registry::Registry;
//! use rust_chiller_sim::simulation::{shutdown_channel, RandomSampler, SimulationEngine, TokioSleeper};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = Arc::new(Registry::load()?);
//! let state = Arc::new(RegisterState::from_layout(registry.layout(), 1));
//! let engine = SimulationEngine::new(
//!     registry,
//!     state,
//!     Box::new(RandomSampler::from_os_rng()),
//!     Duration::from_secs(2),
//!     Duration::from_secs(1),
//! );
//!
//! let (trigger, signal) = shutdown_channel();
//! let task = tokio::spawn(engine.run(Arc::new(TokioSleeper), signal));
//! tokio::signal::ctrl_c().await?;
//! trigger.trigger();
//! task.await?;
//! # Ok(())
//! # }
//! ```

pub mod encoder;
pub mod engine;
pub mod sampler;
pub mod shutdown;

pub use encoder::{encode_sample, Cells};
pub use engine::{RegisterSink, SimulationEngine, Sleeper, TickReport, TokioSleeper};
pub use sampler::{RandomSampler, SampledValue, ValueSampler};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
