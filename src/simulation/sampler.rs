// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Value sampling
//!
//! Every variable is drawn independently from a uniform distribution over its
//! declared domain: continuous for `float32`, discrete for `uint32` and a coin
//! flip for `bool`. No correlation between variables or between ticks is
//! modelled.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::registry::{DataType, VariableDefinition};

/// A value drawn for one variable during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampledValue {
    Bool(bool),
    Float32(f32),
    UInt32(u32),
}

impl SampledValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SampledValue::Bool(_) => "bool",
            SampledValue::Float32(_) => "float32",
            SampledValue::UInt32(_) => "uint32",
        }
    }
}

impl fmt::Display for SampledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampledValue::Bool(value) => write!(f, "{}", u8::from(*value)),
            SampledValue::Float32(value) => write!(f, "{:.1}", value),
            SampledValue::UInt32(value) => write!(f, "{}", value),
        }
    }
}

/// Source of values for the simulation engine.
pub trait ValueSampler: Send {
    /// Draw the next value for `definition`.
    fn sample(&mut self, definition: &VariableDefinition) -> SampledValue;
}

/// Uniform sampler backed by a `rand` generator.
///
/// ```
/// use rust_chiller_sim::registry::VariableDefinition;
/// use rust_chiller_sim::registry::Block;
/// use rust_chiller_sim::simulation::{RandomSampler, SampledValue, ValueSampler};
///
/// let mut sampler = RandomSampler::seeded(42);
/// let status = VariableDefinition::uint32("UNIT_STATUS", Block::InputRegister, 41, 0, 10);
/// match sampler.sample(&status) {
///     SampledValue::UInt32(value) => assert!(value <= 10),
///     other => panic!("unexpected sample {other:?}"),
/// }
/// ```
pub struct RandomSampler<R = StdRng> {
    rng: R,
}

impl RandomSampler<StdRng> {
    /// Sampler seeded from the operating system.
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Reproducible sampler.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Seeded when `seed` is set, OS-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_os_rng(),
        }
    }
}

impl<R: Rng> RandomSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> ValueSampler for RandomSampler<R> {
    fn sample(&mut self, definition: &VariableDefinition) -> SampledValue {
        match definition.data_type {
            DataType::Bool => SampledValue::Bool(self.rng.random_bool(0.5)),
            DataType::Float32 { min, max } => SampledValue::Float32(self.rng.random_range(min..=max)),
            DataType::UInt32 { min, max } => SampledValue::UInt32(self.rng.random_range(min..=max)),
        }
    }
}
