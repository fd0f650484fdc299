// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Built-in chiller register map
//!
//! Addresses are zero-based offsets; the vendor documentation uses one-based
//! register numbers, so `SETPOINT_csp1` at offset 899 is documented as
//! register 900.
//!
//! | Block | Range | Content |
//! |-------|-------|---------|
//! | Discrete inputs | 0 | Freeze alarm |
//! | Holding registers | 899..915 | Cooling / heating set points and limits |
//! | Holding registers | 3009..3025 | Protocol control points |
//! | Holding registers | 4099..4121 | General configuration |
//! | Input registers | 3..75 | Temperatures, unit state, water pressures |
//! | Input registers | 1099..1121 | Alarm counters |
//! | Input registers | 9107..9111 | Heat reclaim water temperatures |

use super::{Block, VariableDefinition};

use Block::{DiscreteInput, HoldingRegister, InputRegister};

/// Variables simulated by default, in update order.
pub fn variables() -> Vec<VariableDefinition> {
    vec![
        VariableDefinition::bool("ALM_COOLER_FREEZE_F", DiscreteInput, 0),
        // Set points
        VariableDefinition::float32("SETPOINT_csp1", HoldingRegister, 899, -28.88, 26.00),
        VariableDefinition::float32("SETPOINT_csp2", HoldingRegister, 901, -28.88, 26.00),
        VariableDefinition::float32("SETPOINT_ice_sp", HoldingRegister, 903, -28.88, 26.00),
        VariableDefinition::float32("SETPOINT_hsp1", HoldingRegister, 905, -28.88, 26.00),
        VariableDefinition::float32("SETPOINT_hsp2", HoldingRegister, 907, -28.88, 26.00),
        VariableDefinition::uint32("SETPOINT_lim_sp1", HoldingRegister, 909, 0, 100),
        VariableDefinition::uint32("SETPOINT_lim_sp2", HoldingRegister, 911, 0, 100),
        VariableDefinition::uint32("SETPOINT_lim_sp3", HoldingRegister, 913, 0, 100),
        // Protocol
        VariableDefinition::float32("PROTOCOL_CTRL_PNT", HoldingRegister, 3009, -4.0, 153.0),
        VariableDefinition::uint32("PROTOCOL_DEM_LIM", HoldingRegister, 3013, 0, 100),
        VariableDefinition::uint32("PROTOCOL_CHIL_S_S", HoldingRegister, 3021, 0, 1),
        VariableDefinition::uint32("PROTOCOL_EMSTOP", HoldingRegister, 3023, 0, 1),
        // General configuration
        VariableDefinition::uint32("GENCONF_ice_cnfg", HoldingRegister, 4099, 0, 1),
        VariableDefinition::float32("GENCONF_pow_max", HoldingRegister, 4117, 0.0, 2000.0),
        VariableDefinition::uint32("GENCONF_pow_sel", HoldingRegister, 4119, 0, 1),
        // Measurements
        VariableDefinition::float32("TEMP_OAT", InputRegister, 3, -20.0, 50.0),
        VariableDefinition::float32("CAPACTRL_ctrl_wt", InputRegister, 5, 40.0, 60.0),
        VariableDefinition::float32("TEMP_CHWSTEMP", InputRegister, 7, 40.0, 60.0),
        VariableDefinition::float32("GENUNIT_CTRL_PNT", InputRegister, 9, -4.0, 153.0),
        VariableDefinition::float32("GENUNIT_SP", InputRegister, 11, -20.0, 78.8),
        VariableDefinition::uint32("GENUNIT_CHIL_S_S", InputRegister, 21, 0, 1),
        VariableDefinition::uint32("GENUNIT_EMSTOP", InputRegister, 23, 0, 1),
        VariableDefinition::uint32("UNIT_STATUS", InputRegister, 41, 0, 10),
        VariableDefinition::float32("PRESSURE_EWATPRES", InputRegister, 71, 0.0, 100.0),
        VariableDefinition::float32("PRESSURE_LWATPRES", InputRegister, 73, 0.0, 100.0),
        // Alarms
        VariableDefinition::uint32("ALARMRST_alarm_1c", InputRegister, 1099, 0, 10),
        VariableDefinition::uint32("UNIT_ALM", InputRegister, 1119, 0, 10),
        // Heat reclaim
        VariableDefinition::float32("RECLAIM_HR_EWT", InputRegister, 9107, 40.0, 60.0),
        VariableDefinition::float32("RECLAIM_HR_LWT", InputRegister, 9109, 40.0, 60.0),
    ]
}
