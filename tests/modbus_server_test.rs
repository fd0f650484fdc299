// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Tests for the ChillerModbusServer implementation
//!
//! These tests start a server over a register state filled by one simulation
//! tick and talk to it with a real Modbus TCP client: reading and decoding
//! variables, writing holding registers and coils, and checking exception
//! responses.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use tokio::net::TcpListener;
use tokio::time;
use tokio_modbus::prelude::*;

use rust_chiller_sim::codec::{decode_float32, decode_uint32};
use rust_chiller_sim::modbus::{self, ChillerModbusServer};
use rust_chiller_sim::register_state::RegisterState;
use rust_chiller_sim::registry::{Block, DataType, Registry};
use rust_chiller_sim::simulation::{
    shutdown_channel, RandomSampler, SampledValue, ShutdownTrigger, SimulationEngine, TickReport,
};

struct TestServer {
    socket_addr: SocketAddr,
    state: Arc<RegisterState>,
    report: TickReport,
    shutdown: ShutdownTrigger,
}

/// Start a Modbus server in the background over freshly simulated registers
async fn start_test_server(strict_unit_id: bool) -> Result<TestServer, Box<dyn std::error::Error>> {
    let registry = Arc::new(Registry::load()?);
    let state = Arc::new(RegisterState::from_layout(registry.layout(), 255));

    let mut engine = SimulationEngine::new(
        Arc::clone(&registry),
        state.clone(),
        Box::new(RandomSampler::seeded(7)),
        Duration::from_secs(2),
        Duration::from_secs(1),
    );
    let report = engine.tick();

    // Use port 0 to let the OS assign an available port
    let listener = TcpListener::bind(SocketAddr::from_str("127.0.0.1:0")?).await?;
    let socket_addr = listener.local_addr()?;
    println!("Test server started on: {}", socket_addr);

    let service = ChillerModbusServer::new(state.clone()).with_strict_unit_id(strict_unit_id);
    let (shutdown, signal) = shutdown_channel();
    tokio::spawn(async move {
        if let Err(e) = modbus::serve(listener, service, signal).await {
            eprintln!("Server error: {}", e);
        }
    });

    Ok(TestServer {
        socket_addr,
        state,
        report,
        shutdown,
    })
}

#[tokio::test]
async fn test_read_and_decode_every_variable() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(false).await?;
    let registry = Registry::load()?;

    // Connect a client to the server
    let mut ctx = tcp::connect(server.socket_addr).await?;

    for definition in registry.definitions() {
        let expected = server.report.value_of(&definition.name);
        match (definition.block, definition.data_type) {
            (Block::DiscreteInput, DataType::Bool) => {
                let bits = ctx.read_discrete_inputs(definition.address, 1).await??;
                assert_eq!(expected, Some(SampledValue::Bool(bits[0])));
            }
            (Block::HoldingRegister, DataType::Float32 { min, max }) => {
                let data = ctx.read_holding_registers(definition.address, 2).await??;
                let value = decode_float32(data[0], data[1]);
                assert!(value >= min && value <= max, "{} = {}", definition.name, value);
                if let Some(SampledValue::Float32(sampled)) = expected {
                    assert_relative_eq!(value, sampled);
                }
            }
            (Block::InputRegister, DataType::Float32 { min, max }) => {
                let data = ctx.read_input_registers(definition.address, 2).await??;
                let value = decode_float32(data[0], data[1]);
                assert!(value >= min && value <= max, "{} = {}", definition.name, value);
                if let Some(SampledValue::Float32(sampled)) = expected {
                    assert_relative_eq!(value, sampled);
                }
            }
            (Block::HoldingRegister, DataType::UInt32 { min, max }) => {
                let data = ctx.read_holding_registers(definition.address, 2).await??;
                let value = decode_uint32(data[0], data[1]);
                assert!(value >= min && value <= max, "{} = {}", definition.name, value);
            }
            (Block::InputRegister, DataType::UInt32 { min, max }) => {
                let data = ctx.read_input_registers(definition.address, 2).await??;
                let value = decode_uint32(data[0], data[1]);
                assert!(value >= min && value <= max, "{} = {}", definition.name, value);
            }
            other => panic!("unexpected variable layout {:?}", other),
        }
    }

    // Clean up
    ctx.disconnect().await?;
    server.shutdown.trigger();

    Ok(())
}

#[tokio::test]
async fn test_write_holding_registers() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(false).await?;
    let mut ctx = tcp::connect(server.socket_addr).await?;

    // Write 25.5 as a float into SETPOINT_csp1
    ctx.write_multiple_registers(899, &[0x41CC, 0x0000]).await??;

    let data = ctx.read_holding_registers(899, 2).await??;
    assert_eq!(data, vec![0x41CC, 0x0000]);
    assert_relative_eq!(decode_float32(data[0], data[1]), 25.5);

    // The server and the shared state agree
    assert_eq!(
        server.state.read(Block::HoldingRegister, 899, 2)?,
        vec![0x41CC, 0x0000]
    );

    ctx.write_single_register(4120, 7).await??;
    let data = ctx.read_holding_registers(4120, 1).await??;
    assert_eq!(data, vec![7]);

    ctx.disconnect().await?;
    server.shutdown.trigger();
    Ok(())
}

#[tokio::test]
async fn test_coil_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(false).await?;
    let mut ctx = tcp::connect(server.socket_addr).await?;

    ctx.write_single_coil(0, true).await??;
    assert_eq!(ctx.read_coils(0, 1).await??, vec![true]);

    ctx.write_single_coil(0, false).await??;
    assert_eq!(ctx.read_coils(0, 1).await??, vec![false]);

    ctx.disconnect().await?;
    server.shutdown.trigger();
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_read_is_exception() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(false).await?;
    let mut ctx = tcp::connect(server.socket_addr).await?;

    // The input register bank ends at 9111
    let response = ctx.read_input_registers(9110, 2).await?;
    assert_eq!(response, Err(ExceptionCode::IllegalDataAddress));

    // The last valid pair is still readable
    let response = ctx.read_input_registers(9109, 2).await?;
    assert!(response.is_ok());

    // Discrete inputs hold a single bit
    let response = ctx.read_discrete_inputs(1, 1).await?;
    assert_eq!(response, Err(ExceptionCode::IllegalDataAddress));

    ctx.disconnect().await?;
    server.shutdown.trigger();
    Ok(())
}

#[tokio::test]
async fn test_multiple_clients() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(false).await?;

    let mut handles = Vec::new();
    for slave in [1u8, 17, 255] {
        let socket_addr = server.socket_addr;
        handles.push(tokio::spawn(async move {
            let mut ctx = tcp::connect_slave(socket_addr, Slave(slave)).await?;
            let data = ctx.read_input_registers(41, 2).await??;
            ctx.disconnect().await?;
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(decode_uint32(data[0], data[1]))
        }));
    }

    for handle in handles {
        let status = handle.await?.map_err(|e| e.to_string())?;
        assert!(status <= 10);
    }

    server.shutdown.trigger();
    Ok(())
}

#[tokio::test]
async fn test_strict_unit_id_drops_other_units() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(true).await?;

    let mut ctx = tcp::connect_slave(server.socket_addr, Slave(255)).await?;
    assert!(ctx.read_holding_registers(899, 2).await?.is_ok());
    ctx.disconnect().await?;

    let mut ctx = tcp::connect_slave(server.socket_addr, Slave(3)).await?;
    let unanswered = time::timeout(
        Duration::from_millis(300),
        ctx.read_holding_registers(899, 2),
    )
    .await;
    assert!(unanswered.is_err());

    server.shutdown.trigger();
    Ok(())
}
