// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tokio::time::{self, Duration};
use tokio_modbus::prelude::*;

use rust_chiller_sim::codec::{decode_float32, decode_uint32};
use rust_chiller_sim::registry::{Block, DataType, Registry, VariableDefinition};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Modbus client reading every variable of the chiller register map
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Modbus server address
    #[clap(long, default_value = "127.0.0.1")]
    address: String,

    /// Modbus server port
    #[clap(long, default_value = "502")]
    port: u16,

    /// Unit (slave) identifier to address
    #[clap(long, default_value = "255")]
    unit_id: u8,

    /// Only read this variable
    #[clap(long)]
    name: Option<String>,

    /// Print the raw register values next to the decoded value
    #[clap(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    // Parse command line arguments
    let args = Args::parse();

    let registry = Registry::load()?;
    let variables: Vec<&VariableDefinition> = match &args.name {
        Some(name) => vec![registry
            .get(name)
            .with_context(|| format!("Unknown variable '{}'", name))?],
        None => registry.definitions().iter().collect(),
    };

    // Format server address
    let socket_addr: SocketAddr = format!("{}:{}", args.address, args.port)
        .parse()
        .with_context(|| format!("Invalid socket address {}:{}", args.address, args.port))?;
    println!("Connecting to Modbus server at {}", socket_addr);

    // Create TCP transport
    let mut ctx = time::timeout(
        CONNECT_TIMEOUT,
        tcp::connect_slave(socket_addr, Slave(args.unit_id)),
    )
    .await
    .context("Timed out connecting to the Modbus server")??;

    println!(
        "Reading {} variables at {}",
        variables.len(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for definition in variables {
        let cells = read_cells(&mut ctx, definition).await?;
        let value = decode(definition, &cells);
        if args.raw {
            println!(
                "{:<24} {} {:>5} = {:<12} {:04X?}",
                definition.name,
                definition.block.short_name(),
                definition.address,
                value,
                cells
            );
        } else {
            println!(
                "{:<24} {} {:>5} = {}",
                definition.name,
                definition.block.short_name(),
                definition.address,
                value
            );
        }
    }

    ctx.disconnect().await?;
    Ok(())
}

/// Read the cells of one variable with the function code of its block.
async fn read_cells(
    ctx: &mut tokio_modbus::client::Context,
    definition: &VariableDefinition,
) -> Result<Vec<u16>> {
    let address = definition.address;
    let count = definition.width();
    let cells = match definition.block {
        Block::DiscreteInput => ctx
            .read_discrete_inputs(address, count)
            .await??
            .into_iter()
            .map(u16::from)
            .collect(),
        Block::Coil => ctx
            .read_coils(address, count)
            .await??
            .into_iter()
            .map(u16::from)
            .collect(),
        Block::HoldingRegister => ctx.read_holding_registers(address, count).await??,
        Block::InputRegister => ctx.read_input_registers(address, count).await??,
    };
    Ok(cells)
}

fn decode(definition: &VariableDefinition, cells: &[u16]) -> String {
    match (definition.data_type, cells) {
        (DataType::Bool, [cell, ..]) => u16::from(*cell != 0).to_string(),
        (DataType::Float32 { .. }, [high, low, ..]) => {
            format!("{:.1}", decode_float32(*high, *low))
        }
        (DataType::UInt32 { .. }, [high, low, ..]) => decode_uint32(*high, *low).to_string(),
        _ => "<short read>".to_string(),
    }
}
