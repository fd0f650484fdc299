// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus communication module
//!
//! This module provides the Modbus TCP server of the chiller simulator,
//! allowing external systems (SCADA, BMS, test benches) to read the simulated
//! values and write set points via the Modbus protocol.
//!
//! ## Key Components
//!
//! - `ChillerModbusServer`: The service answering Modbus requests from the
//!   shared register banks.
//! - `serve`: Accept loop running the service over TCP until shutdown.
//!
//! ## Usage
//!
//! The Modbus server is normally started as part of the application daemon:
//!
//! ```no_run
//! use rust_chiller_sim::config::Config;
//! use rust_chiller_sim::daemon::launch_daemon::Daemon;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut daemon = Daemon::new();
//! daemon.launch(&config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Register Map
//!
//! The register map is the built-in chiller map (or the configured
//! replacement). Multi-cell values are stored high word first:
//!
//! - Float32: IEEE-754 single precision over two registers
//! - UInt32: unsigned 32-bit integer over two registers
//! - Bool: one cell holding 0 or 1

pub mod modbus_server;
pub use modbus_server::ChillerModbusServer;

use std::{io, net::SocketAddr};

use anyhow::Result;
use log::{error, info};
use tokio::net::{TcpListener, TcpStream};
use tokio_modbus::server::tcp::{accept_tcp_connection, Server};

use crate::simulation::ShutdownSignal;

/// Serve `service` on an already bound listener until `shutdown` fires.
///
/// Each accepted connection gets its own clone of the service, all of them
/// sharing the same register banks.
pub async fn serve(
    listener: TcpListener,
    service: ChillerModbusServer,
    mut shutdown: ShutdownSignal,
) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("Modbus TCP server listening on {}", local_addr);

    let server = Server::new(listener);
    let new_service =
        |_socket_addr: SocketAddr| -> io::Result<Option<ChillerModbusServer>> {
            Ok(Some(service.clone()))
        };
    let on_connected = |stream: TcpStream, socket_addr: SocketAddr| async move {
        info!("Modbus client connected from {}", socket_addr);
        accept_tcp_connection(stream, socket_addr, new_service)
    };
    let on_process_error = |err: io::Error| {
        error!("Modbus connection error: {}", err);
    };

    tokio::select! {
        result = server.serve(&on_connected, on_process_error) => {
            result?;
        }
        _ = shutdown.wait() => {
            info!("Modbus TCP server on {} stopping", local_addr);
        }
    }

    Ok(())
}
