// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::Config;
use crate::modbus::{self, ChillerModbusServer};
use crate::register_state::RegisterState;
use crate::registry::{Block, DataType, Registry};
use crate::simulation::{
    shutdown_channel, RandomSampler, ShutdownSignal, ShutdownTrigger, SimulationEngine,
    TokioSleeper,
};

/// Interval between two heartbeat log lines.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Time given to each task to finish after shutdown was requested.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the background tasks of the simulator: the simulation engine, the
/// Modbus TCP server and a heartbeat.
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    shutdown: ShutdownTrigger,
    signal: ShutdownSignal,
    register_state: Option<Arc<RegisterState>>,
    registry: Option<Arc<Registry>>,
    modbus_addr: Option<SocketAddr>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        let (shutdown, signal) = shutdown_channel();
        Daemon {
            tasks: Vec::new(),
            shutdown,
            signal,
            register_state: None,
            registry: None,
            modbus_addr: None,
        }
    }

    /// Launch all configured tasks based on configuration
    ///
    /// The register map is validated first; an invalid map is fatal and no
    /// task is started. The Modbus listener is bound before any task is
    /// spawned so that address errors are reported here.
    pub async fn launch(&mut self, config: &Config) -> Result<()> {
        let registry = Arc::new(
            Registry::from_definitions(config.simulation.variables.clone())
                .context("Invalid register map")?,
        );
        let state = Arc::new(RegisterState::from_layout(
            registry.layout(),
            config.modbus.unit_id,
        ));

        for line in banner(&registry, config) {
            info!("{}", line);
        }

        if config.modbus.enabled {
            self.start_modbus_server(config, Arc::clone(&state)).await?;
        } else {
            info!("Modbus server is disabled in configuration");
        }

        self.registry = Some(Arc::clone(&registry));
        self.register_state = Some(Arc::clone(&state));

        if config.simulation.enabled {
            self.start_simulation(config, registry, state)?;
        } else {
            info!("Simulation is disabled in configuration, registers stay at zero");
        }

        // Start heartbeat task for monitoring
        self.start_heartbeat()?;

        Ok(())
    }

    /// Bind the Modbus listener and spawn the accept loop
    async fn start_modbus_server(&mut self, config: &Config, state: Arc<RegisterState>) -> Result<()> {
        let bind_addr = config.modbus.socket_address();
        info!("Starting modbus server on {}", bind_addr);

        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("Failed to bind Modbus server to {}", bind_addr))?;
        let local_addr = listener.local_addr()?;
        self.modbus_addr = Some(local_addr);

        let service =
            ChillerModbusServer::new(state).with_strict_unit_id(config.modbus.strict_unit_id);
        let signal = self.signal.clone();
        let task = tokio::spawn(async move {
            modbus::serve(listener, service, signal).await?;
            info!("Modbus server shut down successfully");
            Ok(())
        });

        self.tasks.push(task);
        info!("Modbus server started on {}", local_addr);
        Ok(())
    }

    /// Spawn the periodic simulation engine
    fn start_simulation(
        &mut self,
        config: &Config,
        registry: Arc<Registry>,
        state: Arc<RegisterState>,
    ) -> Result<()> {
        match config.simulation.seed {
            Some(seed) => info!("Starting simulation engine with seed {}", seed),
            None => info!("Starting simulation engine"),
        }

        let engine = SimulationEngine::from_config(
            registry,
            state,
            Box::new(RandomSampler::from_seed(config.simulation.seed)),
            &config.simulation,
        );
        let signal = self.signal.clone();
        let task = tokio::spawn(async move {
            let ticks = engine.run(Arc::new(TokioSleeper), signal).await;
            debug!("Simulation task finished after {} ticks", ticks);
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Start a heartbeat task that logs system status periodically
    fn start_heartbeat(&mut self) -> Result<()> {
        debug!("Starting heartbeat monitor");

        let mut signal = self.signal.clone();
        let task = tokio::spawn(async move {
            while !signal.is_triggered() {
                debug!("Daemon heartbeat: running");
                tokio::select! {
                    _ = time::sleep(HEARTBEAT_INTERVAL) => {}
                    _ = signal.wait() => {}
                }
            }
            Ok(())
        });

        self.tasks.push(task);
        Ok(())
    }

    /// Register banks shared by the engine and the Modbus server.
    ///
    /// `None` until [`Daemon::launch`] succeeded.
    pub fn register_state(&self) -> Option<Arc<RegisterState>> {
        self.register_state.clone()
    }

    /// Variable registry in use. `None` until launched.
    pub fn registry(&self) -> Option<Arc<Registry>> {
        self.registry.clone()
    }

    /// Address the Modbus server actually listens on.
    ///
    /// Useful when the configured port is 0.
    pub fn modbus_local_addr(&self) -> Option<SocketAddr> {
        self.modbus_addr
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.shutdown.trigger();
    }

    /// Wait for all tasks to complete
    ///
    /// A task that does not finish within a few seconds after shutdown is
    /// aborted.
    pub async fn join(self) -> Result<()> {
        for mut task in self.tasks {
            match time::timeout(SHUTDOWN_TIMEOUT, &mut task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => error!("Task failed: {:#}", e),
                Ok(Err(e)) => error!("Task panicked: {}", e),
                Err(_) => {
                    warn!("Task shutdown timed out, forcing termination");
                    task.abort();
                }
            }
        }
        Ok(())
    }
}

/// Startup banner: endpoint, bank sizes and the variable table.
pub fn banner(registry: &Registry, config: &Config) -> Vec<String> {
    let layout = registry.layout();
    let mut lines = vec![
        "Chiller Modbus TCP simulator".to_string(),
        format!(
            "Endpoint: {} (unit id {}{})",
            config.modbus.socket_address(),
            config.modbus.unit_id,
            if config.modbus.strict_unit_id {
                ", strict"
            } else {
                ", any unit id answered"
            }
        ),
        format!(
            "Bank sizes: {}",
            Block::ALL
                .iter()
                .map(|block| format!("{}={}", block.short_name(), layout.bank_size(*block)))
                .collect::<Vec<_>>()
                .join(" ")
        ),
        format!("Variables ({}):", registry.len()),
    ];

    for definition in registry.definitions() {
        let domain = match definition.data_type {
            DataType::Bool => "0..1".to_string(),
            DataType::Float32 { min, max } => format!("{}..{}", min, max),
            DataType::UInt32 { min, max } => format!("{}..{}", min, max),
        };
        lines.push(format!(
            "  {:<24} {} {:>5}  {:<7} {}",
            definition.name,
            definition.block.short_name(),
            definition.address,
            definition.data_type.type_name(),
            domain
        ));
    }
    lines
}
