// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-chiller-sim project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Cooperative shutdown signal shared by the daemon tasks

use tokio::sync::watch;

/// Sending half, owned by whoever decides to stop the tasks.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

/// Receiving half, cloned into every task.
///
/// Dropping the [`ShutdownTrigger`] counts as a shutdown request.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

/// Create a connected trigger / signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, ShutdownSignal { receiver })
}

impl ShutdownTrigger {
    /// Ask every task to stop. Idempotent.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

impl ShutdownSignal {
    /// Non-blocking check used at the top of task loops.
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown is requested or the trigger is gone.
    pub async fn wait(&mut self) {
        // An error means the trigger was dropped, which also ends the wait.
        let _ = self.receiver.wait_for(|stopped| *stopped).await;
    }
}
