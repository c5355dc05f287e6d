//! Cooperative shutdown signal.
//!
//! A [`ShutdownTrigger`] is held by whoever decides the process should stop (signal handlers,
//! tests); any number of [`ShutdownSignal`]s observe it. Observers only check the signal at
//! points where stopping is safe.

use std::{future, io};

use tokio::sync::watch;
use tracing::{error, info};

/// Creates a connected trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Requests shutdown. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Triggers on the first SIGINT or SIGTERM.
    pub async fn trigger_on_os_signal(self) {
        wait_for_os_signal().await;
        info!("received shutdown signal");
        self.trigger();
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    ///
    /// Also resolves once every trigger has been dropped.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = async { delivered(tokio::signal::ctrl_c().await, "SIGINT").await };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(err) => delivered(Err(err), "SIGTERM").await,
        }
    };
    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    delivered(tokio::signal::ctrl_c().await, "ctrl-c").await;
}

/// Resolves for a delivered signal. A listener that could not be installed never resolves.
async fn delivered(result: io::Result<()>, signal: &str) {
    if let Err(err) = result {
        error!(%err, signal, "failed to install signal listener");
        future::pending::<()>().await;
    }
}
