//! Graceful shutdown coordination for the pong server
//!
//! Runs the HTTP accept loop on the calling task and a listener task that races
//! SIGTERM/SIGINT against an internal quit notification:
//! - On a signal, the listener asks the server to drain and stop
//! - When the accept loop returns on its own (e.g. bind failure), the quit
//!   notification unblocks the listener without touching the server
//! - The caller only gets the serve result back after the listener has finished

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Errors returned by a server's accept loop
///
/// An intentional, coordinated close is not an error: `serve` returns `Ok(())`.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while draining the server
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("drain did not complete within {0:?}")]
    Timeout(Duration),

    #[error("server stopped without reporting drain completion")]
    Interrupted,
}

/// A server whose lifecycle is owned by [`ShutdownCoordinator`]
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Run the accept loop until it stops
    async fn serve(&self) -> Result<(), ServeError>;

    /// Request a graceful stop and wait until in-flight requests have drained
    ///
    /// Calling this more than once must be harmless.
    async fn shutdown(&self) -> Result<(), ShutdownError>;
}

/// What ended the listener task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// An OS termination signal, by name
    Signal(&'static str),
    /// The accept loop returned and the quit notification was closed
    Quit,
}

/// Single-use quit notification that can be closed any number of times
///
/// Only the first `close` has an effect; waiters observe it even if they
/// subscribe afterwards.
pub struct QuitNotification {
    closed: AtomicBool,
    sender: watch::Sender<bool>,
}

impl Default for QuitNotification {
    fn default() -> Self {
        Self::new()
    }
}

impl QuitNotification {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            closed: AtomicBool::new(false),
            sender,
        }
    }

    /// Close the notification
    ///
    /// Returns `true` if this call performed the close.
    pub fn close(&self) -> bool {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.sender.send_replace(true);
        true
    }

    /// Check if the notification was closed (non-blocking)
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get a waiter for the close
    pub fn subscribe(&self) -> QuitWaiter {
        QuitWaiter {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Receiving side of [`QuitNotification`]
#[derive(Clone)]
pub struct QuitWaiter {
    receiver: watch::Receiver<bool>,
}

impl QuitWaiter {
    /// Wait until the notification is closed
    pub async fn wait(&mut self) {
        // Sender dropped means nobody can close it anymore, treat as closed
        let _ = self.receiver.wait_for(|closed| *closed).await;
    }
}

/// Registered SIGTERM/SIGINT handlers
///
/// Registration is process-global; do it once, before the server starts.
#[cfg(unix)]
pub struct TerminationSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    /// Install the handlers. Must be called from within a Tokio runtime.
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm = signal(SignalKind::terminate()).inspect_err(|e| {
            error!(error = %e, "Failed to register SIGTERM handler");
        })?;
        let sigint = signal(SignalKind::interrupt()).inspect_err(|e| {
            error!(error = %e, "Failed to register SIGINT handler");
        })?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for the first SIGTERM or SIGINT. Returns the signal name.
    pub async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => {
                info!("Received SIGTERM");
                "SIGTERM"
            }
            _ = self.sigint.recv() => {
                info!("Received SIGINT");
                "SIGINT"
            }
        }
    }
}

/// Ctrl+C handler (Windows)
#[cfg(not(unix))]
pub struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self)
    }

    pub async fn recv(self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C");
                "CTRL_C"
            }
            Err(e) => {
                error!(error = %e, "Failed to wait for Ctrl+C");
                std::future::pending().await
            }
        }
    }
}

/// Outcome of [`ShutdownCoordinator::run`]
#[derive(Debug)]
pub struct RunOutcome {
    /// Result of the accept loop
    pub serve: Result<(), ServeError>,
    /// Which event the listener task observed
    pub trigger: Trigger,
    /// Result of the graceful drain; `Ok` when no drain was requested
    pub drain: Result<(), ShutdownError>,
}

/// Owns the server lifecycle and shuts it down at most once
pub struct ShutdownCoordinator<S: Server> {
    server: Arc<S>,
    drain_timeout: Option<Duration>,
}

impl<S: Server> ShutdownCoordinator<S> {
    /// Coordinator with an unbounded drain
    pub fn new(server: Arc<S>) -> Self {
        Self {
            server,
            drain_timeout: None,
        }
    }

    /// Bound the graceful drain. `None` waits for in-flight requests forever.
    ///
    /// When the bound passes, `run` stops waiting on the accept loop and
    /// abandons whatever connections are still open.
    pub fn with_drain_timeout(mut self, drain_timeout: Option<Duration>) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Serve until `signal` resolves or the accept loop stops on its own
    ///
    /// `signal` is usually [`TerminationSignals::recv`]. Returns only after the
    /// listener task has finished.
    pub async fn run<F>(self, signal: F) -> RunOutcome
    where
        F: Future<Output = &'static str> + Send + 'static,
    {
        let quit = QuitNotification::new();
        let mut quit_waiter = quit.subscribe();
        // Held here as well so the waiter below only wakes on an explicit close
        let abandon = Arc::new(QuitNotification::new());
        let mut abandon_waiter = abandon.subscribe();
        let listener_abandon = Arc::clone(&abandon);
        let server = Arc::clone(&self.server);
        let drain_timeout = self.drain_timeout;

        let listener = tokio::spawn(async move {
            tokio::select! {
                _ = quit_waiter.wait() => (Trigger::Quit, Ok(())),
                name = signal => {
                    info!(signal = name, "Shutting down server");
                    let drained = drain(server.as_ref(), drain_timeout).await;
                    match &drained {
                        Ok(()) => info!("Server drained"),
                        Err(e) => {
                            warn!(error = %e, "Error shutting server down");
                            if matches!(e, ShutdownError::Timeout(_)) {
                                listener_abandon.close();
                            }
                        }
                    }
                    (Trigger::Signal(name), drained)
                }
            }
        });

        let serve = tokio::select! {
            biased;
            result = self.server.serve() => result,
            _ = abandon_waiter.wait() => {
                warn!("Drain deadline passed, abandoning open connections");
                Ok(())
            }
        };
        quit.close();

        // Completion barrier: the listener always runs to the end before we return
        let (trigger, drain) = match listener.await {
            Ok(finished) => finished,
            Err(e) => {
                error!(error = %e, "Shutdown listener task failed");
                (Trigger::Quit, Ok(()))
            }
        };

        RunOutcome {
            serve,
            trigger,
            drain,
        }
    }
}

async fn drain<S: Server>(server: &S, deadline: Option<Duration>) -> Result<(), ShutdownError> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, server.shutdown())
            .await
            .map_err(|_| ShutdownError::Timeout(limit))?,
        None => server.shutdown().await,
    }
}
