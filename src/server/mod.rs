//! HTTP server for the ping endpoint
//!
//! Provides the liveness route:
//! - `POST /ping` - answers `pong`
//!
//! Also provides graceful shutdown coordination for SIGTERM/SIGINT.

mod health;
pub mod shutdown;

pub use health::{build_router, HttpServer};
pub use shutdown::{
    QuitNotification, QuitWaiter, RunOutcome, ServeError, Server, ShutdownCoordinator,
    ShutdownError, TerminationSignals, Trigger,
};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
