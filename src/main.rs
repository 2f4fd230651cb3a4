use pong::config::AppConfig;
use pong::nomad::{create_ping_job, NomadClient, DEFAULT_NOMAD_ADDRESS, NOMAD_STARTUP_DELAY};
use pong::server::{HttpServer, ServeError, ShutdownCoordinator, TerminationSignals};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Error processing env config");
            return Err(e.into());
        }
    };

    let nomad = NomadClient::new(DEFAULT_NOMAD_ADDRESS);
    if let Err(e) = create_ping_job(&nomad, &config.host_addr, NOMAD_STARTUP_DELAY).await {
        error!(error = %e, nomad = %nomad.address(), "Error creating ping job in Nomad");
        return Err(e.into());
    }

    // Register before serving so an early signal is never missed
    let signals = TerminationSignals::register()?;

    let server = Arc::new(HttpServer::new(config.bind_addr()));
    let outcome = ShutdownCoordinator::new(server)
        .with_drain_timeout(config.drain_timeout)
        .run(signals.recv())
        .await;

    match outcome.serve {
        Ok(()) => {
            info!(trigger = ?outcome.trigger, "Pong server shut down gracefully");
            Ok(())
        }
        Err(e) => {
            if let ServeError::Bind { addr, .. } = &e {
                error!(addr = %addr, error = %e, "Server failed to start");
            } else {
                error!(error = %e, "Server stopped unexpectedly");
            }
            Err(e.into())
        }
    }
}
