use pong::probe::{ping_url, probe};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(target) = std::env::args().nth(1) else {
        error!("Target address is not provided. Usage: ping <addr>");
        anyhow::bail!("missing target address");
    };

    let client = reqwest::Client::new();
    match probe(&client, &target).await {
        Ok(body) => {
            info!(url = %ping_url(&target), "Message from server: {}", body);
            Ok(())
        }
        Err(e) => {
            error!("Ping failed: {}", e);
            Err(e.into())
        }
    }
}
