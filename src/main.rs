use anyhow::{Context, Result};
use arm_livedata::{ArmClient, ArmLiveServer, Config};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the stdio transport.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("failed to load ARM Live Data configuration")?;
    tracing::info!(
        url = %config.url,
        username = %config.username,
        container = config.container,
        "starting arm-livedata MCP server"
    );

    let client = ArmClient::new(config)?;
    let service = ArmLiveServer::new(client).serve(stdio()).await?;

    let reason = service.waiting().await?;
    tracing::info!(?reason, "server stopped");
    Ok(())
}
