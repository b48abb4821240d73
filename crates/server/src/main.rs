//! Harvest Server - HTTP intake for harvest stem-count submissions
//!
//! This binary serves the submission form endpoints over the configured
//! record stores.

use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    server::start_server(config).await?;

    Ok(())
}
