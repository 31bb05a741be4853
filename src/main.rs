//! # Feed Gateway
//!
//! WebSocket fan-out server for social feed events.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Profile store connection
//! - WebSocket/HTTP listener

use anyhow::Result;
use tracing::info;

use feed_gateway::config::Settings;
use feed_gateway::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    feed_gateway::telemetry::init_tracing();

    info!("Starting Feed Gateway...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        profile_store = ?settings.profile_store.backend,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    info!("Server stopped");
    Ok(())
}
