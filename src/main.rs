//! # Flower Shop
//!
//! REST backend for the flower shop storefront and admin panel.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - Optional Redis connection
//! - HTTP server

use anyhow::Result;
use tracing::info;

use flower_shop::config::Settings;
use flower_shop::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    flower_shop::telemetry::init_tracing();

    info!("Starting Flower Shop API...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        redis = settings.redis.url.is_some(),
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
