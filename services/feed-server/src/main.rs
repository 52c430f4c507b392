//! Event store feed server
//!
//! Serves the event store as an Atom feed: a mutable `recent` page and a chain
//! of immutable archive pages, optionally envelope-encrypted. Health checks are
//! served on a separate listener.

use std::sync::Arc;

use anyhow::Result;
use esfeed_server::{
    api, cipher::EnvelopeCipher, config, db::Database, db::redact_url_password, server,
    state::AppState,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to ESFEED_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting event store feed server");
    info!(
        listen_addr = %config.listen_addr,
        health_listen_addr = %config.health_listen_addr,
        link_host = %config.links.host,
        link_proto = %config.links.proto,
        database_url = %redact_url_password(&config.database.database_url),
        "Configuration loaded"
    );

    // Connect to database
    let db = match Database::connect(&config.database).await {
        Ok(db) => {
            info!("Database connection established");
            db
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            return Err(e.into());
        }
    };

    // Run migrations in dev mode
    if config.dev_mode {
        info!("Running database migrations (dev mode)");
        if let Err(e) = db.run_migrations().await {
            error!(error = %e, "Failed to run migrations");
            return Err(e.into());
        }
    }

    // Build the response cipher and make sure the key service answers
    let cipher = EnvelopeCipher::from_config(&config.encryption).await?;
    if cipher.is_enabled() {
        if let Err(e) = cipher.check_health().await {
            error!(error = %e, "Key service check failed");
            return Err(e.into());
        }
    } else {
        warn!("ESFEED_KEY_ALIAS is not set: feed content is served UNENCRYPTED");
    }

    // Create application state
    let state = AppState::new(Arc::new(db.feed_store()), cipher, config.links.clone());

    let app = api::create_router(state.clone());
    let health_app = api::create_health_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let health_listener = tokio::net::TcpListener::bind(&config.health_listen_addr).await?;
    info!(addr = %config.health_listen_addr, "Health check listening");

    // Serve until Ctrl+C, then drain both listeners
    server::serve(
        listener,
        app,
        health_listener,
        health_app,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        },
        std::time::Duration::from_secs(10),
    )
    .await;

    info!("Feed server shutdown complete");
    Ok(())
}
