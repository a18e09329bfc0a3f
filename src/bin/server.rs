//! Menuhub Server
//!
//! Serves the public catalog to customers and the admin catalog API, which
//! republishes every change into the public mirror.
//!
//! # Configuration
//!
//! Reads the same config file as the CLI (`~/.config/menuhub/config.yaml`, or
//! `MENUHUB_CONFIG`), with the usual `MENUHUB_*` overrides. The listening port
//! comes from `server.port` or `MENUHUB_PORT` (default: 8080).
//!
//! Admin requests carry the caller's ID token as `Authorization: Bearer`; it
//! is forwarded to the document store unchanged.

use menuhub::config::Config;
use menuhub::server::{router, AppState};
use menuhub_core::{Cloudinary, RestStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menuhub=info,menuhub_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("MENUHUB_CONFIG").ok().map(PathBuf::from);
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = config.require_project() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    match &config.config_file {
        Some(path) => tracing::info!("Config file: {}", path.display()),
        None => tracing::info!("No config file, using defaults and environment"),
    }
    tracing::info!(
        "Store project: {} (retention: {})",
        config.project_id.value,
        config.retention.value.as_str()
    );

    let store = Arc::new(RestStore::new(config.store_config()).with_retry(config.retry));
    let media = Arc::new(Cloudinary::new(config.media.clone()));
    let state = AppState::new(store, media, config.retention.value);

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
