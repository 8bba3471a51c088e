mod analyzer;
mod cache;
mod config;
mod loader;
mod matcher;
mod model;
mod normalizer;
mod query;
mod server;
mod utils;

use cache::DatasetCache;
use config::{AppConfig, load_config};
use loader::{DatasetSource, FileSource};
use server::AppState;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = if Path::new("config.json").exists() {
        match load_config("config.json") {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Config load error: {}", e);
                return;
            }
        }
    } else {
        info!("No config.json found, using defaults");
        AppConfig::default()
    };

    let cache = Arc::new(DatasetCache::new());
    preload_dataset(&cache, &config.dataset_path).await;

    let app = server::router(AppState { cache });

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr, e);
            return;
        }
    };

    info!("Listening on {}", config.bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}

/// Fills the cache from the default dataset file when one is present.
/// A missing or unreadable file is not fatal: the service starts with an
/// empty cache and waits for an upload.
async fn preload_dataset(cache: &Arc<DatasetCache>, path: &str) {
    if !Path::new(path).exists() {
        info!("No default dataset at {}, starting with empty cache", path);
        return;
    }

    let source = FileSource::new(path);
    let bytes = match source.fetch().await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read default dataset: {}", e);
            return;
        }
    };

    match loader::load_from_bytes(&bytes) {
        Ok(table) => {
            info!("Loaded default dataset {}: {} rows", path, table.rows.len());
            cache.replace(table).await;
        }
        Err(e) => {
            error!("Failed to load default dataset: {}", e);
        }
    }
}
