pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod providers;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::config::{AppConfig, RevolutProviderConfig, StoreBackend};
use crate::core::history::HistoryStore;
use crate::providers::revolut::RevolutProvider;
use crate::store::memory::MemoryStore;
use crate::store::supabase::SupabaseStore;

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("ratebook starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    serve(config).await
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Wires the configured quote provider and store into shared handler state.
pub fn build_state(config: &AppConfig) -> Result<Arc<AppState>> {
    let revolut = config
        .providers
        .revolut
        .clone()
        .unwrap_or_else(RevolutProviderConfig::default);
    let provider = RevolutProvider::new(
        &revolut.base_url,
        Duration::from_secs(revolut.timeout_secs),
    )?;

    let store: Arc<dyn HistoryStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory history store; saved rates will not survive a restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Supabase => {
            let supabase = config
                .store
                .supabase
                .as_ref()
                .context("store.backend is 'supabase' but store.supabase is not configured")?;
            Arc::new(SupabaseStore::new(
                &supabase.url,
                &supabase.service_role_key,
                &supabase.table,
            ))
        }
    };

    Ok(Arc::new(AppState {
        provider: Arc::new(provider),
        store,
    }))
}
