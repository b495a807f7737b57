//! Finance API Server
//!
//! Run with: cargo run --bin finance-api
//!
//! # Configuration
//!
//! Reads `config.toml` from the standard locations (see `finance config`),
//! overridden by `FINANCE_*` environment variables:
//! - `FINANCE_BACKEND`: `local` (default) or `rest`
//! - `FINANCE_BACKEND_URL`, `FINANCE_ANON_KEY`: hosted backend project
//! - `FINANCE_USER_ID`, `FINANCE_EMAIL`, `FINANCE_ACCESS_TOKEN`: session
//! - `FINANCE_API_HOST`, `FINANCE_API_PORT`: bind address
//! - `RUST_LOG`: Log filter (default: from `logging.level`)

use anyhow::Context;
use finance_tracker::api::{serve, AppState};
use finance_tracker::backend::{Backend, MemoryBackend, RestBackend};
use finance_tracker::config::{BackendKind, Config, LoggingConfig};
use finance_tracker::notify::TracingNotifier;
use finance_tracker::session::Session;
use finance_tracker::views::Workspace;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting Finance API server v{}", env!("CARGO_PKG_VERSION"));

    let session = config.session().context("Invalid session configuration")?;
    match &session {
        Some(session) => tracing::info!(user_id = %session.user_id, "Session configured"),
        None => tracing::warn!("No session configured (set FINANCE_USER_ID); all collections will be empty"),
    }

    let backend = connect(&config, session.as_ref()).await?;

    let workspace = Workspace::mount(
        Arc::clone(&backend),
        session,
        Arc::new(TracingNotifier),
        config.display.currency.clone(),
    )
    .await;

    let state = AppState::new(workspace, backend, config.api.clone());

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("Finance API server stopped");
    Ok(())
}

/// Install the tracing subscriber described by the logging config
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("finance_tracker={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Open the configured backend, scoped to the session user
async fn connect(config: &Config, session: Option<&Session>) -> anyhow::Result<Arc<dyn Backend>> {
    match config.backend.kind {
        BackendKind::Local => {
            let path = config.backend.snapshot_path();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Cannot create data directory {:?}", parent))?;
            }

            let store = MemoryBackend::open(&path)
                .await
                .with_context(|| format!("Cannot open local snapshot {:?}", path))?;
            tracing::info!("Local backend at {:?}", path);

            Ok(match session {
                Some(session) => {
                    store
                        .ensure_profile(session.user_id, session.email.as_deref().unwrap_or(""))
                        .await?;
                    Arc::new(store.as_user(session.user_id))
                }
                None => Arc::new(store.signed_out()),
            })
        }
        BackendKind::Rest => {
            let rest = RestBackend::new(config.rest_config())?;
            tracing::info!("REST backend at {}", config.backend.url);

            match rest.health_check().await {
                Ok(()) => tracing::info!("Backend connection verified"),
                Err(e) => tracing::warn!("Backend not reachable: {} (requests will fail until it is)", e),
            }
            Ok(Arc::new(rest))
        }
    }
}
