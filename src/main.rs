//! Leaderboard store binary: persists scores on this device and serves them to the game UI
//! over a loopback HTTP API.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leaderboard_store::{
    config::AppConfig,
    dao::kv_store::KvStore,
    routes,
    services::storage_supervisor,
    state::{
        AppState, LeaderboardStore, SharedState,
        retry::{RetryScheduler, TokioScheduler},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = open_backend(&config)?;
    let scheduler: Arc<dyn RetryScheduler> =
        Arc::new(TokioScheduler::current().context("binding retry scheduler to runtime")?);

    let store = LeaderboardStore::builder(backend.clone(), scheduler)
        .keys(config.keys.clone())
        .policy(config.retry)
        .build();
    let app_state = AppState::new(store, backend);

    tokio::spawn(storage_supervisor::run(app_state.clone()));
    let app = build_router(app_state);

    info!(addr = %config.bind_addr, "starting server");
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "file-store")]
fn open_backend(config: &AppConfig) -> anyhow::Result<Arc<dyn KvStore>> {
    use leaderboard_store::dao::kv_store::file::{FileConfig, FileKvStore};

    let mut file_config = FileConfig::new(&config.storage_dir);
    if let Some(quota) = config.quota_bytes {
        file_config = file_config.with_quota(quota);
    }
    let store = FileKvStore::open(file_config).context("opening storage directory")?;
    info!(dir = %store.dir().display(), "persisting leaderboard to disk");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "file-store"))]
fn open_backend(config: &AppConfig) -> anyhow::Result<Arc<dyn KvStore>> {
    use leaderboard_store::dao::kv_store::memory::MemoryKvStore;

    tracing::warn!("built without `file-store`; scores are kept in memory only");
    let store = match config.quota_bytes {
        Some(quota) => MemoryKvStore::new().with_quota(quota),
        None => MemoryKvStore::new(),
    };
    Ok(Arc::new(store))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
