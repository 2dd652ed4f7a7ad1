// src/main.rs

use std::sync::Arc;

use masterdata_api::{
    app, config::Config, config::StoreBackend, db, store::EmployeeStore,
    store::MemoryEmployeeStore, store::PgEmployeeStore, AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn EmployeeStore> = match config.store_backend {
        StoreBackend::Postgres => Arc::new(PgEmployeeStore::new(db::connect(&config).await?)),
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            Arc::new(MemoryEmployeeStore::new())
        }
    };

    if !config.clearance_template.exists() {
        tracing::warn!(
            path = %config.clearance_template.display(),
            "clearance template not found; clearance forms will fail until it is in place"
        );
    }

    let port = config.port;
    let state = AppState::new(store.clone(), config);
    let api = app(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API listening");

    axum::serve(listener, api.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
