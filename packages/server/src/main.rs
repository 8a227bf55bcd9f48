use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::audit::AuditLog;
use server::config::AppConfig;
use server::rate_limit::UserRateLimiter;
use server::state::{AppState, build_object_store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to initialize database")?;

    let object_store = build_object_store(&config.storage)
        .await
        .context("Failed to initialize object store")?;
    info!(backend = ?config.storage.backend, "Object store ready");

    let (audit, _audit_worker) = AuditLog::spawn(db.clone(), config.audit.queue_capacity);
    let rate_limiter = Arc::new(UserRateLimiter::new(&config.rate_limit));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        object_store,
        audit,
        rate_limiter,
    };
    let app = server::build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
