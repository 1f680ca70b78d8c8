//! Broadcast API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use broadcast_common::config::AppConfig;
use broadcast_common::db::create_pool;

use broadcast_api::routes::create_router;
use broadcast_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("broadcast_api=debug,broadcast_notifier=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting broadcast API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config).await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Build application state
    let state = AppState::from_config(&config, pool.clone())?;
    tracing::info!(
        calling_code = %config.default_calling_code,
        max_concurrency = config.dispatch_max_concurrency,
        send_timeout_secs = config.dispatch_send_timeout_secs,
        "Broadcast dispatcher ready"
    );

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    pool.close().await;
    tracing::info!("Broadcast API server stopped.");
    Ok(())
}
