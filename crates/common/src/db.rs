use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;

/// Open the connection pool backing the recipient store.
///
/// Each broadcast issues a single listing query, so a small pool is enough.
/// A listing that cannot get a connection within `db_acquire_timeout_secs`
/// fails as a repository error instead of stalling the request.
pub async fn create_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    let acquire_timeout = Duration::from_secs(config.db_acquire_timeout_secs);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to recipient store: {e}"))?;

    tracing::info!(
        max_connections = config.db_max_connections,
        acquire_timeout_secs = config.db_acquire_timeout_secs,
        "Connected to recipient store"
    );
    Ok(pool)
}
