use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Open the PostgreSQL pool, sized from configuration.
///
/// The summary endpoint fans out to three queries at once, so a few
/// connections are kept warm; everything else holds one per request.
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(3)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        "Connected to PostgreSQL (max {} connections)",
        config.database_max_connections
    );

    Ok(pool)
}
