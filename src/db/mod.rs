pub mod pool;

pub use pool::create_pool;

use sqlx::PgPool;

use crate::error::Result;
use crate::security;

/// Insert the development seed user if it does not exist yet.
///
/// Enabled with `SEED_USER=1`; never runs in the default configuration.
pub async fn seed_default_user(pool: &PgPool) -> Result<()> {
    let password_hash = security::hash_password("secret")?;

    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, roles, scopes)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (username) DO NOTHING",
    )
    .bind("alice")
    .bind(&password_hash)
    .bind(vec!["MEDICO".to_string()])
    .bind(vec![
        "patients:read".to_string(),
        "records:read".to_string(),
        "records:write".to_string(),
        "scheduling:read".to_string(),
    ])
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!("Seeded default user 'alice'");
    }

    Ok(())
}
