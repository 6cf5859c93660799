//! Database migration management.

use sqlx::PgPool;

use crate::error::DbError;

/// Run all pending mirror-store migrations.
///
/// Migrations are embedded at compile time from the `migrations/` directory.
///
/// # Errors
///
/// Returns `DbError::MigrationFailed` if any migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running mirror store migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::MigrationFailed)?;

    tracing::info!("Migrations completed successfully");
    Ok(())
}
