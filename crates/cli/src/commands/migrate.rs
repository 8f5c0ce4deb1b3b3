//! Session-store migrations.
//!
//! Both apps keep only their sessions in `PostgreSQL`. The storefront uses the
//! store's default `tower_sessions.session` table; admin uses `admin.session`
//! so the two can share a database without sharing sessions.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront database (falls back to `DATABASE_URL`)
//! - `ADMIN_DATABASE_URL` - admin database (falls back to `DATABASE_URL`)

use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    Store(String),
}

/// Read `primary`, falling back to `DATABASE_URL`.
fn database_url(primary: &'static str) -> Result<String, MigrationError> {
    dotenvy::dotenv().ok();
    std::env::var(primary)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar(primary))
}

/// Create the storefront session table.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let url = database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(&url).await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete");
    Ok(())
}

/// Create the admin session schema and table.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the DDL fails.
pub async fn admin() -> Result<(), MigrationError> {
    let url = database_url("ADMIN_DATABASE_URL")?;

    tracing::info!("Connecting to admin database...");
    let pool = PgPool::connect(&url).await?;

    tracing::info!("Creating admin session table...");
    drape_admin::middleware::admin_session_store(pool)
        .map_err(MigrationError::Store)?
        .migrate()
        .await?;

    tracing::info!("Admin migrations complete");
    Ok(())
}
