//! Session middleware configuration for admin.
//!
//! Admin sessions live in their own `admin.session` table, expire after a day
//! of inactivity and use `SameSite=Strict`.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, cookie::SameSite};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "drape_admin_session";

/// Schema holding the admin session table.
pub const SESSION_SCHEMA: &str = "admin";

/// Admin session table name.
pub const SESSION_TABLE: &str = "session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Build the `PostgreSQL` store for admin sessions.
///
/// # Errors
///
/// Returns the store's message if the schema or table name is rejected.
pub fn admin_session_store(pool: PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool)
        .with_schema_name(SESSION_SCHEMA)
        .map_err(|e| e.to_string())?
        .with_table_name(SESSION_TABLE)
        .map_err(|e| e.to_string())
}

#[must_use]
pub fn create_session_layer<S>(store: S, config: &AdminConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
