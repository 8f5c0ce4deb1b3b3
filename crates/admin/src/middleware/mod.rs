//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer`
//! 3. Security headers
//! 4. Session layer (`PostgreSQL` store in production)
//! 5. Session expiry (signs the admin out on a backend `401`)
//!
//! Route guards are extractors: [`RequireAdmin`] on every page except login.

pub mod auth;
pub mod security_headers;
pub mod session;
pub mod session_expiry;

pub use auth::{OptionalAdmin, RequireAdmin, clear_current_admin, set_current_admin};
pub use security_headers::security_headers_middleware;
pub use session::{admin_session_store, create_session_layer};
pub use session_expiry::session_expiry_middleware;
