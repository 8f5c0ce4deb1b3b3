//! Types stored in the admin session.

pub mod session;

pub use session::{AdminToken, CurrentAdmin, keys as session_keys};
