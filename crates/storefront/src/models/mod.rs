//! Types stored in the visitor session.

pub mod session;

pub use session::{CurrentUser, SessionToken, keys as session_keys};
