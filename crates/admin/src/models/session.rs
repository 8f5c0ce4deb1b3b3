//! Session-related types for admin authentication.

use std::fmt;

use drape_core::user::User;
use serde::{Deserialize, Serialize};

/// Backend bearer token of a signed-in admin. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminToken(String);

impl AdminToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken([REDACTED])")
    }
}

/// Session-stored admin identity.
///
/// Only profiles with the `admin` role are ever stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub profile: User,
    pub token: AdminToken,
}

impl CurrentAdmin {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.profile.first_name()
    }
}

/// Session keys.
pub mod keys {
    /// The signed-in admin (profile and token).
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Toasts waiting to be shown on the next page.
    pub const TOASTS: &str = "toasts";
}
