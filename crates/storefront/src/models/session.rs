//! Session-related types.
//!
//! Everything the storefront remembers about a visitor between requests lives
//! in the session under the keys in [`keys`].

use std::fmt;

use drape_core::user::User;
use serde::{Deserialize, Serialize};

/// Backend bearer token for a signed-in visitor.
///
/// `Debug` is redacted so the token never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Session-stored identity: the last-known profile and the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub profile: User,
    pub token: SessionToken,
}

impl CurrentUser {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.profile.first_name()
    }
}

/// Session keys.
pub mod keys {
    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// The signed-in user (profile and token).
    pub const CURRENT_USER: &str = "current_user";

    /// Toasts waiting to be shown on the next page.
    pub const TOASTS: &str = "toasts";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drape_core::UserId;
    use drape_core::user::UserRole;

    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let user = CurrentUser {
            profile: User {
                id: UserId::new("u1"),
                name: "Meera Iyer".to_string(),
                email: "meera@example.com".to_string(),
                role: UserRole::User,
                phone: None,
            },
            token: SessionToken::new("eyJhbGciOiJIUzI1NiJ9.secret"),
        };

        let debug_output = format!("{user:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("eyJhbGciOiJIUzI1NiJ9"));
        assert_eq!(user.display_name(), "Meera");
    }

    #[test]
    fn test_token_serializes_transparently() {
        let json = serde_json::to_string(&SessionToken::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
