//! Session-backed cart persistence.
//!
//! The cart is read from the session at the start of every mutation and the
//! whole cart is written back after a successful one. Failed mutations write
//! nothing, so the stored cart is never left half-changed.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use drape_core::cart::{Cart, CartError};
use thiserror::Error;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

#[derive(Debug, Error)]
pub enum CartStoreError {
    /// The cart engine refused the change.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// The visitor's cart, persisted in their session.
#[derive(Clone)]
pub struct CartStore {
    session: Session,
}

impl CartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Load the cart, or an empty one if none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(&self) -> Result<Cart, tower_sessions::session::Error> {
        Ok(self
            .session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// Apply `f` to the cart and persist the result if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns the cart engine's error (nothing persisted) or a session error.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Cart) -> Result<T, CartError>,
    ) -> Result<T, CartStoreError> {
        let mut cart = self.load().await?;
        let out = f(&mut cart)?;
        self.session.insert(session_keys::CART, &cart).await?;
        Ok(out)
    }

    /// Empty the cart and drop it from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<Cart>(session_keys::CART).await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for CartStore
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(msg.to_string()))?;
        Ok(Self::new(session))
    }
}
