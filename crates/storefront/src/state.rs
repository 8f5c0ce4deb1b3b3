//! Application state shared across handlers.

use std::sync::Arc;

use drape_core::shipping::ShippingCalculator;
use sqlx::PgPool;

use crate::backend::{BackendClient, BackendError};
use crate::config::StorefrontConfig;

/// Shared handler state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    backend: BackendClient,
    shipping: ShippingCalculator,
}

impl AppState {
    /// Build the state: backend client plus the shipping calculator with the
    /// configured free-shipping threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let shipping =
            ShippingCalculator::standard().with_free_shipping_threshold(config.free_shipping_threshold);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                backend,
                shipping,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Session-store pool, also used by the readiness probe.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn shipping(&self) -> &ShippingCalculator {
        &self.inner.shipping
    }
}
