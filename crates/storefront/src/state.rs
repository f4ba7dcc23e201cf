//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::OrderingBackend;
use crate::checkout::CheckoutInitiator;
use crate::config::StorefrontConfig;
use crate::payment_status::PaymentStatusTracker;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend client, the checkout services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn OrderingBackend>,
    checkout: CheckoutInitiator,
    tracker: PaymentStatusTracker,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `backend` - Restaurant backend implementation
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: Arc<dyn OrderingBackend>) -> Self {
        let checkout = CheckoutInitiator::new(Arc::clone(&backend));
        let tracker = PaymentStatusTracker::new(Arc::clone(&backend), config.payment_status);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                checkout,
                tracker,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the restaurant backend.
    #[must_use]
    pub fn backend(&self) -> &dyn OrderingBackend {
        self.inner.backend.as_ref()
    }

    /// Get a reference to the checkout initiator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutInitiator {
        &self.inner.checkout
    }

    /// Get a reference to the payment status tracker.
    #[must_use]
    pub fn tracker(&self) -> &PaymentStatusTracker {
        &self.inner.tracker
    }
}
