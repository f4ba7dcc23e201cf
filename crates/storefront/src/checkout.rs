//! Checkout initiation.
//!
//! Turns the current cart into a backend order and a payment gateway redirect.
//! The cart is read, never modified: on any failure the customer can retry
//! with the same cart. Only one checkout per customer may be in flight at a
//! time, so repeated clicks cannot create duplicate orders.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::instrument;
use url::Url;

use hfc_core::{Cart, PendingTransaction, TransactionId};

use crate::backend::{BackendError, BearerToken, CheckoutLine, OrderingBackend};

/// Query parameters that may carry the transaction id on a gateway URL.
const TRANSACTION_QUERY_KEYS: &[&str] = &["merchantTransactionId", "transactionId"];

/// Path segment that precedes the transaction id on a gateway URL.
const TRANSACTION_PATH_PREFIX: &str = "pay";

/// Errors that can occur while starting a checkout.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// There is nothing to pay for.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Another checkout for the same customer has not finished yet.
    #[error("A checkout is already in progress")]
    AlreadyInFlight,

    /// The backend call failed.
    #[error("Checkout failed: {0}")]
    Backend(#[from] BackendError),

    /// The backend answered successfully but gave no gateway URL.
    #[error("Payment link missing from backend response")]
    MissingRedirectUrl,

    /// The gateway URL is not a valid absolute URL.
    #[error("Invalid payment link: {0}")]
    InvalidRedirectUrl(String),

    /// Neither the response nor the gateway URL identifies the transaction.
    #[error("Transaction id missing from backend response")]
    MissingTransactionId,
}

impl CheckoutError {
    /// Text safe to show the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty. Add something from the menu first.".to_string(),
            Self::AlreadyInFlight => {
                "Your payment is already being set up. Please wait a moment.".to_string()
            }
            Self::Backend(err) if err.is_unauthorized() => {
                "Please log in to proceed with your order.".to_string()
            }
            Self::Backend(BackendError::Unreachable(_)) => {
                crate::backend::UNREACHABLE_MESSAGE.to_string()
            }
            Self::Backend(err) => err.detail().map_or_else(
                || {
                    "Something went wrong while setting up your payment. Please try again."
                        .to_string()
                },
                str::to_owned,
            ),
            Self::MissingRedirectUrl | Self::InvalidRedirectUrl(_) | Self::MissingTransactionId => {
                "Could not retrieve the payment link. Please try again.".to_string()
            }
        }
    }
}

/// At-most-one-in-flight guard for checkout requests, keyed by customer.
#[derive(Debug, Clone, Default)]
pub struct CheckoutGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Held while a checkout is in flight; releases the slot on drop.
#[derive(Debug)]
pub struct CheckoutPermit {
    key: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl CheckoutGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `key`, or `None` if a checkout is already running.
    #[must_use]
    pub fn try_acquire(&self, key: &str) -> Option<CheckoutPermit> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.to_owned()) {
            return None;
        }
        Some(CheckoutPermit {
            key: key.to_owned(),
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    #[must_use]
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

impl Drop for CheckoutPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Creates backend orders from carts and resolves the gateway redirect.
#[derive(Clone)]
pub struct CheckoutInitiator {
    backend: Arc<dyn OrderingBackend>,
    gate: CheckoutGate,
}

impl CheckoutInitiator {
    #[must_use]
    pub fn new(backend: Arc<dyn OrderingBackend>) -> Self {
        Self {
            backend,
            gate: CheckoutGate::new(),
        }
    }

    #[must_use]
    pub const fn gate(&self) -> &CheckoutGate {
        &self.gate
    }

    /// Ask the backend to create an order for `cart` and return where to send
    /// the customer.
    ///
    /// `owner` identifies the cart session for the in-flight guard. Empty
    /// carts and concurrent attempts are rejected before any network call.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`]; the cart is never modified.
    #[instrument(skip(self, credential, cart), fields(lines = cart.lines().len()))]
    pub async fn initiate(
        &self,
        owner: &str,
        credential: &BearerToken,
        cart: &Cart,
    ) -> Result<PendingTransaction, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let _permit = self
            .gate
            .try_acquire(owner)
            .ok_or(CheckoutError::AlreadyInFlight)?;

        let lines: Vec<CheckoutLine> = cart.lines().iter().map(CheckoutLine::from).collect();
        let response = self.backend.initiate_payment(credential, &lines).await?;

        let redirect_url = response
            .redirect_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(CheckoutError::MissingRedirectUrl)?;
        let parsed = Url::parse(&redirect_url)
            .map_err(|e| CheckoutError::InvalidRedirectUrl(e.to_string()))?;

        let transaction_id = response
            .merchant_transaction_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| transaction_id_from_url(&parsed))
            .map(TransactionId::new)
            .ok_or(CheckoutError::MissingTransactionId)?;

        tracing::info!(transaction_id = %transaction_id, "Checkout initiated");

        Ok(PendingTransaction {
            transaction_id,
            redirect_url,
        })
    }
}

/// Recover a transaction id embedded in a gateway URL.
///
/// Looks for a known query parameter first, then for a `/pay/<id>` path
/// ending. Any other hosted-page URL yields `None` rather than a guess.
#[must_use]
pub fn transaction_id_from_url(url: &Url) -> Option<String> {
    let from_query = url.query_pairs().find_map(|(key, value)| {
        (TRANSACTION_QUERY_KEYS.contains(&key.as_ref()) && !value.is_empty())
            .then(|| value.into_owned())
    });

    from_query.or_else(|| {
        let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
        let id = segments.next_back()?;
        (segments.next_back()? == TRANSACTION_PATH_PREFIX).then(|| id.to_owned())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backend::InitiatePaymentResponse;
    use crate::backend::fake::{CallCounts, FakeBackend};
    use hfc_core::menu::{DietaryInfo, MenuItem, Pricing};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn item(id: &str, price: Decimal) -> MenuItem {
        MenuItem {
            id: id.into(),
            name: id.to_string(),
            description: String::new(),
            category_id: "cat".into(),
            pricing: vec![Pricing {
                size: "Full".into(),
                price,
            }],
            image_url: None,
            tags: vec![],
            dietary_info: DietaryInfo::default(),
            customization_options: vec![],
            key_ingredients: vec![],
            is_available: true,
            prep_time_minutes: None,
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        let a = item("A", dec!(100));
        cart.add_line(&a).unwrap();
        cart.add_line(&a).unwrap();
        cart.add_line(&item("B", dec!(250))).unwrap();
        cart
    }

    fn setup() -> (Arc<FakeBackend>, CheckoutInitiator) {
        let backend = Arc::new(FakeBackend::new());
        let initiator = CheckoutInitiator::new(backend.clone());
        (backend, initiator)
    }

    fn token() -> BearerToken {
        BearerToken::new("id-token")
    }

    #[tokio::test]
    async fn test_empty_cart_never_calls_backend() {
        let (backend, initiator) = setup();
        let result = initiator.initiate("uid", &token(), &Cart::new()).await;
        assert_eq!(result, Err(CheckoutError::EmptyCart));
        assert_eq!(CallCounts::get(&backend.calls.initiate_payment), 0);
    }

    #[tokio::test]
    async fn test_success_returns_pending_transaction() {
        let (backend, initiator) = setup();
        backend.set_initiate(Ok(InitiatePaymentResponse {
            redirect_url: Some("https://gateway/pay/xyz".into()),
            merchant_transaction_id: None,
        }));

        let pending = initiator.initiate("uid", &token(), &cart()).await.unwrap();
        assert_eq!(pending.redirect_url, "https://gateway/pay/xyz");
        assert_eq!(pending.transaction_id.as_str(), "xyz");

        let submitted = backend.submitted_lines.lock().unwrap().clone();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].quantity, 2);
        assert_eq!(submitted[1].pricing[0].price, dec!(250));
    }

    #[tokio::test]
    async fn test_explicit_transaction_id_wins() {
        let (backend, initiator) = setup();
        backend.set_initiate(Ok(InitiatePaymentResponse {
            redirect_url: Some("https://gateway/pay/page?token=abc".into()),
            merchant_transaction_id: Some("txn-42".into()),
        }));
        let pending = initiator.initiate("uid", &token(), &cart()).await.unwrap();
        assert_eq!(pending.transaction_id.as_str(), "txn-42");
    }

    #[tokio::test]
    async fn test_server_error_leaves_cart_and_is_repeatable() {
        let (backend, initiator) = setup();
        backend.set_initiate(Err(BackendError::Rejected {
            status: 500,
            detail: None,
        }));
        let cart = cart();
        let before = cart.clone();

        for _ in 0..3 {
            let result = initiator.initiate("uid", &token(), &cart).await;
            assert!(matches!(
                result,
                Err(CheckoutError::Backend(BackendError::Rejected { status: 500, .. }))
            ));
            assert!(!initiator.gate().is_in_flight("uid"));
        }
        assert_eq!(cart, before);
        assert_eq!(CallCounts::get(&backend.calls.initiate_payment), 3);
    }

    #[tokio::test]
    async fn test_missing_redirect_url() {
        let (backend, initiator) = setup();
        backend.set_initiate(Ok(InitiatePaymentResponse::default()));
        let result = initiator.initiate("uid", &token(), &cart()).await;
        assert_eq!(result, Err(CheckoutError::MissingRedirectUrl));
    }

    #[tokio::test]
    async fn test_concurrent_checkout_rejected_without_network() {
        let (backend, initiator) = setup();
        let _held = initiator.gate().try_acquire("uid").unwrap();

        let result = initiator.initiate("uid", &token(), &cart()).await;
        assert_eq!(result, Err(CheckoutError::AlreadyInFlight));
        assert_eq!(CallCounts::get(&backend.calls.initiate_payment), 0);
    }

    #[test]
    fn test_gate_releases_on_drop() {
        let gate = CheckoutGate::new();
        let permit = gate.try_acquire("a").unwrap();
        assert!(gate.try_acquire("a").is_none());
        assert!(gate.try_acquire("b").is_some());
        drop(permit);
        assert!(gate.try_acquire("a").is_some());
    }

    #[test]
    fn test_transaction_id_from_url() {
        let url = Url::parse("https://gw.example/pay?merchantTransactionId=m-1").unwrap();
        assert_eq!(transaction_id_from_url(&url).as_deref(), Some("m-1"));

        let url = Url::parse("https://gw.example/pg/v1/pay/abc123/").unwrap();
        assert_eq!(transaction_id_from_url(&url).as_deref(), Some("abc123"));

        let url = Url::parse("https://gw.example/").unwrap();
        assert_eq!(transaction_id_from_url(&url), None);

        let url = Url::parse("https://gw.example/transact/simulator?token=abc").unwrap();
        assert_eq!(transaction_id_from_url(&url), None);

        let url = Url::parse("https://gw.example/pay").unwrap();
        assert_eq!(transaction_id_from_url(&url), None);
    }

    #[tokio::test]
    async fn test_unrecognised_gateway_url_is_rejected() {
        let (backend, initiator) = setup();
        backend.set_initiate(Ok(InitiatePaymentResponse {
            redirect_url: Some("https://gw.example/transact/simulator?token=abc".into()),
            merchant_transaction_id: None,
        }));

        let result = initiator.initiate("uid", &token(), &cart()).await;
        assert_eq!(result, Err(CheckoutError::MissingTransactionId));
        assert!(!initiator.gate().is_in_flight("uid"));
    }

    #[test]
    fn test_user_messages() {
        let unauthorized = CheckoutError::Backend(BackendError::Rejected {
            status: 401,
            detail: None,
        });
        assert_eq!(
            unauthorized.user_message(),
            "Please log in to proceed with your order."
        );
        assert_eq!(
            CheckoutError::MissingRedirectUrl.user_message(),
            "Could not retrieve the payment link. Please try again."
        );
    }
}
