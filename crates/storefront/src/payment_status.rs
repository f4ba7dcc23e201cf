//! Payment status tracking for the gateway return leg.
//!
//! After the gateway sends the customer back, the tracker asks the backend how
//! the transaction settled and maps the answer onto a [`PaymentState`]. A
//! settled order (success or pending) empties the cart; a failure leaves it
//! intact so the customer can retry.

use std::sync::Arc;

use tracing::instrument;

use hfc_core::{Cart, PaymentState, TransactionId};

use crate::backend::{BackendError, OrderingBackend};
use crate::config::PaymentStatusConfig;

/// Resolves a returned transaction into a terminal [`PaymentState`].
#[derive(Clone)]
pub struct PaymentStatusTracker {
    backend: Arc<dyn OrderingBackend>,
    policy: PaymentStatusConfig,
}

impl PaymentStatusTracker {
    #[must_use]
    pub fn new(backend: Arc<dyn OrderingBackend>, policy: PaymentStatusConfig) -> Self {
        Self { backend, policy }
    }

    /// Check the status of `transaction_id` and apply the result to `cart`.
    ///
    /// Without a transaction id the result is `Failed` and the backend is not
    /// contacted. While the backend reports the payment as pending, the check
    /// is repeated up to `max_attempts` times with doubling backoff. The
    /// returned state is always terminal.
    #[instrument(skip(self, transaction_id, cart), fields(transaction_id = transaction_id.map(TransactionId::as_str)))]
    pub async fn track(
        &self,
        transaction_id: Option<&TransactionId>,
        cart: &mut Cart,
    ) -> PaymentState {
        let Some(transaction_id) = transaction_id.filter(|id| !id.as_str().trim().is_empty())
        else {
            tracing::warn!("Payment return without a transaction id");
            return PaymentState::missing_transaction();
        };

        if !self.policy.initial_delay.is_zero() {
            tokio::time::sleep(self.policy.initial_delay).await;
        }

        let state = self.poll(transaction_id).await;

        if state.clears_cart() {
            cart.clear();
        }

        tracing::info!(state = ?state, "Payment status resolved");
        state
    }

    async fn poll(&self, transaction_id: &TransactionId) -> PaymentState {
        let attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.backoff;
        let mut state = PaymentState::Loading;

        for attempt in 1..=attempts {
            state = match self.backend.payment_status(transaction_id).await {
                Ok(outcome) => PaymentState::Loading.apply(&outcome),
                // Pending was already reported for this transaction
                Err(err) if state == PaymentState::Pending => {
                    tracing::warn!(error = %err, attempt, "Recheck failed, keeping pending state");
                    break;
                }
                Err(err) => return unreachable_state(&err),
            };

            if state != PaymentState::Pending || attempt == attempts {
                break;
            }

            tracing::debug!(attempt, ?backoff, "Payment still pending, checking again");
            tokio::time::sleep(backoff).await;
            backoff = backoff.saturating_mul(2);
        }

        state
    }
}

fn unreachable_state(err: &BackendError) -> PaymentState {
    tracing::warn!(error = %err, "Payment status check failed");
    match err {
        BackendError::Unreachable(_) => {
            PaymentState::unreachable(Some(crate::backend::UNREACHABLE_MESSAGE))
        }
        other => PaymentState::unreachable(other.detail()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::fake::{CallCounts, FakeBackend};
    use hfc_core::menu::{DietaryInfo, MenuItem, Pricing};
    use hfc_core::payment::{GENERIC_FAILURE_MESSAGE, NO_TRANSACTION_MESSAGE};
    use hfc_core::{PaymentCode, PaymentOutcome};
    use rust_decimal_macros::dec;

    fn policy(max_attempts: u32) -> PaymentStatusConfig {
        PaymentStatusConfig {
            initial_delay: Duration::ZERO,
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    fn setup(max_attempts: u32) -> (Arc<FakeBackend>, PaymentStatusTracker) {
        let backend = Arc::new(FakeBackend::new());
        let tracker = PaymentStatusTracker::new(backend.clone(), policy(max_attempts));
        (backend, tracker)
    }

    fn cart() -> Cart {
        let item = MenuItem {
            id: "A".into(),
            name: "Paneer Tikka".into(),
            description: String::new(),
            category_id: "starters".into(),
            pricing: vec![Pricing {
                size: "Full".into(),
                price: dec!(280),
            }],
            image_url: None,
            tags: vec![],
            dietary_info: DietaryInfo::default(),
            customization_options: vec![],
            key_ingredients: vec![],
            is_available: true,
            prep_time_minutes: None,
        };
        let mut cart = Cart::new();
        cart.add_line(&item).unwrap();
        cart
    }

    fn outcome(success: bool, code: &str, message: Option<&str>) -> PaymentOutcome {
        PaymentOutcome {
            success,
            code: Some(PaymentCode::from(code.to_string())),
            message: message.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn test_success_clears_cart() {
        let (backend, tracker) = setup(1);
        backend.set_status(vec![Ok(outcome(true, "PAYMENT_SUCCESS", None))]);
        let txn = TransactionId::new("xyz");
        let mut cart = cart();

        let state = tracker.track(Some(&txn), &mut cart).await;

        assert_eq!(state, PaymentState::Success);
        assert!(cart.is_empty());
        assert_eq!(
            backend.queried_transaction.lock().unwrap().as_ref(),
            Some(&txn)
        );
    }

    #[tokio::test]
    async fn test_pending_clears_cart() {
        let (backend, tracker) = setup(1);
        backend.set_status(vec![Ok(outcome(true, "PAYMENT_PENDING", None))]);
        let mut cart = cart();

        let state = tracker
            .track(Some(&TransactionId::new("xyz")), &mut cart)
            .await;

        assert_eq!(state, PaymentState::Pending);
        assert!(cart.is_empty());
        assert_eq!(CallCounts::get(&backend.calls.payment_status), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_cart_and_shows_backend_message() {
        let (backend, tracker) = setup(1);
        backend.set_status(vec![Ok(outcome(false, "PAYMENT_ERROR", Some("Card declined")))]);
        let mut cart = cart();
        let before = cart.clone();

        let state = tracker
            .track(Some(&TransactionId::new("xyz")), &mut cart)
            .await;

        assert_eq!(state, PaymentState::Failed("Card declined".into()));
        assert_eq!(cart, before);
    }

    #[tokio::test]
    async fn test_missing_transaction_never_calls_backend() {
        let (backend, tracker) = setup(3);
        let mut cart = cart();

        let state = tracker.track(None, &mut cart).await;
        assert_eq!(state, PaymentState::Failed(NO_TRANSACTION_MESSAGE.into()));

        let blank = TransactionId::new("  ");
        let state = tracker.track(Some(&blank), &mut cart).await;
        assert_eq!(state, PaymentState::Failed(NO_TRANSACTION_MESSAGE.into()));

        assert_eq!(CallCounts::get(&backend.calls.payment_status), 0);
        assert!(!cart.is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_fails_without_clearing() {
        let (backend, tracker) = setup(3);
        backend.set_status(vec![Err(BackendError::Rejected {
            status: 404,
            detail: None,
        })]);
        let mut cart = cart();

        let state = tracker
            .track(Some(&TransactionId::new("xyz")), &mut cart)
            .await;

        assert_eq!(state, PaymentState::Failed(GENERIC_FAILURE_MESSAGE.into()));
        assert!(!cart.is_empty());
        assert_eq!(CallCounts::get(&backend.calls.payment_status), 1);
    }

    #[tokio::test]
    async fn test_pending_is_rechecked_until_settled() {
        let (backend, tracker) = setup(3);
        backend.set_status(vec![
            Ok(outcome(true, "PAYMENT_PENDING", None)),
            Ok(outcome(true, "PAYMENT_SUCCESS", None)),
        ]);
        let mut cart = cart();

        let state = tracker
            .track(Some(&TransactionId::new("xyz")), &mut cart)
            .await;

        assert_eq!(state, PaymentState::Success);
        assert_eq!(CallCounts::get(&backend.calls.payment_status), 2);
    }

    #[tokio::test]
    async fn test_error_after_pending_keeps_pending() {
        let (backend, tracker) = setup(3);
        backend.set_status(vec![
            Ok(outcome(true, "PAYMENT_PENDING", None)),
            Err(BackendError::Unreachable("connection reset".into())),
        ]);
        let mut cart = cart();

        let state = tracker
            .track(Some(&TransactionId::new("xyz")), &mut cart)
            .await;

        assert_eq!(state, PaymentState::Pending);
        assert!(cart.is_empty());
        assert_eq!(CallCounts::get(&backend.calls.payment_status), 2);
    }

    #[tokio::test]
    async fn test_polling_is_bounded() {
        let (backend, tracker) = setup(3);
        backend.set_status(vec![Ok(outcome(true, "PAYMENT_PENDING", None))]);
        let mut cart = cart();

        let state = tracker
            .track(Some(&TransactionId::new("xyz")), &mut cart)
            .await;

        assert_eq!(state, PaymentState::Pending);
        assert_eq!(CallCounts::get(&backend.calls.payment_status), 3);
    }
}
