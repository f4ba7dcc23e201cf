//! Payment transactions and the payment status state machine.
//!
//! ```text
//! Loading ──► Success   (PAYMENT_SUCCESS, cart cleared)
//!        ├──► Pending   (PAYMENT_PENDING, cart cleared)
//!        └──► Failed    (anything else, cart untouched)
//! ```
//!
//! All three outcomes are terminal: once reached, [`PaymentState::apply`]
//! leaves the state unchanged.

use serde::{Deserialize, Serialize};

use crate::types::{PaymentCode, TransactionId};

/// Message used when the return leg carries no usable transaction id.
pub const NO_TRANSACTION_MESSAGE: &str = "no transaction id found";

/// Message used when the backend gives no detail for a failed check.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "We could not confirm your payment. Please try again.";

/// A checkout that has been handed to the payment gateway.
///
/// Persisted before navigating away so the return leg can recover the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub transaction_id: TransactionId,
    /// Gateway-hosted page the customer is sent to.
    pub redirect_url: String,
}

/// Settlement outcome reported by the backend status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub success: bool,
    #[serde(default)]
    pub code: Option<PaymentCode>,
    #[serde(default)]
    pub message: Option<String>,
}

/// User-visible state of the payment status page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PaymentState {
    Loading,
    Success,
    Pending,
    Failed(String),
}

impl PaymentState {
    /// Whether no further automatic action is taken from this state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Whether reaching this state means the order was placed and the cart
    /// should be emptied.
    #[must_use]
    pub const fn clears_cart(&self) -> bool {
        matches!(self, Self::Success | Self::Pending)
    }

    /// Map a backend outcome onto a state, without regard to the current one.
    #[must_use]
    pub fn from_outcome(outcome: &PaymentOutcome) -> Self {
        if !outcome.success {
            return Self::Failed(failure_message(outcome.message.as_deref()));
        }

        match &outcome.code {
            Some(PaymentCode::Success) => Self::Success,
            Some(PaymentCode::Pending) => Self::Pending,
            Some(PaymentCode::Failed | PaymentCode::Other(_)) | None => {
                Self::Failed(failure_message(outcome.message.as_deref()))
            }
        }
    }

    /// Apply a backend outcome. Terminal states absorb every outcome.
    #[must_use]
    pub fn apply(self, outcome: &PaymentOutcome) -> Self {
        if self.is_terminal() {
            return self;
        }
        Self::from_outcome(outcome)
    }

    /// The state for a return leg with no recoverable transaction id.
    #[must_use]
    pub fn missing_transaction() -> Self {
        Self::Failed(NO_TRANSACTION_MESSAGE.to_string())
    }

    /// The state for a status check that never got a usable answer.
    #[must_use]
    pub fn unreachable(detail: Option<&str>) -> Self {
        Self::Failed(failure_message(detail))
    }
}

fn failure_message(detail: Option<&str>) -> String {
    detail
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map_or_else(|| GENERIC_FAILURE_MESSAGE.to_string(), str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(success: bool, code: Option<&str>, message: Option<&str>) -> PaymentOutcome {
        PaymentOutcome {
            success,
            code: code.map(|c| PaymentCode::from(c.to_string())),
            message: message.map(str::to_owned),
        }
    }

    #[test]
    fn test_success_code_clears_cart() {
        let state = PaymentState::Loading.apply(&outcome(true, Some("PAYMENT_SUCCESS"), None));
        assert_eq!(state, PaymentState::Success);
        assert!(state.clears_cart());
    }

    #[test]
    fn test_pending_code_clears_cart() {
        let state = PaymentState::Loading.apply(&outcome(true, Some("PAYMENT_PENDING"), None));
        assert_eq!(state, PaymentState::Pending);
        assert!(state.clears_cart());
    }

    #[test]
    fn test_failed_and_unknown_codes_fail() {
        for code in ["PAYMENT_FAILED", "PAYMENT_DECLINED", "BOGUS"] {
            let state = PaymentState::Loading.apply(&outcome(true, Some(code), None));
            assert!(matches!(state, PaymentState::Failed(_)), "{code}");
            assert!(!state.clears_cart());
        }
    }

    #[test]
    fn test_success_false_uses_message_or_generic() {
        let state = PaymentState::from_outcome(&outcome(false, None, Some("Card declined")));
        assert_eq!(state, PaymentState::Failed("Card declined".to_string()));

        let state = PaymentState::from_outcome(&outcome(false, Some("PAYMENT_SUCCESS"), Some("  ")));
        assert_eq!(state, PaymentState::Failed(GENERIC_FAILURE_MESSAGE.to_string()));
    }

    #[test]
    fn test_terminal_states_absorb_outcomes() {
        let failed = PaymentState::missing_transaction();
        let after = failed.clone().apply(&outcome(true, Some("PAYMENT_SUCCESS"), None));
        assert_eq!(after, failed);

        let after = PaymentState::Success.apply(&outcome(false, None, None));
        assert_eq!(after, PaymentState::Success);
    }

    #[test]
    fn test_missing_transaction_message() {
        assert_eq!(
            PaymentState::missing_transaction(),
            PaymentState::Failed("no transaction id found".to_string())
        );
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(PaymentState::Failed("nope".into())).ok();
        assert_eq!(json, Some(serde_json::json!({"state": "failed", "message": "nope"})));
        let json = serde_json::to_value(PaymentState::Success).ok();
        assert_eq!(json, Some(serde_json::json!({"state": "success"})));
    }
}
