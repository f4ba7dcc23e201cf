//! Restaurant backend REST client.
//!
//! # Architecture
//!
//! - The backend is the source of truth for menus, orders, payments and users.
//!   Nothing here recomputes what it decides.
//! - [`OrderingBackend`] is the seam every route and service talks to;
//!   [`BackendClient`] implements it over `reqwest`.
//! - Menu, category and promotion reads are cached via `moka` (5 minute TTL).
//!
//! # Error policy
//!
//! List reads are wrapped with [`or_empty`] at the call site so a failed
//! fetch degrades to an empty view. Write operations return
//! [`BackendError`] for the route to render as an inline message.
//!
//! # Example
//!
//! ```rust,ignore
//! use hfc_storefront::backend::{BackendClient, OrderingBackend};
//!
//! let client = BackendClient::new(&config.backend)?;
//! let items = client.list_menu_items().await?;
//! ```

mod cache;
mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use hfc_core::menu::{Category, MenuItem, Promotion};
use hfc_core::messages::{ChatReply, ChatRequest, ChatThread};
use hfc_core::orders::OrderRecord;
use hfc_core::{PaymentOutcome, TransactionId};

/// Message shown when the backend cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str =
    "We can't reach the server right now. Please check your connection and try again.";

/// Message shown when the backend rejects a request without detail.
pub const GENERIC_REJECTION_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when talking to the restaurant backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// The backend answered with a non-success status.
    #[error("Backend rejected request with status {status}")]
    Rejected {
        status: u16,
        /// Server-provided detail text, if the body carried one.
        detail: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response shape: {0}")]
    Parse(String),
}

impl BackendError {
    /// Text safe to show the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable(_) => UNREACHABLE_MESSAGE.to_string(),
            Self::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Rejected { detail: None, .. } | Self::Parse(_) => {
                GENERIC_REJECTION_MESSAGE.to_string()
            }
        }
    }

    /// Server-provided detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Whether the backend refused the caller's credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Identity-provider credential attached as `Authorization: Bearer <token>`.
///
/// Refresh and expiry are the identity provider's concern.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Operations the customer client needs from the restaurant backend.
#[async_trait]
pub trait OrderingBackend: Send + Sync {
    /// `GET /menu/categories/`
    async fn list_categories(&self) -> Result<Vec<Category>, BackendError>;

    /// `GET /menu/items/`
    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, BackendError>;

    /// `GET /promotions/`
    async fn list_promotions(&self) -> Result<Vec<Promotion>, BackendError>;

    /// `POST /chats/`
    async fn ask_assistant(&self, request: &ChatRequest) -> Result<ChatReply, BackendError>;

    /// `POST /owner/sync-user`. `Ok(None)` when the backend answers `null`.
    async fn sync_user(&self, id_token: &BearerToken) -> Result<Option<BackendUser>, BackendError>;

    /// `POST /payments/initiate-payment`
    async fn initiate_payment(
        &self,
        credential: &BearerToken,
        lines: &[CheckoutLine],
    ) -> Result<InitiatePaymentResponse, BackendError>;

    /// `GET /payments/status/{transactionId}`
    async fn payment_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentOutcome, BackendError>;

    /// `GET /payments/my-orders`
    async fn my_orders(&self, credential: &BearerToken) -> Result<Vec<OrderRecord>, BackendError>;

    /// `POST /chats/contact-owner`
    async fn contact_owner(
        &self,
        credential: &BearerToken,
        message: &str,
    ) -> Result<ContactOwnerReceipt, BackendError>;

    /// `GET /chats/my-messages`
    async fn my_messages(&self, credential: &BearerToken)
    -> Result<Vec<ChatThread>, BackendError>;
}

/// Degrade a failed list read to an empty list, logging the failure.
pub fn or_empty<T>(result: Result<Vec<T>, BackendError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to fetch {what}");
        Vec::new()
    })
}

/// Pull a human-readable detail out of an error body.
///
/// Understands `{"detail": "..."}` and `{"message": "..."}`; anything else
/// (HTML error pages, empty bodies) yields `None`.
#[must_use]
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_variants() {
        assert_eq!(
            extract_detail(r#"{"detail": "Invalid cart item data."}"#).as_deref(),
            Some("Invalid cart item data.")
        );
        assert_eq!(
            extract_detail(r#"{"success": false, "message": "Declined"}"#).as_deref(),
            Some("Declined")
        );
        assert_eq!(extract_detail(r#"{"detail": [{"loc": ["body"]}]}"#), None);
        assert_eq!(extract_detail("<html>502</html>"), None);
        assert_eq!(extract_detail(""), None);
    }

    #[test]
    fn test_user_message() {
        let err = BackendError::Unreachable("connection refused".into());
        assert_eq!(err.user_message(), UNREACHABLE_MESSAGE);

        let err = BackendError::Rejected {
            status: 400,
            detail: Some("Item sold out".into()),
        };
        assert_eq!(err.user_message(), "Item sold out");

        let err = BackendError::Rejected {
            status: 500,
            detail: None,
        };
        assert_eq!(err.user_message(), GENERIC_REJECTION_MESSAGE);
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(
            BackendError::Rejected {
                status: 401,
                detail: None
            }
            .is_unauthorized()
        );
        assert!(!BackendError::Parse("x".into()).is_unauthorized());
    }

    #[test]
    fn test_bearer_token_debug_redacts() {
        let token = BearerToken::new("eyJhbGciOi.secret");
        assert_eq!(format!("{token:?}"), "BearerToken([REDACTED])");
        assert_eq!(token.header_value(), "Bearer eyJhbGciOi.secret");
    }

    #[test]
    fn test_or_empty_degrades() {
        let items: Vec<u8> = or_empty(Err(BackendError::Unreachable("down".into())), "items");
        assert!(items.is_empty());
        let items: Vec<u8> = or_empty(Ok(vec![3]), "items");
        assert_eq!(items, vec![3]);
    }
}
