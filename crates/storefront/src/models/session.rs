//! Session-related types.
//!
//! Everything the customer client keeps between requests lives in the
//! session: the cart, the transaction handed to the gateway, the signed-in
//! customer and the assistant conversation.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;
use uuid::Uuid;

use hfc_core::messages::ChatMessage;
use hfc_core::{Cart, ChatSessionId, PendingTransaction};

use crate::backend::{BackendUser, BearerToken};

/// Session-stored customer identity.
///
/// Holds the backend's user record and the identity-provider token used as the
/// bearer credential for authenticated backend calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub user: BackendUser,
    id_token: String,
}

impl CurrentCustomer {
    #[must_use]
    pub fn new(user: BackendUser, id_token: impl Into<String>) -> Self {
        Self {
            user,
            id_token: id_token.into(),
        }
    }

    /// Credential for authenticated backend calls.
    #[must_use]
    pub fn bearer(&self) -> BearerToken {
        BearerToken::new(self.id_token.clone())
    }

    /// Stable key for per-customer guards.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.user.firebase_uid
    }
}

/// The assistant conversation for this browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
    pub session_id: ChatSessionId,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatState {
    /// Start a conversation with a fresh session id.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            session_id: ChatSessionId::new(Uuid::new_v4().to_string()),
            messages: Vec::new(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the cart.
    pub const CART: &str = "cart";

    /// Key for the transaction handed to the payment gateway.
    pub const PENDING_TRANSACTION: &str = "pending_transaction";

    /// Key for the signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the assistant conversation.
    pub const CHAT: &str = "chat";
}

/// Load the cart, or an empty one if none is stored yet.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, SessionError> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Persist the cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), SessionError> {
    session.insert(keys::CART, cart).await
}

/// Remember the transaction handed to the gateway.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_pending(
    session: &Session,
    pending: &PendingTransaction,
) -> Result<(), SessionError> {
    session.insert(keys::PENDING_TRANSACTION, pending).await
}

/// The transaction handed to the gateway, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_pending(session: &Session) -> Result<Option<PendingTransaction>, SessionError> {
    session.get(keys::PENDING_TRANSACTION).await
}

/// Forget the transaction handed to the gateway.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_pending(session: &Session) -> Result<(), SessionError> {
    session
        .remove::<PendingTransaction>(keys::PENDING_TRANSACTION)
        .await?;
    Ok(())
}

/// Load the assistant conversation, starting one if needed.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load_chat(session: &Session) -> Result<ChatState, SessionError> {
    Ok(session
        .get::<ChatState>(keys::CHAT)
        .await?
        .unwrap_or_else(ChatState::fresh))
}

/// Persist the assistant conversation.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_chat(session: &Session, chat: &ChatState) -> Result<(), SessionError> {
    session.insert(keys::CHAT, chat).await
}
