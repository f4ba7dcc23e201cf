//! Owner messaging route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use hfc_core::messages::ChatThread;

use crate::backend::{ContactOwnerReceipt, or_empty};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Longest message accepted for the owner.
const MAX_MESSAGE_LEN: usize = 2000;

/// Message for the restaurant owner.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

/// List the customer's conversations. Empty on backend failure.
#[instrument(skip(state, customer), fields(user_id = %customer.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Json<Vec<ChatThread>> {
    let threads = or_empty(
        state.backend().my_messages(&customer.bearer()).await,
        "messages",
    );
    Json(threads)
}

/// Send a message to the restaurant owner.
#[instrument(skip(state, customer, request), fields(user_id = %customer.user.id))]
pub async fn send(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ContactOwnerReceipt>> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Please write a message".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "Messages are limited to {MAX_MESSAGE_LEN} characters"
        )));
    }

    let receipt = state
        .backend()
        .contact_owner(&customer.bearer(), message)
        .await?;

    add_breadcrumb("messages", "Contacted owner", None);

    Ok(Json(receipt))
}
