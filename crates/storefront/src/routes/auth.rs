//! Session/identity route handlers.
//!
//! Sign-in itself happens with the identity provider in the browser. The
//! resulting ID token is posted here once, checked against the backend's
//! `sync-user` endpoint, and the customer is kept in the session.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendUser, BearerToken};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Identity-provider token exchange request.
#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub token: String,
}

impl std::fmt::Debug for CreateSessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateSessionRequest")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Exchange an identity-provider token for a customer session.
#[instrument(skip(state, session, request))]
pub async fn create_session(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<BackendUser>> {
    let token = request.token.trim();
    if token.is_empty() {
        return Err(AppError::BadRequest("Missing identity token".to_string()));
    }

    let credential = BearerToken::new(token);
    let user = match state.backend().sync_user(&credential).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Err(AppError::Unauthorized(
                "We couldn't find your account. Please sign in again.".to_string(),
            ));
        }
        Err(err) if err.is_unauthorized() => {
            return Err(AppError::Unauthorized(err.user_message()));
        }
        Err(err) => return Err(err.into()),
    };

    // New identity, new session id
    session.cycle_id().await?;
    set_current_customer(&session, &CurrentCustomer::new(user.clone(), token)).await?;
    set_sentry_user(&user.id, Some(&user.email));

    tracing::info!(user_id = %user.id, role = %user.role, "Customer signed in");

    Ok(Json(user))
}

/// The signed-in customer, or `null`.
pub async fn me(OptionalAuth(customer): OptionalAuth) -> Json<Option<BackendUser>> {
    Json(customer.map(|c| c.user))
}

/// Sign the customer out. The cart stays with the browser session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_debug_redacts_token() {
        let request = CreateSessionRequest {
            token: "eyJhbGciOi.secret".into(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("secret"));
    }
}
