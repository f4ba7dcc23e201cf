//! Order history route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use hfc_core::orders::{OrderTimeline, project_history};

use crate::backend::or_empty;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// List the customer's orders as timelines, newest first.
///
/// A rejected credential is reported so the client can sign in again; any
/// other backend failure shows an empty history.
#[instrument(skip(state, customer), fields(user_id = %customer.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<OrderTimeline>>> {
    let orders = match state.backend().my_orders(&customer.bearer()).await {
        Err(err) if err.is_unauthorized() => {
            return Err(AppError::Unauthorized(err.user_message()));
        }
        result => or_empty(result, "orders"),
    };

    Ok(Json(project_history(orders)))
}
