//! Checkout and payment return route handlers.
//!
//! # Flow
//!
//! 1. `POST /checkout` creates the order through the backend, stores the
//!    pending transaction in the session and answers `303 See Other` to the
//!    gateway page.
//! 2. The gateway sends the customer back to `/payment-status`, either as a
//!    redirect (query string) or as a form post, which is turned into a
//!    redirect.
//! 3. The tracker resolves the transaction. If it is the one this session
//!    started, the cart is cleared when the order went through and the
//!    pending transaction is consumed.

use axum::{
    Form, Json,
    extract::{Query, State, rejection::FormRejection, rejection::QueryRejection},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use hfc_core::{PaymentState, TransactionId};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::session::{clear_pending, load_cart, load_pending, save_cart, save_pending};
use crate::state::AppState;

/// Start checkout for the session's cart.
#[instrument(skip(state, session, customer), fields(user_id = %customer.user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Result<Redirect> {
    let cart = load_cart(&session).await?;

    let pending = state
        .checkout()
        .initiate(customer.key(), &customer.bearer(), &cart)
        .await?;

    // Must be durable before the customer leaves for the gateway
    save_pending(&session, &pending).await?;

    add_breadcrumb(
        "checkout",
        "Redirecting to payment gateway",
        Some(&[("transaction_id", pending.transaction_id.as_str())]),
    );

    Ok(Redirect::to(&pending.redirect_url))
}

/// Transaction identifiers the gateway may send back.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnParams {
    pub transaction_id: Option<String>,
    pub merchant_transaction_id: Option<String>,
}

impl ReturnParams {
    fn transaction_id(self) -> Option<TransactionId> {
        self.transaction_id
            .into_iter()
            .chain(self.merchant_transaction_id)
            .map(|id| id.trim().to_owned())
            .find(|id| !id.is_empty())
            .map(TransactionId::new)
    }
}

/// Payment status page data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatusView {
    pub status: PaymentState,
    pub title: &'static str,
    pub subtitle: String,
    pub transaction_id: Option<TransactionId>,
}

impl PaymentStatusView {
    fn new(status: PaymentState, transaction_id: Option<TransactionId>) -> Self {
        let (title, subtitle) = match &status {
            PaymentState::Loading => (
                "Checking Payment",
                "Please wait while we confirm your payment.".to_string(),
            ),
            PaymentState::Success => (
                "Payment Successful!",
                "Thank you for your order. We're preparing it now!".to_string(),
            ),
            PaymentState::Pending => (
                "Payment Pending",
                "Your order has been placed. We'll confirm it as soon as the payment clears."
                    .to_string(),
            ),
            PaymentState::Failed(message) => ("Payment Failed", message.clone()),
        };

        Self {
            status,
            title,
            subtitle,
            transaction_id,
        }
    }
}

/// Gateway return in redirect mode (`GET /payment-status?transactionId=...`).
#[instrument(skip(state, session, params))]
pub async fn payment_status_redirect(
    State(state): State<AppState>,
    session: Session,
    params: std::result::Result<Query<ReturnParams>, QueryRejection>,
) -> Result<Json<PaymentStatusView>> {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    resolve(&state, &session, params).await.map(Json)
}

/// Gateway return in form-post mode.
///
/// Answers with a redirect to the `GET` form of the page. The gateway's
/// cross-site post carries no `SameSite=Lax` session cookie; the follow-up
/// top-level navigation does, so the cart can be cleared.
#[instrument(skip(params))]
pub async fn payment_status_form(
    params: std::result::Result<Form<ReturnParams>, FormRejection>,
) -> Redirect {
    let transaction_id = params.ok().and_then(|Form(p)| p.transaction_id());
    Redirect::to(&return_location(transaction_id.as_ref()))
}

fn return_location(transaction_id: Option<&TransactionId>) -> String {
    transaction_id.map_or_else(
        || "/payment-status".to_string(),
        |id| {
            format!(
                "/payment-status?transactionId={}",
                urlencoding::encode(id.as_str())
            )
        },
    )
}

/// Track the returned transaction.
///
/// The cart and the pending transaction are only touched when the
/// transaction being tracked is the one this session started. A status link
/// for any other transaction is reported but changes nothing.
async fn resolve(
    state: &AppState,
    session: &Session,
    params: ReturnParams,
) -> Result<PaymentStatusView> {
    let pending = load_pending(session)
        .await?
        .map(|pending| pending.transaction_id);
    let transaction_id = params.transaction_id().or_else(|| pending.clone());
    let owned = transaction_id.is_some() && transaction_id == pending;

    let mut cart = load_cart(session).await?;
    let status = state
        .tracker()
        .track(transaction_id.as_ref(), &mut cart)
        .await;

    if owned {
        if status.clears_cart() {
            save_cart(session, &cart).await?;
        }
        if status.is_terminal() {
            clear_pending(session).await?;
        }
    } else if transaction_id.is_some() {
        tracing::info!("Status checked for a transaction this session did not start");
    }

    Ok(PaymentStatusView::new(status, transaction_id))
}
