//! HTTP route handlers for storefront.
//!
//! Every handler answers JSON; the checkout handler answers with a
//! `303 See Other` to the payment gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Menu
//! GET  /menu/categories        - Categories, by display order
//! GET  /menu/items             - Menu items (optional ?category=ID)
//! GET  /promotions             - Promotions, newest first
//!
//! # Assistant
//! POST /chat                   - Ask the ordering assistant
//!
//! # Cart (session)
//! GET  /cart                   - Cart view with totals
//! POST /cart/add               - Add one of an item
//! POST /cart/update            - Set a line's quantity (<= 0 removes)
//! POST /cart/remove            - Remove a line
//!
//! # Checkout (requires auth)
//! POST /checkout               - Create the order, redirect to the gateway
//! GET  /payment-status         - Gateway return leg (redirect mode)
//! POST /payment-status         - Gateway return leg (form-post mode)
//!
//! # Account (requires auth)
//! GET  /orders                 - Order history timelines
//! GET  /messages               - Conversations with the restaurant
//! POST /messages               - Send a message to the owner
//!
//! # Auth
//! POST /auth/session           - Exchange an identity-provider token for a session
//! GET  /auth/me                - Signed-in customer (or null)
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod chat;
pub mod checkout;
pub mod menu;
pub mod messages;
pub mod orders;

use axum::{
    Router,
    body::Body,
    http::Request,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    SessionLocks, create_session_layer, request_id_middleware, serialize_session_requests,
};
use crate::state::AppState;

/// Create the menu routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(menu::categories))
        .route("/items", get(menu::items))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(auth::create_session))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        // Menu and promotions
        .nest("/menu", menu_routes())
        .route("/promotions", get(menu::promotions))
        // Assistant
        .route("/chat", post(chat::ask))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout and the gateway return leg
        .route("/checkout", post(checkout::checkout))
        .route(
            "/payment-status",
            get(checkout::payment_status_redirect).post(checkout::payment_status_form),
        )
        // Account routes
        .route("/orders", get(orders::index))
        .route("/messages", get(messages::index).post(messages::send))
        // Auth routes
        .nest("/auth", auth_routes())
}

/// Build the complete application: routes, sessions, request ids and tracing.
///
/// Requests sharing a session cookie run one at a time, with the session
/// saved before the next one starts.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn_with_state(
            SessionLocks::new(),
            serialize_session_requests,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
