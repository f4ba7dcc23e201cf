//! Cart route handlers.
//!
//! The cart lives in the session. Each handler loads it, applies one
//! mutation to the owned copy and writes the whole value back before
//! answering with the refreshed view.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use hfc_core::{Cart, CartLine, CurrencyCode, ItemId, Price};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub item_id: ItemId,
    pub name: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Cart display data.
///
/// Taxes and total are advisory; the backend computes the amount charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u64,
    pub subtotal: String,
    pub taxes: String,
    pub total: String,
}

fn rupees(amount: rust_decimal::Decimal) -> String {
    Price::new(amount, CurrencyCode::INR).display()
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            item_id: line.item_id.clone(),
            name: line.name.clone(),
            size: line.size.clone(),
            quantity: line.quantity,
            unit_price: rupees(line.unit_price),
            line_total: rupees(line.line_total()),
            image_url: line.image_url.clone(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            count: cart.count(),
            subtotal: rupees(cart.subtotal()),
            taxes: rupees(cart.taxes()),
            total: rupees(cart.total_to_pay()),
        }
    }
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub item_id: ItemId,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Remove from cart request.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub item_id: ItemId,
}

/// Display the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add one of a menu item to the cart.
///
/// The item is looked up in the current menu so the captured price and
/// availability come from the backend, not the request.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let items = state.backend().list_menu_items().await?;
    let item = items
        .iter()
        .find(|item| item.id == request.item_id)
        .ok_or_else(|| AppError::NotFound(format!("Menu item {}", request.item_id)))?;

    let mut cart = load_cart(&session).await?;
    cart.add_line(item)?;
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added item", Some(&[("item_id", item.id.as_str())]));

    Ok(Json(CartView::from(&cart)))
}

/// Set the quantity of a cart line. Zero or less removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(&request.item_id, request.quantity);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove_line(&request.item_id);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
