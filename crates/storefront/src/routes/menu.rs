//! Menu and promotion route handlers.
//!
//! Catalog reads never fail the page: a backend error is logged and the
//! customer sees an empty list.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use hfc_core::CategoryId;
use hfc_core::menu::{self, Category, MenuItem, Promotion};

use crate::backend::or_empty;
use crate::state::AppState;

/// Query parameters for the item listing.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    pub category: Option<String>,
}

impl ItemsQuery {
    fn category(&self) -> Option<CategoryId> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(CategoryId::new)
    }
}

/// List categories in display order.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let mut categories = or_empty(state.backend().list_categories().await, "categories");
    menu::sort_categories(&mut categories);
    Json(categories)
}

/// List menu items, optionally restricted to one category.
#[instrument(skip(state))]
pub async fn items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Json<Vec<MenuItem>> {
    let items = or_empty(state.backend().list_menu_items().await, "menu items");
    Json(menu::filter_by_category(items, query.category().as_ref()))
}

/// List promotions, newest first.
#[instrument(skip(state))]
pub async fn promotions(State(state): State<AppState>) -> Json<Vec<Promotion>> {
    let mut promotions = or_empty(state.backend().list_promotions().await, "promotions");
    menu::sort_promotions(&mut promotions);
    Json(promotions)
}
