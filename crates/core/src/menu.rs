//! Menu, category and promotion types as served by the backend.
//!
//! Field names follow the backend's JSON contract (`_id`, `snake_case`).
//! Optional collections default to empty so a sparse document never fails
//! to decode.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ItemId, PromotionId};

/// One price tier of a menu item (e.g. "Half" / "Full").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    /// Portion label.
    pub size: String,
    /// Price in rupees.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Dietary flags for a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DietaryInfo {
    pub is_vegan_available: bool,
    pub is_gluten_free: bool,
    pub is_jain_available: bool,
}

/// A customization choice offered on a menu item (e.g. spice level).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationOption {
    pub option_name: String,
    #[serde(default)]
    pub choices: Vec<String>,
}

/// A purchasable menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub pricing: Vec<Pricing>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dietary_info: DietaryInfo,
    #[serde(default)]
    pub customization_options: Vec<CustomizationOption>,
    #[serde(default)]
    pub key_ingredients: Vec<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub prep_time_minutes: Option<u32>,
}

const fn default_available() -> bool {
    true
}

impl MenuItem {
    /// The price the cart captures for this item: the first listed tier.
    #[must_use]
    pub fn first_price(&self) -> Option<Decimal> {
        self.pricing.first().map(|tier| tier.price)
    }
}

/// A menu category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

/// A promotion announced to customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    #[serde(rename = "_id")]
    pub id: PromotionId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub discount_percentage: Option<u8>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Promotion {
    /// Whether the promotion is running at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

/// Sort categories by their configured display order, ascending.
pub fn sort_categories(categories: &mut [Category]) {
    categories.sort_by_key(|c| c.display_order);
}

/// Sort promotions newest first by start date.
pub fn sort_promotions(promotions: &mut [Promotion]) {
    promotions.sort_by(|a, b| b.start_date.cmp(&a.start_date));
}

/// Keep only items belonging to `category`, or everything when `None`.
#[must_use]
pub fn filter_by_category(items: Vec<MenuItem>, category: Option<&CategoryId>) -> Vec<MenuItem> {
    match category {
        Some(category) => items
            .into_iter()
            .filter(|item| &item.category_id == category)
            .collect(),
        None => items,
    }
}
