//! Cache types for backend catalog responses.

use hfc_core::menu::{Category, MenuItem, Promotion};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    MenuItems,
    Promotions,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    MenuItems(Vec<MenuItem>),
    Promotions(Vec<Promotion>),
}
