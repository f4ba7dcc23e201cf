//! The cart store.
//!
//! A [`Cart`] is an insertion-ordered list of [`CartLine`]s owned by one
//! browsing session. Count and subtotal are derived on every read and never
//! stored. Callers load a cart, mutate their owned copy and write the whole
//! value back, so a reader never observes a half-applied change.
//!
//! Totals computed here are advisory. The backend recomputes prices and
//! availability from the submitted lines before settling anything.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::menu::{MenuItem, Pricing};
use crate::types::ItemId;

/// Tax and service charge rate shown in the order summary (18%).
pub const TAX_RATE_PERCENT: i64 = 18;

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The menu item is currently not offered.
    #[error("{0} is currently unavailable")]
    Unavailable(String),
}

/// One distinct purchasable entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub name: String,
    /// Captured from the item's first price tier when the line was created.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Always at least 1; a line is removed rather than zeroed.
    pub quantity: u32,
    /// Size label of the captured price tier, if the item listed one.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    /// Price of this line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// The single price tier the line was captured at, in the backend's shape.
    #[must_use]
    pub fn pricing(&self) -> Pricing {
        Pricing {
            size: self.size.clone().unwrap_or_default(),
            price: self.unit_price,
        }
    }
}

/// The set of line items a customer intends to purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up the line for `item_id`.
    #[must_use]
    pub fn line(&self, item_id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.item_id == item_id)
    }

    /// Add one unit of `item`.
    ///
    /// Increments the existing line if the item is already in the cart,
    /// otherwise appends a new line with quantity 1 priced from the item's
    /// first price tier (zero if the item lists no tiers).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Unavailable`] if the item is not currently offered.
    pub fn add_line(&mut self, item: &MenuItem) -> Result<(), CartError> {
        if !item.is_available {
            return Err(CartError::Unavailable(item.name.clone()));
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.item_id == item.id) {
            line.quantity = line.quantity.saturating_add(1);
            return Ok(());
        }

        let tier = item.pricing.first();
        self.lines.push(CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: tier.map_or(Decimal::ZERO, |t| t.price),
            quantity: 1,
            size: tier.map(|t| t.size.clone()),
            image_url: item.image_url.clone(),
        });
        Ok(())
    }

    /// Remove the line for `item_id`. Absent ids are a no-op.
    pub fn remove_line(&mut self, item_id: &ItemId) {
        self.lines.retain(|line| &line.item_id != item_id);
    }

    /// Replace the quantity of the line for `item_id`.
    ///
    /// `quantity <= 0` removes the line. Absent ids are a no-op.
    pub fn set_quantity(&mut self, item_id: &ItemId, quantity: i64) {
        if quantity <= 0 {
            self.remove_line(item_id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| &line.item_id == item_id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Taxes and charges on the subtotal, for display.
    #[must_use]
    pub fn taxes(&self) -> Decimal {
        (self.subtotal() * Decimal::new(TAX_RATE_PERCENT, 2)).round_dp(2)
    }

    /// Subtotal plus taxes, for display.
    #[must_use]
    pub fn total_to_pay(&self) -> Decimal {
        self.subtotal() + self.taxes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::menu::DietaryInfo;
    use rust_decimal_macros::dec;

    fn item(id: &str, price: Decimal) -> MenuItem {
        MenuItem {
            id: ItemId::new(id),
            name: format!("Dish {id}"),
            description: String::new(),
            category_id: "cat".into(),
            pricing: vec![
                Pricing { size: "Full".into(), price },
                Pricing { size: "Half".into(), price: price / dec!(2) },
            ],
            image_url: None,
            tags: vec![],
            dietary_info: DietaryInfo::default(),
            customization_options: vec![],
            key_ingredients: vec![],
            is_available: true,
            prep_time_minutes: None,
        }
    }

    fn assert_totals_consistent(cart: &Cart) {
        let count: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
        let subtotal: Decimal = cart
            .lines()
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();
        assert_eq!(cart.count(), count);
        assert_eq!(cart.subtotal(), subtotal);
        assert!(cart.subtotal() >= Decimal::ZERO);
        assert!(cart.lines().iter().all(|l| l.quantity >= 1));
    }

    #[test]
    fn test_add_same_item_twice_increments() {
        let mut cart = Cart::new();
        let dish = item("a", dec!(100));
        cart.add_line(&dish).unwrap();
        cart.add_line(&dish).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_uses_first_price_tier() {
        let mut cart = Cart::new();
        cart.add_line(&item("a", dec!(450))).unwrap();
        assert_eq!(cart.lines()[0].unit_price, dec!(450));
        assert_eq!(cart.lines()[0].size.as_deref(), Some("Full"));
    }

    #[test]
    fn test_add_item_without_pricing_is_free() {
        let mut cart = Cart::new();
        let mut dish = item("a", dec!(1));
        dish.pricing.clear();
        cart.add_line(&dish).unwrap();
        assert_eq!(cart.subtotal(), Decimal::ZERO);
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_add_unavailable_item_rejected() {
        let mut cart = Cart::new();
        let mut dish = item("a", dec!(100));
        dish.is_available = false;
        assert!(matches!(cart.add_line(&dish), Err(CartError::Unavailable(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new();
        cart.add_line(&item("a", dec!(100))).unwrap();
        cart.add_line(&item("b", dec!(50))).unwrap();

        cart.set_quantity(&ItemId::new("a"), 0);
        assert!(cart.line(&ItemId::new("a")).is_none());

        cart.set_quantity(&ItemId::new("b"), -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add_line(&item("a", dec!(100))).unwrap();
        let before = cart.clone();

        cart.set_quantity(&ItemId::new("missing"), 5);
        cart.remove_line(&ItemId::new("missing"));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_set_quantity_replaces() {
        let mut cart = Cart::new();
        cart.add_line(&item("a", dec!(100))).unwrap();
        cart.set_quantity(&ItemId::new("a"), 7);
        assert_eq!(cart.count(), 7);
        assert_eq!(cart.subtotal(), dec!(700));
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        for id in ["c", "a", "b"] {
            cart.add_line(&item(id, dec!(10))).unwrap();
        }
        cart.add_line(&item("a", dec!(10))).unwrap();
        let ids: Vec<_> = cart.lines().iter().map(|l| l.item_id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn test_totals_stay_consistent_across_mutations() {
        let mut cart = Cart::new();
        let dishes = [item("a", dec!(100)), item("b", dec!(250)), item("c", dec!(12.5))];

        for step in 0..60_i64 {
            let dish = &dishes[usize::try_from(step % 3).unwrap()];
            match step % 5 {
                0 | 1 => cart.add_line(dish).unwrap(),
                2 => cart.set_quantity(&dish.id, step % 4 - 1),
                3 => cart.set_quantity(&dish.id, step),
                _ => cart.remove_line(&dish.id),
            }
            assert_totals_consistent(&cart);
        }
    }

    #[test]
    fn test_subtotal_two_lines() {
        let mut cart = Cart::new();
        let a = item("A", dec!(100));
        cart.add_line(&a).unwrap();
        cart.add_line(&a).unwrap();
        cart.add_line(&item("B", dec!(250))).unwrap();

        assert_eq!(cart.count(), 3);
        assert_eq!(cart.subtotal(), dec!(450));
        assert_eq!(cart.taxes(), dec!(81));
        assert_eq!(cart.total_to_pay(), dec!(531));
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add_line(&item("a", dec!(100))).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }
}
