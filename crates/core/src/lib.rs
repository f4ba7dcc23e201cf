//! HFC Core - Shared domain types for the restaurant customer client.
//!
//! This crate provides the types and pure state used by the storefront:
//! - [`cart`] - The cart store (line items, quantities, derived totals)
//! - [`payment`] - Pending transactions, backend payment outcomes, tracker states
//! - [`orders`] - Order records and the order-history timeline projection
//! - [`menu`] - Menu items, categories and promotions as served by the backend
//! - [`messages`] - Chat assistant and owner-messaging payloads
//!
//! # Architecture
//!
//! The core crate contains only types and state transitions - no I/O, no HTTP
//! clients, no sessions. The storefront crate owns every side effect.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod menu;
pub mod messages;
pub mod orders;
pub mod payment;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use payment::{PaymentOutcome, PaymentState, PendingTransaction};
pub use types::*;
