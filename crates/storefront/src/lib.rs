//! HFC Storefront library.
//!
//! The customer-facing ordering client as a library, so the router can be
//! driven in-process by tests.
//!
//! - [`backend`] - Restaurant backend REST client and the `OrderingBackend` seam
//! - [`checkout`] - Checkout initiation with an at-most-one-in-flight gate
//! - [`payment_status`] - Resolution of the gateway return leg
//! - [`routes`] - Axum handlers and the application router
//! - [`models`] - Session-stored state (cart, pending transaction, customer)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payment_status;
pub mod routes;
pub mod state;
