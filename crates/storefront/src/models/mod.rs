//! Session-scoped state for the storefront.

pub mod session;

pub use session::{ChatState, CurrentCustomer, keys as session_keys};
