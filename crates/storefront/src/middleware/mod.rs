//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Per-session serialization (one request per session at a time)
//! 5. Session layer (tower-sessions with a bounded in-memory store)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_customer, set_current_customer};
pub use request_id::request_id_middleware;
pub use session::{
    MokaSessionStore, SessionLocks, create_session_layer, serialize_session_requests,
};
