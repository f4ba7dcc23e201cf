//! Session middleware configuration.
//!
//! Sessions live in process memory in a bounded `moka` cache. Idle sessions
//! are evicted, so the store never outgrows its capacity. Sessions do not
//! survive a restart; the cart and pending transaction are per-browser state.
//!
//! Requests carrying the same session cookie are handled one at a time. Each
//! request loads the whole session record and writes the whole record back,
//! so overlapping requests would otherwise overwrite each other's changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::COOKIE},
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use tokio::sync::Mutex;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::cookie::{Cookie, SameSite};
use tower_sessions::session::{Id, Record};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, session_store};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "hfc_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Most sessions kept at once; the least recently used are evicted first.
const MAX_SESSIONS: u64 = 100_000;

/// How long an unused per-session lock is kept.
const LOCK_IDLE: Duration = Duration::from_secs(60 * 60);

/// Session store backed by a bounded, idle-evicting `moka` cache.
#[derive(Debug, Clone)]
pub struct MokaSessionStore {
    records: Cache<Id, Record>,
}

impl MokaSessionStore {
    /// Create a store holding at most `max_sessions`, dropping any session
    /// not touched for `idle`.
    #[must_use]
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        Self {
            records: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle)
                .build(),
        }
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let candidate = record.clone();
            let entry = self
                .records
                .entry(record.id)
                .or_insert_with(async move { candidate })
                .await;
            if entry.is_fresh() {
                return Ok(());
            }
            // Id collision
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = self.records.get(session_id).await else {
            return Ok(None);
        };
        if record.expiry_date <= OffsetDateTime::now_utc() {
            self.records.invalidate(session_id).await;
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer over an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaSessionStore> {
    let store = MokaSessionStore::new(
        MAX_SESSIONS,
        Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()),
    );

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// One async lock per session cookie value.
#[derive(Debug, Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(LOCK_IDLE)
                .build(),
        }
    }

    async fn lock_for(&self, session_key: String) -> Arc<Mutex<()>> {
        self.locks
            .get_with(session_key, async { Arc::new(Mutex::new(())) })
            .await
    }
}

/// The session cookie value, if the browser sent one.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

/// Middleware that runs requests of the same session one after another.
///
/// Must wrap the session layer so the lock covers both loading and saving
/// the record. Requests without a session cookie start a fresh session and
/// pass straight through.
pub async fn serialize_session_requests(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(session_key) = session_cookie(request.headers()) else {
        return next.run(request).await;
    };

    let lock = locks.lock_for(session_key).await;
    let _guard = lock.lock_owned().await;
    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::http::HeaderValue;

    use super::*;

    fn record(expires_in: tower_sessions::cookie::time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::new(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    fn hour() -> tower_sessions::cookie::time::Duration {
        tower_sessions::cookie::time::Duration::hours(1)
    }

    #[tokio::test]
    async fn test_store_saves_loads_and_deletes() {
        let store = MokaSessionStore::new(10, Duration::from_secs(60));
        let mut record = record(hour());
        store.create(&mut record).await.unwrap();

        let loaded = store.load(&record.id).await.unwrap();
        assert_eq!(loaded.map(|r| r.id), Some(record.id));

        store.delete(&record.id).await.unwrap();
        assert!(store.load(&record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_picks_new_id_on_collision() {
        let store = MokaSessionStore::new(10, Duration::from_secs(60));
        let existing = record(hour());
        store.save(&existing).await.unwrap();

        let mut colliding = record(hour());
        colliding.id = existing.id;
        store.create(&mut colliding).await.unwrap();

        assert_ne!(colliding.id, existing.id);
        assert!(store.load(&existing.id).await.unwrap().is_some());
        assert!(store.load(&colliding.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_record_is_not_loaded() {
        let store = MokaSessionStore::new(10, Duration::from_secs(60));
        let stale = record(-hour());
        store.save(&stale).await.unwrap();

        assert!(store.load(&stale.id).await.unwrap().is_none());
        store.records.run_pending_tasks().await;
        assert_eq!(store.records.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let store = MokaSessionStore::new(10, Duration::from_millis(20));
        let idle = record(hour());
        store.save(&idle).await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(store.load(&idle.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_session_shares_one_lock() {
        let locks = SessionLocks::new();
        let a = locks.lock_for("abc".to_string()).await;
        let b = locks.lock_for("abc".to_string()).await;
        let other = locks.lock_for("xyz".to_string()).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));

        let _held = a.try_lock().unwrap();
        assert!(b.try_lock().is_err());
        assert!(other.try_lock().is_ok());
    }

    #[test]
    fn test_session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; hfc_session=s3ss10n; lang=en"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("s3ss10n"));

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_cookie(&headers), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }
}
