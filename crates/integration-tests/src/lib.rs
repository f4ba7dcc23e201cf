//! Integration tests for the HFC customer client.
//!
//! Each test starts the full storefront router on an ephemeral port, backed
//! by the in-memory fake backend, and drives it with a cookie-keeping HTTP
//! client, so sessions behave as they do in a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hfc-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, redirect};

use hfc_core::UserRole;
use hfc_core::menu::{Category, DietaryInfo, MenuItem, Pricing};
use hfc_storefront::backend::BackendUser;
use hfc_storefront::backend::fake::FakeBackend;
use hfc_storefront::config::{BackendConfig, PaymentStatusConfig, StorefrontConfig};
use hfc_storefront::routes;
use hfc_storefront::state::AppState;

/// A running storefront and a client holding its session cookie.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub backend: Arc<FakeBackend>,
}

/// Configuration for an in-process storefront: no status delay, one check.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        backend: BackendConfig {
            base_url: "http://127.0.0.1:9/api/v1".to_string(),
            timeout: Duration::from_secs(1),
        },
        payment_status: PaymentStatusConfig {
            initial_delay: Duration::ZERO,
            max_attempts: 1,
            backoff: Duration::from_millis(1),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A menu item with a single "Full" price tier.
#[must_use]
pub fn menu_item(id: &str, category: &str, price: rust_decimal::Decimal) -> MenuItem {
    MenuItem {
        id: id.into(),
        name: format!("Dish {id}"),
        description: String::new(),
        category_id: category.into(),
        pricing: vec![Pricing {
            size: "Full".into(),
            price,
        }],
        image_url: None,
        tags: vec![],
        dietary_info: DietaryInfo::default(),
        customization_options: vec![],
        key_ingredients: vec![],
        is_available: true,
        prep_time_minutes: None,
    }
}

/// A menu category.
#[must_use]
pub fn category(id: &str, display_order: i32) -> Category {
    Category {
        id: id.into(),
        name: id.to_string(),
        description: None,
        display_order,
    }
}

/// The customer the fake backend recognises.
#[must_use]
pub fn customer() -> BackendUser {
    BackendUser {
        id: "user-1".into(),
        firebase_uid: "fb-uid-1".to_string(),
        email: "diner@example.in".to_string(),
        name: Some("Asha".to_string()),
        role: UserRole::Customer,
    }
}

impl TestContext {
    /// Serve the storefront over `backend` on an ephemeral port.
    pub async fn start(backend: FakeBackend) -> Self {
        let backend = Arc::new(backend);
        let state = AppState::new(test_config(), backend.clone());
        let app = routes::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            client: Self::browser(),
            base_url: format!("http://{addr}"),
            backend,
        }
    }

    /// A fresh cookie-keeping client that does not follow redirects.
    #[must_use]
    pub fn browser() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn post_empty(&self, path: &str) -> Response {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("POST failed")
    }

    /// Exchange a token for a customer session.
    pub async fn sign_in(&self) {
        let resp = self
            .post_json("/auth/session", &serde_json::json!({ "token": "id-token" }))
            .await;
        assert!(resp.status().is_success(), "sign-in failed: {}", resp.status());
    }

    /// Add `item_id` to the cart `times` times.
    pub async fn add_to_cart(&self, item_id: &str, times: usize) {
        for _ in 0..times {
            let resp = self
                .post_json("/cart/add", &serde_json::json!({ "item_id": item_id }))
                .await;
            assert!(resp.status().is_success(), "add failed: {}", resp.status());
        }
    }

    pub async fn json(resp: Response) -> serde_json::Value {
        resp.json().await.expect("Response was not JSON")
    }
}
