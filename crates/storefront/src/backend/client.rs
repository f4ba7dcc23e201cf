//! `reqwest` implementation of [`OrderingBackend`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use hfc_core::menu::{Category, MenuItem, Promotion};
use hfc_core::messages::{ChatReply, ChatRequest, ChatThread};
use hfc_core::orders::OrderRecord;
use hfc_core::{PaymentOutcome, TransactionId};

use super::cache::{CacheKey, CacheValue};
use super::{
    BackendError, BackendUser, BearerToken, CheckoutLine, ContactOwnerReceipt,
    ContactOwnerRequest, InitiatePaymentResponse, OrderingBackend, SyncUserRequest,
    extract_detail,
};
use crate::config::BackendConfig;

/// Longest slice of a response body written to the log.
const LOG_BODY_LIMIT: usize = 500;

/// Client for the restaurant backend REST API.
///
/// Cheaply cloneable. Catalog reads (categories, menu items, promotions) are
/// cached for 5 minutes.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        credential: &BearerToken,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        let value = HeaderValue::from_str(&credential.header_value())
            .map_err(|e| BackendError::Parse(format!("Invalid credential format: {e}")))?;
        Ok(builder.header(AUTHORIZATION, value))
    }

    /// Send a request and decode a JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Backend request failed");
            BackendError::Unreachable(e.to_string())
        })?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read backend response body");
            BackendError::Unreachable(e.to_string())
        })?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::from(e)
        })
    }

    async fn cached<F>(&self, key: CacheKey, fetch: F) -> Result<CacheValue, BackendError>
    where
        F: Future<Output = Result<CacheValue, BackendError>>,
    {
        if let Some(value) = self.inner.cache.get(&key).await {
            debug!(?key, "Cache hit");
            return Ok(value);
        }

        let value = fetch.await?;
        self.inner.cache.insert(key, value.clone()).await;
        Ok(value)
    }
}

#[async_trait]
impl OrderingBackend for BackendClient {
    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let fetch = async {
            let request = self.inner.client.get(self.url("/menu/categories/"));
            self.send(request).await.map(CacheValue::Categories)
        };
        match self.cached(CacheKey::Categories, fetch).await? {
            CacheValue::Categories(categories) => Ok(categories),
            other => Err(BackendError::Parse(format!("cache type mismatch: {other:?}"))),
        }
    }

    #[instrument(skip(self))]
    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, BackendError> {
        let fetch = async {
            let request = self.inner.client.get(self.url("/menu/items/"));
            self.send(request).await.map(CacheValue::MenuItems)
        };
        match self.cached(CacheKey::MenuItems, fetch).await? {
            CacheValue::MenuItems(items) => Ok(items),
            other => Err(BackendError::Parse(format!("cache type mismatch: {other:?}"))),
        }
    }

    #[instrument(skip(self))]
    async fn list_promotions(&self) -> Result<Vec<Promotion>, BackendError> {
        let fetch = async {
            let request = self.inner.client.get(self.url("/promotions/"));
            self.send(request).await.map(CacheValue::Promotions)
        };
        match self.cached(CacheKey::Promotions, fetch).await? {
            CacheValue::Promotions(promotions) => Ok(promotions),
            other => Err(BackendError::Parse(format!("cache type mismatch: {other:?}"))),
        }
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn ask_assistant(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        let builder = self.inner.client.post(self.url("/chats/")).json(request);
        self.send(builder).await
    }

    #[instrument(skip(self, id_token))]
    async fn sync_user(&self, id_token: &BearerToken) -> Result<Option<BackendUser>, BackendError> {
        let body = SyncUserRequest {
            token: id_token.expose(),
        };
        let builder = self.inner.client.post(self.url("/owner/sync-user")).json(&body);
        self.send(builder).await
    }

    #[instrument(skip(self, credential, lines), fields(lines = lines.len()))]
    async fn initiate_payment(
        &self,
        credential: &BearerToken,
        lines: &[CheckoutLine],
    ) -> Result<InitiatePaymentResponse, BackendError> {
        let builder = self
            .inner
            .client
            .post(self.url("/payments/initiate-payment"))
            .json(lines);
        self.send(self.authorized(builder, credential)?).await
    }

    #[instrument(skip(self, transaction_id), fields(transaction_id = %transaction_id))]
    async fn payment_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentOutcome, BackendError> {
        let path = format!(
            "/payments/status/{}",
            urlencoding::encode(transaction_id.as_str())
        );
        let builder = self.inner.client.get(self.url(&path));
        self.send(builder).await
    }

    #[instrument(skip(self, credential))]
    async fn my_orders(&self, credential: &BearerToken) -> Result<Vec<OrderRecord>, BackendError> {
        let builder = self.inner.client.get(self.url("/payments/my-orders"));
        self.send(self.authorized(builder, credential)?).await
    }

    #[instrument(skip(self, credential, message))]
    async fn contact_owner(
        &self,
        credential: &BearerToken,
        message: &str,
    ) -> Result<ContactOwnerReceipt, BackendError> {
        let builder = self
            .inner
            .client
            .post(self.url("/chats/contact-owner"))
            .json(&ContactOwnerRequest { message });
        self.send(self.authorized(builder, credential)?).await
    }

    #[instrument(skip(self, credential))]
    async fn my_messages(
        &self,
        credential: &BearerToken,
    ) -> Result<Vec<ChatThread>, BackendError> {
        let builder = self.inner.client.get(self.url("/chats/my-messages"));
        self.send(self.authorized(builder, credential)?).await
    }
}
