//! `reqwest` implementation of the backend contract.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use techshack_core::{CatalogItem, NewUser, SaleLineInput, SaleRecord, UserId, UserRecord};

use super::{BackendError, PosBackend, RetryPolicy};
use crate::config::ApiConfig;

/// Header carrying the per-line dedup key on sale posts.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Longest response body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// JSON API client for the point-of-sale backend.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    inner: Arc<HttpBackendInner>,
}

struct HttpBackendInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.inner.base_url.as_str())
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Create a client from API configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpBackendInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
                retry: config.retry,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let url = self.inner.base_url.join(path)?;
        let builder = self.inner.client.request(method, url);
        Ok(match &self.inner.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await.map_err(BackendError::from_reqwest)?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BackendError> {
        let response = Self::send(builder).await?;
        let body = response.text().await.map_err(BackendError::from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        Self::send_json(self.request(Method::GET, path)?).await
    }

    async fn post_sale(&self, line: &SaleLineInput) -> Result<SaleRecord, BackendError> {
        let builder = self
            .request(Method::POST, "sales")?
            .header(IDEMPOTENCY_KEY_HEADER, line.idempotency_key.as_str())
            .json(line);
        Self::send_json(builder).await
    }

    async fn put_user(&self, user: &UserRecord) -> Result<UserRecord, BackendError> {
        let builder = self
            .request(Method::PUT, &format!("users/{}", user.id))?
            .json(user);
        Self::send_json(builder).await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), BackendError> {
        let builder = self.request(Method::DELETE, &format!("users/{id}"))?;
        match Self::send(builder).await {
            // A retried delete whose first attempt landed sees the user gone.
            Ok(_) | Err(BackendError::Status { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Turn a non-success response into an error.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(BackendError::RateLimited(retry_after));
    }

    let body = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();

    Err(BackendError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl PosBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, BackendError> {
        let items: Vec<CatalogItem> = self
            .inner
            .retry
            .run("fetch_catalog", || self.get_json("items/in-stock"))
            .await?;

        debug!(count = items.len(), "Fetched catalog");
        Ok(items)
    }

    #[instrument(skip(self, line), fields(item = %line.item, key = %line.idempotency_key))]
    async fn record_sale(&self, line: &SaleLineInput) -> Result<SaleRecord, BackendError> {
        let record: SaleRecord = self
            .inner
            .retry
            .run("record_sale", || self.post_sale(line))
            .await?;

        debug!(sale_no = %record.sale_no, "Sale recorded");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, BackendError> {
        let users: Vec<UserRecord> = self
            .inner
            .retry
            .run("fetch_users", || self.get_json("users"))
            .await?;

        debug!(count = users.len(), "Fetched users");
        Ok(users)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord, BackendError> {
        // Creation is not idempotent on the backend, so it gets exactly one attempt.
        let builder = self.request(Method::POST, "users")?.json(user);
        Self::send_json(builder).await
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn update_user(&self, user: &UserRecord) -> Result<UserRecord, BackendError> {
        self.inner
            .retry
            .run("update_user", || self.put_user(user))
            .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_users(&self, ids: &[UserId]) -> Result<(), BackendError> {
        for &id in ids {
            self.inner
                .retry
                .run("delete_user", || self.delete_user(id))
                .await?;
        }
        Ok(())
    }
}
