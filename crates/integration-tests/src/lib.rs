//! Integration tests for the TechShack client.
//!
//! [`FakeBackend`] serves the backend's JSON API from memory on a random
//! local port, so the tests in `tests/` drive the real [`HttpBackend`] over
//! HTTP: status mapping, retries and idempotency keys included.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p techshack-integration-tests
//! ```
//!
//! Failure injection:
//! - [`FakeBackend::fail_sales_for`] answers 503 without storing anything
//! - [`FakeBackend::reject_sales_for`] answers 422 without storing anything
//! - [`FakeBackend::lose_acks_for`] stores the sale, then answers 503, as if
//!   the response was lost on the way back

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use techshack_client::backend::IDEMPOTENCY_KEY_HEADER;
use techshack_client::{ApiConfig, HttpBackend, RetryPolicy};
use techshack_core::{
    CatalogItem, FIRST_SALE_NO, NewUser, SaleLineInput, SaleNo, SaleRecord, UserId, UserRecord,
};

#[derive(Debug, Default)]
struct FakeState {
    items: Vec<CatalogItem>,
    users: Vec<UserRecord>,
    next_user_id: i32,
    sales: Vec<SaleRecord>,
    sales_by_key: HashMap<String, SaleRecord>,
    sale_posts: u32,
    /// Item description -> remaining 503s before the post is accepted.
    failing_items: HashMap<String, u32>,
    /// Item description -> remaining 422s before the post is accepted.
    rejected_items: HashMap<String, u32>,
    /// Item description -> remaining posts that are stored but answered with 503.
    lost_acks: HashMap<String, u32>,
}

impl FakeState {
    fn take_one(counter: &mut HashMap<String, u32>, item: &str) -> bool {
        match counter.get_mut(item) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

type Shared = Arc<Mutex<FakeState>>;

/// In-memory backend listening on `127.0.0.1`.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    base_url: String,
    state: Shared,
}

impl FakeBackend {
    /// Start serving with the given catalog and users.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn spawn(
        items: Vec<CatalogItem>,
        users: Vec<UserRecord>,
    ) -> std::io::Result<Self> {
        let next_user_id = users.iter().map(|u| u.id.as_i32()).max().unwrap_or(0) + 1;
        let state: Shared = Arc::new(Mutex::new(FakeState {
            items,
            users,
            next_user_id,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/items/in-stock", get(list_items))
            .route("/sales", post(record_sale))
            .route("/users", get(list_users).post(create_user))
            .route("/users/{id}", put(update_user).delete(delete_user))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{addr}/"),
            state,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A real HTTP client pointed at this backend, with no backoff between
    /// attempts.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client(&self, max_attempts: u32) -> Result<HttpBackend, Box<dyn std::error::Error>> {
        let mut config = ApiConfig::new(&self.base_url)?;
        config.timeout = Duration::from_secs(5);
        config.retry = RetryPolicy::new(max_attempts, Duration::ZERO);
        Ok(HttpBackend::new(&config)?)
    }

    /// Answer the next `times` posts for `item` with 503, storing nothing.
    pub async fn fail_sales_for(&self, item: &str, times: u32) {
        self.state
            .lock()
            .await
            .failing_items
            .insert(item.to_string(), times);
    }

    /// Answer the next `times` posts for `item` with 422, storing nothing.
    pub async fn reject_sales_for(&self, item: &str, times: u32) {
        self.state
            .lock()
            .await
            .rejected_items
            .insert(item.to_string(), times);
    }

    /// Store the next `times` posts for `item` but answer them with 503.
    pub async fn lose_acks_for(&self, item: &str, times: u32) {
        self.state
            .lock()
            .await
            .lost_acks
            .insert(item.to_string(), times);
    }

    /// Every stored sale, in insertion order.
    pub async fn sales(&self) -> Vec<SaleRecord> {
        self.state.lock().await.sales.clone()
    }

    /// Number of `POST /sales` requests received, including rejected ones.
    pub async fn sale_posts(&self) -> u32 {
        self.state.lock().await.sale_posts
    }

    pub async fn users(&self) -> Vec<UserRecord> {
        self.state.lock().await.users.clone()
    }

    /// Delete a user behind the client's back.
    pub async fn remove_user(&self, id: UserId) {
        self.state.lock().await.users.retain(|u| u.id != id);
    }
}

async fn list_items(State(state): State<Shared>) -> Json<Vec<CatalogItem>> {
    Json(state.lock().await.items.clone())
}

async fn record_sale(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(line): Json<SaleLineInput>,
) -> Response {
    let mut state = state.lock().await;
    state.sale_posts += 1;

    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(existing) = key.as_ref().and_then(|k| state.sales_by_key.get(k)) {
        return Json(existing.clone()).into_response();
    }

    if FakeState::take_one(&mut state.failing_items, &line.item) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if FakeState::take_one(&mut state.rejected_items, &line.item) {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }

    let offset = i32::try_from(state.sales.len()).unwrap_or(i32::MAX);
    let sale_no = SaleNo::new(FIRST_SALE_NO.as_i32().saturating_add(offset));
    let record = SaleRecord {
        sale_no,
        cashier: line.cashier,
        item: line.item,
        quantity: line.quantity,
        price: line.price,
        date: Utc::now(),
    };
    state.sales.push(record.clone());
    if let Some(key) = key {
        state.sales_by_key.insert(key, record.clone());
    }

    if FakeState::take_one(&mut state.lost_acks, &record.item) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    Json(record).into_response()
}

async fn list_users(State(state): State<Shared>) -> Json<Vec<UserRecord>> {
    Json(state.lock().await.users.clone())
}

async fn create_user(State(state): State<Shared>, Json(user): Json<NewUser>) -> Json<UserRecord> {
    let mut state = state.lock().await;
    let record = UserRecord {
        id: UserId::new(state.next_user_id),
        username: user.username,
        position: user.position,
    };
    state.next_user_id += 1;
    state.users.push(record.clone());
    Json(record)
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<i32>,
    Json(user): Json<UserRecord>,
) -> Result<Json<UserRecord>, StatusCode> {
    let mut state = state.lock().await;
    let existing = state
        .users
        .iter_mut()
        .find(|u| u.id.as_i32() == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    existing.username = user.username;
    existing.position = user.position;
    Ok(Json(existing.clone()))
}

async fn delete_user(State(state): State<Shared>, Path(id): Path<i32>) -> StatusCode {
    let mut state = state.lock().await;
    let before = state.users.len();
    state.users.retain(|u| u.id.as_i32() != id);
    if state.users.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}
