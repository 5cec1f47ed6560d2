//! Backend collaborator contract.
//!
//! Everything the register and the users page need from the server goes
//! through [`PosBackend`]. [`HttpBackend`] is the production implementation
//! over the JSON API; tests use the generated [`MockPosBackend`].
//!
//! # Endpoints
//!
//! | Operation         | Request                                      |
//! |-------------------|----------------------------------------------|
//! | `fetch_catalog`   | `GET items/in-stock`                         |
//! | `record_sale`     | `POST sales` with an `Idempotency-Key` header |
//! | `fetch_users`     | `GET users`                                  |
//! | `create_user`     | `POST users`                                 |
//! | `update_user`     | `PUT users/{id}`                             |
//! | `delete_users`    | `DELETE users/{id}` for each id              |

mod error;
mod http;
mod retry;

use async_trait::async_trait;
use mockall::automock;

use techshack_core::{CatalogItem, NewUser, SaleLineInput, SaleRecord, UserId, UserRecord};

pub use error::BackendError;
pub use http::{HttpBackend, IDEMPOTENCY_KEY_HEADER};
pub use retry::RetryPolicy;

/// Operations the client delegates to the backend.
///
/// There is no batch endpoint for sales: callers post one line at a time and
/// aggregate partial failures themselves.
#[automock]
#[async_trait]
pub trait PosBackend: Send + Sync {
    /// List the items currently in stock.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogItem>, BackendError>;

    /// Persist one sale line. Repeating a call with the same
    /// `idempotency_key` must not create a second record.
    async fn record_sale(&self, line: &SaleLineInput) -> Result<SaleRecord, BackendError>;

    /// List all users.
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, BackendError>;

    /// Create a user.
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord, BackendError>;

    /// Replace a user's username and position.
    async fn update_user(&self, user: &UserRecord) -> Result<UserRecord, BackendError>;

    /// Delete the given users.
    async fn delete_users(&self, ids: &[UserId]) -> Result<(), BackendError>;
}
