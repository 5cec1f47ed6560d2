//! TechShack client - register and user administration logic.
//!
//! Holds the state a point-of-sale front-end works with and talks to the
//! backend over its JSON API. Nothing here renders anything.
//!
//! # Modules
//!
//! - [`cart`] - Cart state machine and checkout
//! - [`register`] - Catalog plus cart for one cashier
//! - [`receipt`] - Plain-text receipt
//! - [`table`] - Generic sortable, selectable, paginated table
//! - [`users`] - Users table bound to the backend
//! - [`backend`] - Backend contract, HTTP client and retry policy
//! - [`config`] - Environment configuration
//! - [`error`] - Validation and state errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod config;
pub mod error;
pub mod receipt;
pub mod register;
pub mod table;
pub mod users;

pub use backend::{BackendError, HttpBackend, PosBackend, RetryPolicy};
pub use cart::{Cart, CartPhase, CompletedSale, LineItem};
pub use config::{ApiConfig, ClientConfig, ConfigError, LogFormat};
pub use error::{CartError, CheckoutError, StateError, UsersError, ValidationError};
pub use receipt::Receipt;
pub use register::Register;
pub use table::{SelectAllState, SortDirection, TableController, TableRecord};
pub use users::{UserColumn, UsersPage};
