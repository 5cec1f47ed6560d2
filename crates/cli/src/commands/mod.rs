//! Subcommand implementations.

pub mod catalog;
pub mod sell;
pub mod users;

use thiserror::Error;

use techshack_client::{
    BackendError, CartError, CheckoutError, ConfigError, UsersError, ValidationError,
};

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("Checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("{0}")]
    Users(#[from] UsersError),
}
