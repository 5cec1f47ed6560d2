//! Error types for the register and the users table.
//!
//! Failures fall into three groups:
//! - network failures, carried as [`BackendError`]
//! - validation failures ([`ValidationError`]): the operator asked for
//!   something the current state does not allow
//! - state inconsistencies ([`StateError`]): an index or id no longer matches
//!   what the controller holds

use thiserror::Error;

use techshack_core::{ItemId, Price, SaleNo, UserId};

use crate::backend::BackendError;
use crate::cart::CheckoutReport;

/// The request is not valid in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Checkout attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Tendered amount does not cover the subtotal.
    #[error("payment {payment} does not cover subtotal {subtotal}")]
    InsufficientPayment {
        /// Amount tendered.
        payment: Price,
        /// Amount due.
        subtotal: Price,
    },

    /// No payment entered.
    #[error("payment must not be zero")]
    ZeroPayment,

    /// Payment below zero.
    #[error("payment must not be negative")]
    NegativePayment,

    /// Payment text is not a number.
    #[error("invalid payment amount: {0:?}")]
    InvalidPayment(String),

    /// Item id not present in the loaded catalog.
    #[error("item {0} is not in the catalog")]
    UnknownItem(ItemId),

    /// Page size of zero.
    #[error("page size must be at least 1")]
    InvalidPageSize,

    /// Cart is locked while sale lines are being recorded.
    #[error("a checkout is already in progress")]
    CheckoutInProgress,

    /// A checkout result arrived with no checkout in progress.
    #[error("no checkout is in progress")]
    NoCheckoutInFlight,
}

/// A reference no longer matches the controller's current contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Cart index out of range.
    #[error("cart line {index} does not exist (cart has {len} lines)")]
    StaleLine {
        /// Requested index.
        index: usize,
        /// Current number of lines.
        len: usize,
    },

    /// Line was already recorded by an earlier, partially failed checkout.
    #[error("cart line {index} is already recorded as sale {sale_no}")]
    LineSettled {
        /// Line index.
        index: usize,
        /// Sale number it was recorded under.
        sale_no: SaleNo,
    },

    /// Line was posted in the current batch and the backend may have stored
    /// it; its content is frozen until a checkout settles it.
    #[error("cart line {index} may already be recorded; check out again before changing it")]
    LineInDoubt {
        /// Line index.
        index: usize,
    },

    /// User id not in the currently loaded list.
    #[error("user {0} is not in the current list")]
    UnknownUser(UserId),

    /// Checkout report does not belong to the batch in progress.
    #[error("checkout report belongs to a different batch")]
    BatchMismatch,
}

/// Errors from cart line operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout refused before anything was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Report could not be applied to the cart.
    #[error(transparent)]
    State(#[from] StateError),

    /// Some lines were not recorded. Recorded lines stay marked in the cart;
    /// the rest can be retried under the same batch.
    #[error(
        "checkout incomplete: {} of {} lines not recorded",
        .0.failed.len(),
        .0.attempted()
    )]
    Partial(CheckoutReport),
}

/// Errors from the users page.
#[derive(Debug, Error)]
pub enum UsersError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    State(#[from] StateError),
}
