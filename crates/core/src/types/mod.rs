//! Core types for the TechShack register.
//!
//! Type-safe wrappers and wire records shared by the client and its tests.

pub mod catalog;
pub mod id;
pub mod price;
pub mod sale;
pub mod user;

pub use catalog::CatalogItem;
pub use id::*;
pub use price::{Price, PriceParseError};
pub use sale::{FIRST_SALE_NO, SaleLineInput, SaleRecord};
#[cfg(feature = "postgres")]
pub use sale::{SaleRow, SaleRowError};
pub use user::{NewUser, UserRecord};
