//! Sale records written at checkout.
//!
//! One record is persisted per cart line. The backend owns the table:
//!
//! | column     | type                 | notes                          |
//! |------------|----------------------|--------------------------------|
//! | `sale_no`  | integer, primary key | auto-increment from 1000       |
//! | `cashier`  | text, not null       |                                |
//! | `item`     | text, not null       | item description at sale time  |
//! | `quantity` | integer, not null    |                                |
//! | `price`    | double, not null     | unit price                     |
//! | `date`     | timestamp, not null  | creation time, never updated   |
//!
//! The DDL lives in `migrations/20240301000000_create_sale.sql` at the crate
//! root; with the `postgres` feature, [`SaleRow`] is that table's row shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Price, SaleNo};

/// First `sale_no` the backend hands out.
pub const FIRST_SALE_NO: SaleNo = SaleNo::new(1000);

/// Payload posted for one cart line at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineInput {
    /// Name of the cashier ringing up the sale.
    pub cashier: String,
    /// Item description.
    pub item: String,
    /// Units sold.
    pub quantity: u32,
    /// Unit price.
    pub price: Price,
    /// Dedup key sent alongside the payload (as a header, not in the body).
    ///
    /// Stable across retries of the same line of the same checkout batch.
    #[serde(skip)]
    pub idempotency_key: String,
}

/// A persisted sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Auto-incremented key.
    pub sale_no: SaleNo,
    /// Cashier name.
    pub cashier: String,
    /// Item description.
    pub item: String,
    /// Units sold.
    pub quantity: u32,
    /// Unit price.
    pub price: Price,
    /// When the record was created.
    pub date: DateTime<Utc>,
}

impl SaleRecord {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[cfg(feature = "postgres")]
pub use row::{SaleRow, SaleRowError};

#[cfg(feature = "postgres")]
mod row {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use thiserror::Error;

    use super::SaleRecord;
    use crate::types::{Price, SaleNo};

    /// Raw `sale` row as stored in `PostgreSQL`.
    #[derive(Debug, sqlx::FromRow)]
    pub struct SaleRow {
        /// `sale_no` column.
        pub sale_no: SaleNo,
        /// `cashier` column.
        pub cashier: String,
        /// `item` column.
        pub item: String,
        /// `quantity` column.
        pub quantity: i32,
        /// `price` column.
        pub price: f64,
        /// `date` column.
        pub date: DateTime<Utc>,
    }

    /// A stored row that cannot be represented as a [`SaleRecord`].
    #[derive(Debug, Error)]
    pub enum SaleRowError {
        /// Quantity below zero.
        #[error("sale {0} has negative quantity {1}")]
        NegativeQuantity(SaleNo, i32),

        /// Price is NaN or infinite.
        #[error("sale {0} has non-finite price")]
        NonFinitePrice(SaleNo),
    }

    impl TryFrom<SaleRow> for SaleRecord {
        type Error = SaleRowError;

        fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
            let quantity = u32::try_from(row.quantity)
                .map_err(|_| SaleRowError::NegativeQuantity(row.sale_no, row.quantity))?;
            let price = Decimal::try_from(row.price)
                .map_err(|_| SaleRowError::NonFinitePrice(row.sale_no))?;

            Ok(Self {
                sale_no: row.sale_no,
                cashier: row.cashier,
                item: row.item,
                quantity,
                price: Price::new(price),
                date: row.date,
            })
        }
    }

}
