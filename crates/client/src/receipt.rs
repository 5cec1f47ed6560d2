//! Plain-text receipt.

use std::fmt;

use chrono::NaiveDate;

use techshack_core::Price;

use crate::cart::{Cart, CompletedSale, LineItem};

/// Printed width of a receipt.
const WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub description: String,
    pub price: Price,
    pub quantity: u32,
    pub total: Price,
}

impl From<&LineItem> for ReceiptLine {
    fn from(line: &LineItem) -> Self {
        Self {
            description: line.item().description.clone(),
            price: line.item().price,
            quantity: line.quantity(),
            total: line.line_total(),
        }
    }
}

/// Everything printed on a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub store_name: String,
    pub date: NaiveDate,
    pub cashier: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Price,
    pub payment: Price,
    pub change: Price,
}

impl Receipt {
    /// Receipt for a completed sale.
    #[must_use]
    pub fn from_sale(sale: &CompletedSale, store_name: &str, date: NaiveDate) -> Self {
        Self {
            store_name: store_name.to_string(),
            date,
            cashier: sale.cashier.clone(),
            lines: sale.lines.iter().map(ReceiptLine::from).collect(),
            subtotal: sale.subtotal,
            payment: sale.payment,
            change: sale.change,
        }
    }

    /// Running receipt for a cart still being built.
    #[must_use]
    pub fn preview(cart: &Cart, cashier: &str, store_name: &str, date: NaiveDate) -> Self {
        Self {
            store_name: store_name.to_string(),
            date,
            cashier: cashier.to_string(),
            lines: cart.lines().iter().map(ReceiptLine::from).collect(),
            subtotal: cart.subtotal(),
            payment: cart.payment(),
            change: cart.change_due(),
        }
    }
}

/// Left and right text on one row, padded to the receipt width.
fn row(f: &mut fmt::Formatter<'_>, left: &str, right: &str) -> fmt::Result {
    let used = left.chars().count() + right.chars().count();
    let gap = WIDTH.saturating_sub(used).max(1);
    writeln!(f, "{left}{:gap$}{right}", "")
}

fn centered(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "{text:^WIDTH$}")
}

fn right(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    writeln!(f, "{text:>WIDTH$}")
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(WIDTH);

        centered(f, &self.store_name)?;
        centered(f, "Receipt")?;
        centered(f, &format!("date: {}", self.date.format("%m/%d/%Y")))?;
        centered(f, &format!("cashier: {}", self.cashier))?;
        writeln!(f, "{rule}")?;
        row(f, "Item", "Price | QTY | Total")?;
        writeln!(f, "{rule}")?;
        for line in &self.lines {
            row(
                f,
                &line.description,
                &format!("{} x {} = {}", line.price, line.quantity, line.total),
            )?;
        }
        writeln!(f, "{rule}")?;
        right(f, &format!("subtotal: P {}", self.subtotal))?;
        right(f, &format!("payment: P {}", self.payment))?;
        right(f, &format!("change: P {}", self.change))
    }
}
