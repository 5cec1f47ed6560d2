//! The order being rung up at the register.
//!
//! A [`Cart`] holds one [`LineItem`] per distinct catalog item, in the order
//! items were first added. The subtotal is recomputed after every mutation,
//! never patched incrementally.
//!
//! Phases:
//!
//! ```text
//! Empty <-> Building -> Settling -> Empty     (every line recorded)
//!                                \-> Building (some lines failed)
//! ```
//!
//! While `Settling`, every mutation is refused with
//! [`ValidationError::CheckoutInProgress`], which keeps a second checkout from
//! racing the first.
//!
//! A line stays frozen once the backend may hold it: recorded lines for good,
//! and lines whose post failed without a definite answer until a later
//! checkout settles them under the same idempotency key.

mod checkout;

use tracing::debug;
use uuid::Uuid;

use techshack_core::{CatalogItem, ItemId, Price, SaleRecord};

use crate::error::{CartError, StateError, ValidationError};

pub use checkout::{
    CheckoutReport, CheckoutTicket, CompletedSale, FailedLine, RecordedLine, TicketLine, submit,
};

/// Where the cart is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CartPhase {
    /// No lines.
    #[default]
    Empty,
    /// Lines present, open for changes and payment entry.
    Building,
    /// Sale lines are being recorded; the cart is locked.
    Settling,
}

/// One distinct item in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    item: CatalogItem,
    quantity: u32,
    recorded: Option<SaleRecord>,
    /// Key of a post whose outcome is unknown.
    posted_key: Option<String>,
}

impl LineItem {
    const fn new(item: CatalogItem) -> Self {
        Self {
            item,
            quantity: 1,
            recorded: None,
            posted_key: None,
        }
    }

    /// The catalog entry.
    #[must_use]
    pub const fn item(&self) -> &CatalogItem {
        &self.item
    }

    /// Units of the item, always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.item.price.times(self.quantity)
    }

    /// The sale record, once the backend has stored this line.
    #[must_use]
    pub const fn recorded(&self) -> Option<&SaleRecord> {
        self.recorded.as_ref()
    }

    /// Whether the backend has stored this line.
    #[must_use]
    pub const fn is_recorded(&self) -> bool {
        self.recorded.is_some()
    }

    /// Whether this line was posted and the backend may have stored it
    /// without the register hearing back.
    #[must_use]
    pub const fn is_in_doubt(&self) -> bool {
        self.posted_key.is_some()
    }
}

/// In-memory order with running subtotal and tendered payment.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<LineItem>,
    subtotal: Price,
    payment: Price,
    phase: CartPhase,
    batch: Option<Uuid>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Number of distinct items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CartPhase {
        self.phase
    }

    /// Sum of all line totals.
    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.subtotal
    }

    /// Amount tendered.
    #[must_use]
    pub const fn payment(&self) -> Price {
        self.payment
    }

    /// Batch left over from a partially recorded checkout, reused by the next one.
    #[must_use]
    pub const fn pending_batch(&self) -> Option<Uuid> {
        self.batch
    }

    /// Add one unit of `item`: bumps the existing line for the same item id,
    /// otherwise appends a new line with quantity 1.
    ///
    /// Returns the index of the affected line.
    ///
    /// # Errors
    ///
    /// `CheckoutInProgress` while settling, `LineSettled` or `LineInDoubt` if
    /// the item's line was already posted.
    pub fn add_item(&mut self, item: CatalogItem) -> Result<usize, CartError> {
        self.ensure_editable()?;

        let index = match self.position(item.id) {
            Some(index) => {
                let line = self.editable_line(index)?;
                line.quantity = line.quantity.saturating_add(1);
                index
            }
            None => {
                debug!(item = %item.id, "Adding line");
                self.lines.push(LineItem::new(item));
                self.lines.len() - 1
            }
        };

        self.recompute();
        Ok(index)
    }

    /// Add one unit to the line at `index`.
    ///
    /// # Errors
    ///
    /// `StaleLine` for an index past the end (the cart is left unchanged),
    /// `LineSettled` for a recorded line, `LineInDoubt` for a line whose last
    /// post went unanswered, `CheckoutInProgress` while settling.
    pub fn increment_item(&mut self, index: usize) -> Result<(), CartError> {
        self.ensure_editable()?;
        let line = self.editable_line(index)?;
        line.quantity = line.quantity.saturating_add(1);
        self.recompute();
        Ok(())
    }

    /// Remove one unit from the line at `index`, dropping the line when its
    /// quantity would reach zero. Later lines shift down by one.
    ///
    /// # Errors
    ///
    /// Same as [`Cart::increment_item`].
    pub fn decrement_item(&mut self, index: usize) -> Result<(), CartError> {
        self.ensure_editable()?;
        let line = self.editable_line(index)?;
        if line.quantity > 1 {
            line.quantity -= 1;
        } else {
            let removed = self.lines.remove(index);
            debug!(item = %removed.item.id, "Removed line");
        }
        self.recompute();
        Ok(())
    }

    /// Sum of price × quantity over all lines; zero for an empty cart.
    #[must_use]
    pub fn compute_subtotal(&self) -> Price {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// Set the tendered amount.
    ///
    /// # Errors
    ///
    /// `NegativePayment` for amounts below zero, `CheckoutInProgress` while
    /// settling.
    pub fn set_payment(&mut self, amount: Price) -> Result<(), ValidationError> {
        self.ensure_editable()?;
        if amount.is_negative() {
            return Err(ValidationError::NegativePayment);
        }
        self.payment = amount;
        Ok(())
    }

    /// Set the tendered amount from operator text. Blank text clears it.
    ///
    /// # Errors
    ///
    /// `InvalidPayment` if the text is not a number, otherwise as
    /// [`Cart::set_payment`].
    pub fn parse_payment(&mut self, text: &str) -> Result<Price, ValidationError> {
        let amount = if text.trim().is_empty() {
            Price::ZERO
        } else {
            text.parse::<Price>()
                .map_err(|e| ValidationError::InvalidPayment(e.0))?
        };
        self.set_payment(amount)?;
        Ok(amount)
    }

    /// Whether the pay action should be enabled.
    #[must_use]
    pub fn can_pay(&self) -> bool {
        self.phase == CartPhase::Building
            && !self.payment.is_zero()
            && self.payment >= self.subtotal
    }

    /// Payment minus subtotal. Negative while the payment is short.
    #[must_use]
    pub fn change_due(&self) -> Price {
        self.payment - self.subtotal
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.lines.iter().position(|line| line.item.id == id)
    }

    const fn ensure_editable(&self) -> Result<(), ValidationError> {
        match self.phase {
            CartPhase::Settling => Err(ValidationError::CheckoutInProgress),
            CartPhase::Empty | CartPhase::Building => Ok(()),
        }
    }

    fn editable_line(&mut self, index: usize) -> Result<&mut LineItem, StateError> {
        let len = self.lines.len();
        let line = self
            .lines
            .get_mut(index)
            .ok_or(StateError::StaleLine { index, len })?;
        if let Some(record) = &line.recorded {
            return Err(StateError::LineSettled {
                index,
                sale_no: record.sale_no,
            });
        }
        if line.posted_key.is_some() {
            return Err(StateError::LineInDoubt { index });
        }
        Ok(line)
    }

    /// Refresh derived state after any change to `lines`.
    fn recompute(&mut self) {
        self.subtotal = self.compute_subtotal();
        if self.phase != CartPhase::Settling {
            self.phase = if self.lines.is_empty() {
                CartPhase::Empty
            } else {
                CartPhase::Building
            };
        }
        // Recorded lines cannot be removed, so an empty cart has nothing left
        // in any earlier batch.
        if self.lines.is_empty() {
            self.batch = None;
        }
    }
}
