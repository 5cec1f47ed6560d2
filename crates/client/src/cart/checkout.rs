//! Turning a cart into recorded sales.
//!
//! Checkout happens in three steps so the cart is never borrowed across an
//! await:
//!
//! 1. [`Cart::begin_checkout`] validates payment, locks the cart and hands
//!    out a [`CheckoutTicket`].
//! 2. [`submit`] posts each ticket line to the backend on its own and
//!    collects a [`CheckoutReport`].
//! 3. [`Cart::finish_checkout`] applies the report: a fully recorded sale
//!    empties the cart, anything less leaves the unrecorded lines in place
//!    for a retry under the same batch.

use std::mem;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use techshack_core::{ItemId, Price, SaleLineInput, SaleRecord};

use super::{Cart, CartPhase, LineItem};
use crate::backend::{BackendError, PosBackend};
use crate::error::{CheckoutError, StateError, ValidationError};

/// One line to post, with its position in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketLine {
    /// Cart index of the line.
    pub index: usize,
    /// Payload for `record_sale`.
    pub input: SaleLineInput,
}

/// Snapshot of a locked cart, ready to submit.
#[derive(Debug, Clone)]
pub struct CheckoutTicket {
    batch_id: Uuid,
    cashier: String,
    lines: Vec<TicketLine>,
    subtotal: Price,
    payment: Price,
    change: Price,
}

impl CheckoutTicket {
    /// Batch shared by every line of this sale, across retries.
    #[must_use]
    pub const fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Cashier ringing up the sale.
    #[must_use]
    pub fn cashier(&self) -> &str {
        &self.cashier
    }

    /// Lines not yet recorded.
    #[must_use]
    pub fn lines(&self) -> &[TicketLine] {
        &self.lines
    }

    #[must_use]
    pub const fn subtotal(&self) -> Price {
        self.subtotal
    }

    #[must_use]
    pub const fn payment(&self) -> Price {
        self.payment
    }

    #[must_use]
    pub const fn change(&self) -> Price {
        self.change
    }
}

/// A line the backend stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLine {
    pub index: usize,
    pub record: SaleRecord,
}

/// A line the backend did not store.
#[derive(Debug)]
pub struct FailedLine {
    pub index: usize,
    /// Item description, for the operator.
    pub item: String,
    pub error: BackendError,
}

/// Outcome of submitting a ticket.
#[derive(Debug)]
pub struct CheckoutReport {
    pub batch_id: Uuid,
    pub cashier: String,
    pub recorded: Vec<RecordedLine>,
    pub failed: Vec<FailedLine>,
}

impl CheckoutReport {
    /// Lines posted in this attempt.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.recorded.len() + self.failed.len()
    }

    /// Whether every posted line was stored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A sale whose every line has been recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSale {
    pub batch_id: Uuid,
    pub cashier: String,
    /// The cart's lines at the moment payment cleared, each carrying its record.
    pub lines: Vec<LineItem>,
    pub subtotal: Price,
    pub payment: Price,
    pub change: Price,
}

impl CompletedSale {
    /// Stored sale records, in cart order.
    pub fn records(&self) -> impl Iterator<Item = &SaleRecord> {
        self.lines.iter().filter_map(LineItem::recorded)
    }
}

/// Dedup key for one line. Only lines the backend definitely did not store
/// can change between attempts, and a changed line is a different sale line.
fn idempotency_key(batch_id: Uuid, item: &ItemId, quantity: u32) -> String {
    format!("{batch_id}:{item}:{quantity}")
}

impl Cart {
    /// Validate payment and lock the cart for checkout.
    ///
    /// Reuses the pending batch if an earlier checkout was only partly
    /// recorded; only the unrecorded lines go on the ticket. Every ticket line
    /// is frozen under its key until the report shows it was not stored.
    ///
    /// # Errors
    ///
    /// `CheckoutInProgress`, `EmptyCart`, `ZeroPayment` or
    /// `InsufficientPayment`. The cart is unchanged on error.
    pub fn begin_checkout(&mut self, cashier: &str) -> Result<CheckoutTicket, ValidationError> {
        self.ensure_editable()?;
        if self.lines.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        if self.payment.is_zero() {
            return Err(ValidationError::ZeroPayment);
        }
        if self.payment < self.subtotal {
            return Err(ValidationError::InsufficientPayment {
                payment: self.payment,
                subtotal: self.subtotal,
            });
        }

        let batch_id = *self.batch.get_or_insert_with(Uuid::new_v4);
        let mut lines = Vec::new();
        for (index, line) in self.lines.iter_mut().enumerate() {
            if line.is_recorded() {
                continue;
            }
            let key = match &line.posted_key {
                Some(key) => key.clone(),
                None => idempotency_key(batch_id, &line.item.id, line.quantity),
            };
            line.posted_key = Some(key.clone());
            lines.push(TicketLine {
                index,
                input: SaleLineInput {
                    cashier: cashier.to_string(),
                    item: line.item.description.clone(),
                    quantity: line.quantity,
                    price: line.item.price,
                    idempotency_key: key,
                },
            });
        }

        self.phase = CartPhase::Settling;
        info!(
            %batch_id,
            lines = lines.len(),
            subtotal = %self.subtotal,
            payment = %self.payment,
            "Checkout started"
        );

        Ok(CheckoutTicket {
            batch_id,
            cashier: cashier.to_string(),
            lines,
            subtotal: self.subtotal,
            payment: self.payment,
            change: self.change_due(),
        })
    }

    /// Apply a submission report to the locked cart.
    ///
    /// # Errors
    ///
    /// - `NoCheckoutInFlight` if the cart is not settling
    /// - `BatchMismatch` or `StaleLine` if the report does not fit this cart;
    ///   the cart stays locked, see [`Cart::abort_checkout`]
    /// - `Partial` if any line was not recorded; recorded lines are marked,
    ///   failed lines the backend may still hold stay frozen, and the cart
    ///   reopens with the batch kept for a retry
    pub fn finish_checkout(
        &mut self,
        report: CheckoutReport,
    ) -> Result<CompletedSale, CheckoutError> {
        if self.phase != CartPhase::Settling {
            return Err(ValidationError::NoCheckoutInFlight.into());
        }
        if self.batch != Some(report.batch_id) {
            return Err(StateError::BatchMismatch.into());
        }
        let len = self.lines.len();
        let mut indices = report
            .recorded
            .iter()
            .map(|r| r.index)
            .chain(report.failed.iter().map(|f| f.index));
        if let Some(index) = indices.find(|&index| index >= len) {
            return Err(StateError::StaleLine { index, len }.into());
        }

        for RecordedLine { index, record } in &report.recorded {
            if let Some(line) = self.lines.get_mut(*index) {
                line.recorded = Some(record.clone());
                line.posted_key = None;
            }
        }
        for FailedLine { index, error, .. } in &report.failed {
            if error.may_have_applied() {
                continue;
            }
            if let Some(line) = self.lines.get_mut(*index) {
                line.posted_key = None;
            }
        }

        if !self.lines.iter().all(LineItem::is_recorded) {
            self.phase = CartPhase::Building;
            warn!(
                batch_id = %report.batch_id,
                recorded = report.recorded.len(),
                failed = report.failed.len(),
                "Checkout incomplete, unrecorded lines kept for retry"
            );
            return Err(CheckoutError::Partial(report));
        }

        let sale = CompletedSale {
            batch_id: report.batch_id,
            cashier: report.cashier,
            lines: mem::take(&mut self.lines),
            subtotal: self.subtotal,
            payment: self.payment,
            change: self.change_due(),
        };
        self.payment = Price::ZERO;
        self.phase = CartPhase::Empty;
        self.recompute();

        info!(
            batch_id = %sale.batch_id,
            lines = sale.lines.len(),
            change = %sale.change,
            "Checkout complete"
        );
        Ok(sale)
    }

    /// Unlock a cart whose submission was abandoned. The batch is kept and
    /// every line of the abandoned ticket stays frozen under its key, so lines
    /// that did reach the backend are deduplicated on the next attempt.
    ///
    /// # Errors
    ///
    /// `NoCheckoutInFlight` if the cart is not settling.
    pub fn abort_checkout(&mut self) -> Result<(), ValidationError> {
        if self.phase != CartPhase::Settling {
            return Err(ValidationError::NoCheckoutInFlight);
        }
        self.phase = CartPhase::Building;
        warn!(batch_id = ?self.batch, "Checkout abandoned");
        Ok(())
    }
}

/// Post every ticket line, one request per line, in cart order.
///
/// A failed line does not stop the rest; nothing is rolled back.
#[instrument(skip_all, fields(batch_id = %ticket.batch_id, lines = ticket.lines.len()))]
pub async fn submit<B>(ticket: &CheckoutTicket, backend: &B) -> CheckoutReport
where
    B: PosBackend + ?Sized,
{
    let mut recorded = Vec::with_capacity(ticket.lines.len());
    let mut failed = Vec::new();

    for line in &ticket.lines {
        match backend.record_sale(&line.input).await {
            Ok(record) => recorded.push(RecordedLine {
                index: line.index,
                record,
            }),
            Err(error) => {
                warn!(
                    index = line.index,
                    item = %line.input.item,
                    error = %error,
                    "Sale line not recorded"
                );
                failed.push(FailedLine {
                    index: line.index,
                    item: line.input.item.clone(),
                    error,
                });
            }
        }
    }

    CheckoutReport {
        batch_id: ticket.batch_id,
        cashier: ticket.cashier.clone(),
        recorded,
        failed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};

    use chrono::Utc;

    use techshack_core::{CatalogItem, FIRST_SALE_NO, ItemId, SaleNo};

    use super::*;
    use crate::backend::MockPosBackend;
    use crate::error::CartError;

    fn item(id: i32, description: &str, cents: i64) -> CatalogItem {
        CatalogItem::new(ItemId::new(id), description, Price::from_cents(cents))
    }

    fn record_for(line: &SaleLineInput, sale_no: i32) -> SaleRecord {
        SaleRecord {
            sale_no: SaleNo::new(sale_no),
            cashier: line.cashier.clone(),
            item: line.item.clone(),
            quantity: line.quantity,
            price: line.price,
            date: Utc::now(),
        }
    }

    /// Backend that stores every line except those for `failing_item`.
    fn backend_failing_on(failing_item: Option<&'static str>) -> MockPosBackend {
        let next = Arc::new(AtomicI32::new(FIRST_SALE_NO.as_i32()));
        let mut backend = MockPosBackend::new();
        backend.expect_record_sale().returning(move |line| {
            if Some(line.item.as_str()) == failing_item {
                Err(BackendError::Timeout)
            } else {
                Ok(record_for(line, next.fetch_add(1, Ordering::SeqCst)))
            }
        });
        backend
    }

    fn two_line_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(item(1, "Keyboard", 2_999)).unwrap();
        cart.add_item(item(2, "Mouse", 1_550)).unwrap();
        cart.add_item(item(2, "Mouse", 1_550)).unwrap();
        cart
    }

    #[test]
    fn test_short_payment_rejected_and_cart_unchanged() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(5_000)).unwrap();

        let err = cart.begin_checkout("alice").unwrap_err();

        assert_eq!(
            err,
            ValidationError::InsufficientPayment {
                payment: Price::from_cents(5_000),
                subtotal: Price::from_cents(6_099),
            }
        );
        assert_eq!(cart.phase(), CartPhase::Building);
        assert_eq!(cart.len(), 2);
        assert!(cart.pending_batch().is_none());
    }

    #[test]
    fn test_empty_and_zero_payment_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.begin_checkout("alice").unwrap_err(),
            ValidationError::EmptyCart
        );

        cart.add_item(item(9, "Sticker", 0)).unwrap();
        assert_eq!(
            cart.begin_checkout("alice").unwrap_err(),
            ValidationError::ZeroPayment
        );
    }

    #[test]
    fn test_ticket_snapshots_lines_with_batch_keys() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();

        let ticket = cart.begin_checkout("alice").unwrap();
        let batch = ticket.batch_id();

        assert_eq!(ticket.lines().len(), 2);
        assert_eq!(ticket.change(), Price::from_cents(901));
        let mouse = &ticket.lines()[1].input;
        assert_eq!(mouse.cashier, "alice");
        assert_eq!(mouse.item, "Mouse");
        assert_eq!(mouse.quantity, 2);
        assert_eq!(mouse.price, Price::from_cents(1_550));
        assert_eq!(mouse.idempotency_key, format!("{batch}:2:2"));
    }

    #[test]
    fn test_cart_locked_while_settling() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();
        cart.begin_checkout("alice").unwrap();

        assert_eq!(cart.phase(), CartPhase::Settling);
        assert!(!cart.can_pay());
        assert_eq!(
            cart.begin_checkout("alice").unwrap_err(),
            ValidationError::CheckoutInProgress
        );
        assert_eq!(
            cart.add_item(item(3, "Monitor", 15_000)).unwrap_err(),
            CartError::Validation(ValidationError::CheckoutInProgress)
        );
        assert_eq!(
            cart.set_payment(Price::from_cents(1)),
            Err(ValidationError::CheckoutInProgress)
        );
    }

    #[tokio::test]
    async fn test_full_checkout_empties_cart() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();
        let backend = backend_failing_on(None);

        let ticket = cart.begin_checkout("alice").unwrap();
        let report = submit(&ticket, &backend).await;
        assert!(report.is_complete());
        let sale = cart.finish_checkout(report).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.phase(), CartPhase::Empty);
        assert_eq!(cart.payment(), Price::ZERO);
        assert_eq!(cart.subtotal(), Price::ZERO);
        assert!(cart.pending_batch().is_none());

        assert_eq!(sale.change, Price::from_cents(901));
        assert_eq!(sale.lines.len(), 2);
        let sale_nos: Vec<i32> = sale.records().map(|r| r.sale_no.as_i32()).collect();
        assert_eq!(sale_nos, vec![1000, 1001]);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_unrecorded_lines() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();
        let backend = backend_failing_on(Some("Mouse"));

        let ticket = cart.begin_checkout("alice").unwrap();
        let first_key = ticket.lines()[1].input.idempotency_key.clone();
        let report = submit(&ticket, &backend).await;
        let report = match cart.finish_checkout(report) {
            Err(CheckoutError::Partial(report)) => report,
            other => panic!("expected partial checkout, got {other:?}"),
        };
        assert_eq!(report.recorded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].item, "Mouse");

        // Whole sale still on screen; only the keyboard is locked.
        assert_eq!(cart.phase(), CartPhase::Building);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal(), Price::from_cents(6_099));
        assert_eq!(cart.payment(), Price::from_cents(7_000));
        assert!(cart.lines()[0].is_recorded());
        assert!(!cart.lines()[1].is_recorded());
        assert!(matches!(
            cart.increment_item(0),
            Err(CartError::State(StateError::LineSettled { index: 0, .. }))
        ));

        // Retry sends only the mouse, under the same key.
        let retry = cart.begin_checkout("alice").unwrap();
        assert_eq!(retry.batch_id(), ticket.batch_id());
        assert_eq!(retry.lines().len(), 1);
        assert_eq!(retry.lines()[0].index, 1);
        assert_eq!(retry.lines()[0].input.idempotency_key, first_key);
    }

    #[tokio::test]
    async fn test_retry_after_partial_failure_completes() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();

        let ticket = cart.begin_checkout("alice").unwrap();
        let report = submit(&ticket, &backend_failing_on(Some("Mouse"))).await;
        assert!(cart.finish_checkout(report).is_err());

        let retry = cart.begin_checkout("alice").unwrap();
        let report = submit(&retry, &backend_failing_on(None)).await;
        let sale = cart.finish_checkout(report).unwrap();

        assert_eq!(sale.records().count(), 2);
        assert_eq!(sale.batch_id, ticket.batch_id());
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_report_from_other_batch_rejected() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();
        cart.begin_checkout("alice").unwrap();

        let stray = CheckoutReport {
            batch_id: Uuid::new_v4(),
            cashier: "alice".to_string(),
            recorded: Vec::new(),
            failed: Vec::new(),
        };

        assert!(matches!(
            cart.finish_checkout(stray),
            Err(CheckoutError::State(StateError::BatchMismatch))
        ));
        assert_eq!(cart.phase(), CartPhase::Settling);
    }

    #[test]
    fn test_abort_reopens_cart_and_keeps_batch() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();
        assert_eq!(cart.abort_checkout(), Err(ValidationError::NoCheckoutInFlight));

        let ticket = cart.begin_checkout("alice").unwrap();
        cart.abort_checkout().unwrap();

        assert_eq!(cart.phase(), CartPhase::Building);
        assert_eq!(cart.pending_batch(), Some(ticket.batch_id()));

        // Either post may have gone out, so both lines keep their keys.
        assert!(cart.lines().iter().all(LineItem::is_in_doubt));
        assert_eq!(
            cart.decrement_item(1).unwrap_err(),
            CartError::State(StateError::LineInDoubt { index: 1 })
        );
        let retry = cart.begin_checkout("alice").unwrap();
        assert_eq!(retry.lines(), ticket.lines());
    }

    #[tokio::test]
    async fn test_unanswered_line_is_frozen_until_recorded() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();

        let ticket = cart.begin_checkout("alice").unwrap();
        let report = submit(&ticket, &backend_failing_on(Some("Mouse"))).await;
        assert!(cart.finish_checkout(report).is_err());

        assert!(cart.lines()[1].is_in_doubt());
        assert_eq!(
            cart.increment_item(1).unwrap_err(),
            CartError::State(StateError::LineInDoubt { index: 1 })
        );
        assert!(cart.add_item(item(2, "Mouse", 1_550)).is_err());
        assert_eq!(cart.lines()[1].quantity(), 2);

        let retry = cart.begin_checkout("alice").unwrap();
        let report = submit(&retry, &backend_failing_on(None)).await;
        let sale = cart.finish_checkout(report).unwrap();
        assert!(sale.lines.iter().all(|line| !line.is_in_doubt()));
    }

    #[tokio::test]
    async fn test_rejected_line_stays_editable() {
        let mut cart = two_line_cart();
        cart.set_payment(Price::from_cents(7_000)).unwrap();
        let mut backend = MockPosBackend::new();
        backend.expect_record_sale().returning(|line| {
            if line.item == "Mouse" {
                Err(BackendError::Status {
                    status: 422,
                    body: "quantity exceeds stock".to_string(),
                })
            } else {
                Ok(record_for(line, 1000))
            }
        });

        let ticket = cart.begin_checkout("alice").unwrap();
        let report = submit(&ticket, &backend).await;
        assert!(cart.finish_checkout(report).is_err());

        assert!(!cart.lines()[1].is_in_doubt());
        cart.decrement_item(1).unwrap();
        let retry = cart.begin_checkout("alice").unwrap();
        assert_eq!(
            retry.lines()[0].input.idempotency_key,
            format!("{}:2:1", ticket.batch_id())
        );
    }

    #[test]
    fn test_finish_without_checkout_rejected() {
        let mut cart = two_line_cart();
        let report = CheckoutReport {
            batch_id: Uuid::new_v4(),
            cashier: "alice".to_string(),
            recorded: Vec::new(),
            failed: Vec::new(),
        };

        assert!(matches!(
            cart.finish_checkout(report),
            Err(CheckoutError::Validation(
                ValidationError::NoCheckoutInFlight
            ))
        ));
    }
}
