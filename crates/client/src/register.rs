//! The sale screen: catalog, cart and checkout for one cashier.

use tracing::{info, instrument};

use techshack_core::{CatalogItem, ItemId};

use crate::backend::{BackendError, PosBackend};
use crate::cart::{Cart, CompletedSale, submit};
use crate::error::{CartError, CheckoutError, ValidationError};

/// A register session.
#[derive(Debug)]
pub struct Register<B> {
    backend: B,
    cashier: String,
    catalog: Vec<CatalogItem>,
    cart: Cart,
}

impl<B: PosBackend> Register<B> {
    pub fn new(backend: B, cashier: impl Into<String>) -> Self {
        Self {
            backend,
            cashier: cashier.into(),
            catalog: Vec::new(),
            cart: Cart::new(),
        }
    }

    /// Fetch the in-stock items. Done once per session.
    ///
    /// # Errors
    ///
    /// Backend failures; the previous catalog is kept.
    #[instrument(skip(self), fields(cashier = %self.cashier))]
    pub async fn load_catalog(&mut self) -> Result<&[CatalogItem], BackendError> {
        self.catalog = self.backend.fetch_catalog().await?;
        info!(count = self.catalog.len(), "Catalog loaded");
        Ok(&self.catalog)
    }

    pub fn cashier(&self) -> &str {
        &self.cashier
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// For quantity changes and payment entry.
    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Add one unit of a catalog item to the cart.
    ///
    /// # Errors
    ///
    /// `UnknownItem` if `id` is not in the catalog, otherwise as
    /// [`Cart::add_item`].
    pub fn select_item(&mut self, id: ItemId) -> Result<usize, CartError> {
        let item = self
            .catalog
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or(ValidationError::UnknownItem(id))?;
        self.cart.add_item(item)
    }

    /// Record every unrecorded cart line and, if all succeed, clear the cart.
    ///
    /// If this future is dropped before it completes the cart stays locked;
    /// call [`Cart::abort_checkout`] to reopen it.
    ///
    /// # Errors
    ///
    /// See [`Cart::begin_checkout`] and [`Cart::finish_checkout`].
    #[instrument(skip(self), fields(cashier = %self.cashier))]
    pub async fn checkout(&mut self) -> Result<CompletedSale, CheckoutError> {
        let ticket = self.cart.begin_checkout(&self.cashier)?;
        let report = submit(&ticket, &self.backend).await;
        self.cart.finish_checkout(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use techshack_core::{Price, SaleNo, SaleRecord};

    use super::*;
    use crate::backend::MockPosBackend;
    use crate::cart::CartPhase;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new(ItemId::new(1), "Keyboard", Price::from_cents(2_999)),
            CatalogItem::new(ItemId::new(2), "Mouse", Price::from_cents(1_550)),
        ]
    }

    #[tokio::test]
    async fn test_select_unknown_item() {
        let mut backend = MockPosBackend::new();
        backend.expect_fetch_catalog().returning(|| Ok(catalog()));
        let mut register = Register::new(backend, "alice");
        register.load_catalog().await.unwrap();

        assert_eq!(
            register.select_item(ItemId::new(99)).unwrap_err(),
            CartError::Validation(ValidationError::UnknownItem(ItemId::new(99)))
        );
        assert!(register.cart().is_empty());
    }

    #[tokio::test]
    async fn test_ring_up_and_checkout() {
        let mut backend = MockPosBackend::new();
        backend.expect_fetch_catalog().times(1).returning(|| Ok(catalog()));
        backend
            .expect_record_sale()
            .times(2)
            .returning(|line| {
                Ok(SaleRecord {
                    sale_no: SaleNo::new(1000),
                    cashier: line.cashier.clone(),
                    item: line.item.clone(),
                    quantity: line.quantity,
                    price: line.price,
                    date: Utc::now(),
                })
            });

        let mut register = Register::new(backend, "alice");
        assert_eq!(register.load_catalog().await.unwrap().len(), 2);

        register.select_item(ItemId::new(2)).unwrap();
        register.select_item(ItemId::new(1)).unwrap();
        register.select_item(ItemId::new(2)).unwrap();
        register.cart_mut().parse_payment("100").unwrap();
        assert!(register.cart().can_pay());

        let sale = register.checkout().await.unwrap();

        assert_eq!(sale.cashier, "alice");
        assert_eq!(sale.subtotal, Price::from_cents(6_099));
        assert_eq!(sale.change, Price::from_cents(3_901));
        assert_eq!(register.cart().phase(), CartPhase::Empty);
    }

    #[tokio::test]
    async fn test_checkout_rejected_without_payment() {
        let mut backend = MockPosBackend::new();
        backend.expect_fetch_catalog().returning(|| Ok(catalog()));
        backend.expect_record_sale().never();

        let mut register = Register::new(backend, "alice");
        register.load_catalog().await.unwrap();
        register.select_item(ItemId::new(1)).unwrap();

        assert!(matches!(
            register.checkout().await,
            Err(CheckoutError::Validation(ValidationError::ZeroPayment))
        ));
        assert_eq!(register.cart().len(), 1);
    }
}
