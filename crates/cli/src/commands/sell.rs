//! Ring up a sale and print the receipt.
//!
//! ```bash
//! pos-cli sell --cashier alice --item 2 --item 1 --item 2 --payment 100
//! ```
//!
//! Each `--item` adds one unit, so repeating an id raises its quantity.

use chrono::Local;
use tracing::{info, warn};

use techshack_client::{CheckoutError, ClientConfig, HttpBackend, Receipt, Register};
use techshack_core::ItemId;

use super::CliError;

/// Options for one sale.
#[derive(Debug)]
pub struct SaleArgs {
    pub cashier: String,
    pub items: Vec<i32>,
    pub payment: String,
    /// Checkout attempts, counting the first.
    pub attempts: u32,
}

/// Ring up `args.items`, check out, and print the receipt.
///
/// A partially recorded checkout is retried under the same batch, so lines
/// that already went through are not recorded twice.
#[allow(clippy::print_stdout)]
pub async fn run(
    config: &ClientConfig,
    backend: HttpBackend,
    args: SaleArgs,
) -> Result<(), CliError> {
    let mut register = Register::new(backend, args.cashier);
    register.load_catalog().await?;

    for id in args.items {
        register.select_item(ItemId::new(id))?;
    }
    register.cart_mut().parse_payment(&args.payment)?;

    info!(
        lines = register.cart().len(),
        subtotal = %register.cart().subtotal(),
        payment = %register.cart().payment(),
        "Cart ready"
    );

    let mut attempt = 1;
    let sale = loop {
        match register.checkout().await {
            Ok(sale) => break sale,
            Err(CheckoutError::Partial(report)) if attempt < args.attempts => {
                for failed in &report.failed {
                    warn!(item = %failed.item, error = %failed.error, "Line not recorded");
                }
                warn!(attempt, "Retrying unrecorded lines");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };

    let receipt = Receipt::from_sale(&sale, &config.store_name, Local::now().date_naive());
    println!("{receipt}");
    Ok(())
}
