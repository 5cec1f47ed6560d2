//! List the items currently in stock.

use tracing::info;

use techshack_client::{HttpBackend, PosBackend};

use super::CliError;

/// Print the in-stock catalog.
#[allow(clippy::print_stdout)]
pub async fn list(backend: &HttpBackend) -> Result<(), CliError> {
    let items = backend.fetch_catalog().await?;
    info!(count = items.len(), "Catalog fetched");

    println!("{:>6}  {:<30} {:>10}", "ID", "Description", "Price");
    for item in &items {
        println!("{:>6}  {:<30} {:>10}", item.id, item.description, item.price);
    }
    Ok(())
}
