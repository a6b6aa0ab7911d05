//! Cart commands.
//!
//! Each invocation opens the store from local storage, runs one operation,
//! prints the notification the user would have seen, and prints the cart.
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_API_URL` - Catalog/stock API base URL
//! - `ROCKETSHOES_STORAGE_PATH` - Local storage file

use std::fmt::Write as _;
use std::sync::Arc;

use rocketshoes_cart::{
    CachedCatalog, CartConfig, CartStore, CatalogError, ChannelNotifier, FileStorage, LoadReport,
    Notification, UpdateProductAmount,
};
use rocketshoes_core::{Cart, ProductId};
use thiserror::Error;

/// Errors that stop a command before it reaches the cart.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The catalog client could not be created.
    #[error("Catalog client error: {0}")]
    Catalog(#[from] CatalogError),
}

/// A single cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCommand {
    Add(ProductId),
    Remove(ProductId),
    Update { product_id: ProductId, amount: i64 },
    Show,
}

/// Run a cart command.
///
/// # Returns
///
/// `false` if the operation ended in an error notification.
pub async fn run(command: CartCommand, config: &CartConfig) -> Result<bool, CommandError> {
    let catalog = CachedCatalog::new(
        rocketshoes_cart::HttpCatalog::new(&config.catalog)?,
        config.catalog.product_cache_ttl,
    );
    let storage = Arc::new(FileStorage::new(&config.storage.path));
    let notifier = ChannelNotifier::default();
    let mut notifications = notifier.subscribe();

    let store = CartStore::open(catalog, storage, Arc::new(notifier), &config.storage.key);

    if let LoadReport::Discarded { reason } = store.load_report() {
        tracing::warn!(
            path = %config.storage.path.display(),
            "Stored cart could not be read and was reset: {reason}"
        );
    }

    match command {
        CartCommand::Add(product_id) => store.add_product(product_id).await,
        CartCommand::Remove(product_id) => store.remove_product(product_id).await,
        CartCommand::Update { product_id, amount } => {
            store
                .update_product_amount(UpdateProductAmount { product_id, amount })
                .await;
        }
        CartCommand::Show => {}
    }

    let notification = notifications.try_recv().ok();
    let succeeded = notification
        .as_ref()
        .is_none_or(|n| !n.severity.is_error());

    #[allow(clippy::print_stdout)]
    {
        if let Some(notification) = &notification {
            println!("{}", render_notification(notification));
        }
        print!("{}", render_cart(&store.cart()));
    }

    Ok(succeeded)
}

/// One-line form of a notification, e.g. `[success] Produto adicionado com sucesso!`.
fn render_notification(notification: &Notification) -> String {
    format!(
        "[{}] {}",
        notification.severity.as_str(),
        notification.message
    )
}

/// Table of line-items followed by the cart total.
fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<40} {:>5} {:>14} {:>14}",
        "ID", "PRODUCT", "QTY", "PRICE", "SUBTOTAL"
    );
    for item in cart {
        let _ = writeln!(
            out,
            "{:<6} {:<40} {:>5} {:>14} {:>14}",
            item.id(),
            truncate(&item.product.name, 40),
            item.amount,
            item.product.price.display(),
            item.line_total().display()
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), {} unit(s), total {}",
        cart.len(),
        cart.total_units(),
        cart.subtotal().display()
    );
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}
