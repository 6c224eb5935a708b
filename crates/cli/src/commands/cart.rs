//! Cart commands.
//!
//! Each command mirrors what a storefront UI does with the store: invoke
//! the operation, then surface either the new cart or the user-facing
//! notice. Failures never carry out of the process as errors - the notice
//! is the whole contract, so every command exits 0.

use cartwheel_core::ProductId;
use cartwheel_store::persist::JsonFileStore;
use cartwheel_store::stock::HttpStockService;
use cartwheel_store::{CartError, CartOperation, CartStore};

type Store = CartStore<HttpStockService, JsonFileStore>;

/// Add one unit of a product.
pub async fn add(store: &Store, product_id: i32) {
    let product_id = ProductId::new(product_id);
    match store.add_product(product_id).await {
        Ok(()) => show(store).await,
        Err(e) => report(&e, CartOperation::Add),
    }
}

/// Remove one unit of a product.
pub async fn remove(store: &Store, product_id: i32) {
    let product_id = ProductId::new(product_id);
    match store.remove_product(product_id).await {
        Ok(()) => show(store).await,
        Err(e) => report(&e, CartOperation::Remove),
    }
}

/// Set a product's amount to an exact value.
pub async fn set_amount(store: &Store, product_id: i32, amount: i64) {
    let product_id = ProductId::new(product_id);
    match store.update_amount(product_id, amount).await {
        Ok(()) => show(store).await,
        Err(e) => report(&e, CartOperation::UpdateAmount),
    }
}

/// Print the current cart.
#[allow(clippy::print_stdout)]
pub async fn show(store: &Store) {
    let cart = store.snapshot().await;

    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for entry in &cart {
        println!(
            "{:>6}  {:<40} x{:<4} {:>10}",
            entry.product.id,
            entry.product.title,
            entry.amount,
            entry.product.price.display(),
        );
    }
    println!(
        "{} items, subtotal {}{}",
        cart.total_items(),
        // All entries share the session currency; take the symbol from the
        // first one.
        cart.iter()
            .next()
            .map_or("$", |e| e.product.price.currency_code.symbol()),
        cart.subtotal(),
    );
}

/// Surface a failed operation the way a storefront UI would: notice text
/// for the user, full detail in the log.
#[allow(clippy::print_stderr)]
fn report(error: &CartError, operation: CartOperation) {
    tracing::error!("{error}");
    eprintln!("{}", error.notice(operation));
}
