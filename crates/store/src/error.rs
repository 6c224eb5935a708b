//! Unified error handling for cart operations.
//!
//! Every mutation either commits fully or returns a [`CartError`] with the
//! cart left untouched - there are no partial commits. UI layers that only
//! want the user-facing toast text can call [`CartError::notice`] instead
//! of matching on variants.

use cartwheel_core::ProductId;
use thiserror::Error;

use crate::persist::PersistError;
use crate::stock::StockError;

/// Cart-level error type covering all three mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested or candidate amount exceeds available stock.
    #[error("requested quantity for product {product_id} exceeds available stock")]
    StockExceeded { product_id: ProductId },

    /// Operation referenced a product that is not in the cart.
    #[error("product {product_id} is not in the cart")]
    EntityNotFound { product_id: ProductId },

    /// Stock service call failed.
    #[error("stock service error: {0}")]
    Stock(#[from] StockError),

    /// Persistence write or read failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistError),

    /// Concurrent mutations kept invalidating this one's snapshot.
    #[error("cart changed concurrently while updating product {product_id}, retries exhausted")]
    Conflict { product_id: ProductId },
}

/// Which mutation an error came from, for notice wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOperation {
    /// `add_product`
    Add,
    /// `remove_product`
    Remove,
    /// `update_amount`
    UpdateAmount,
}

impl CartError {
    /// Stable user-facing notice text for this error.
    ///
    /// These are the strings a front end surfaces to the user (the toast
    /// analogue); they carry no internal detail.
    #[must_use]
    pub const fn notice(&self, operation: CartOperation) -> &'static str {
        match self {
            Self::StockExceeded { .. } => "Requested quantity exceeds available stock",
            Self::EntityNotFound { .. } => "Failed to remove product",
            Self::Stock(_) | Self::Persistence(_) | Self::Conflict { .. } => match operation {
                CartOperation::Add => "Failed to add product",
                CartOperation::Remove => "Failed to remove product",
                CartOperation::UpdateAmount => "Failed to update product quantity",
            },
        }
    }
}
