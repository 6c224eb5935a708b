//! Shared test support for Cartwheel integration tests.
//!
//! Provides a scripted in-process stock service so cart flows can be
//! exercised end to end without a live HTTP endpoint. Persistence in the
//! flows uses the real `MemoryStore` and `JsonFileStore` implementations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cartwheel_core::{CurrencyCode, Price, Product, ProductId};
use cartwheel_store::stock::{StockError, StockService};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// The product metadata the scripted service reports for `id`.
///
/// Deterministic, so tests can assert that cart entries carry exactly what
/// the service returned.
#[must_use]
pub fn catalog_product(id: i32) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Sneaker {id}"),
        price: Price::new(
            Decimal::new(i64::from(id) * 1999, 2),
            CurrencyCode::USD,
        ),
        image: Some(format!("https://cdn.example.test/sneaker-{id}.jpg")),
    }
}

/// In-process stock service with scriptable stock levels and failures.
///
/// Cloneable; clones share the same script, so a test can adjust stock
/// levels while a store holds the other handle.
#[derive(Clone, Default)]
pub struct ScriptedStock {
    inner: Arc<Mutex<ScriptedStockInner>>,
}

#[derive(Default)]
struct ScriptedStockInner {
    levels: HashMap<i32, u32>,
    failing: bool,
    lookups: u32,
}

impl ScriptedStock {
    /// Service knowing the given `(product_id, stock)` pairs.
    #[must_use]
    pub fn with_stock(levels: &[(i32, u32)]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptedStockInner {
                levels: levels.iter().copied().collect(),
                failing: false,
                lookups: 0,
            })),
        }
    }

    /// Change the stock level reported for a product.
    pub async fn set_stock(&self, product_id: i32, amount: u32) {
        self.inner.lock().await.levels.insert(product_id, amount);
    }

    /// Make every subsequent call fail with a transport-style error.
    pub async fn set_failing(&self, failing: bool) {
        self.inner.lock().await.failing = failing;
    }

    /// Number of stock lookups served so far.
    pub async fn lookups(&self) -> u32 {
        self.inner.lock().await.lookups
    }
}

#[async_trait]
impl StockService for ScriptedStock {
    async fn stock(&self, product_id: ProductId) -> Result<u32, StockError> {
        let mut inner = self.inner.lock().await;
        inner.lookups += 1;
        if inner.failing {
            return Err(StockError::UnexpectedStatus { status: 500 });
        }
        inner
            .levels
            .get(&product_id.as_i32())
            .copied()
            .ok_or(StockError::NotFound(product_id))
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, StockError> {
        let inner = self.inner.lock().await;
        if inner.failing {
            return Err(StockError::UnexpectedStatus { status: 500 });
        }
        if !inner.levels.contains_key(&product_id.as_i32()) {
            return Err(StockError::NotFound(product_id));
        }
        Ok(catalog_product(product_id.as_i32()))
    }
}
