//! Stock service client.
//!
//! The stock service is the remote authority on available units and
//! product metadata. It exposes a plain REST API:
//!
//! - `GET {base}/stock/{productId}` -> `{ "amount": n }`
//! - `GET {base}/products/{productId}` -> product metadata JSON
//!
//! [`StockService`] is the seam the cart store depends on; the bundled
//! [`HttpStockService`] implements it over `reqwest`.

use std::sync::Arc;

use async_trait::async_trait;
use cartwheel_core::{Product, ProductId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use crate::config::StockServiceConfig;

/// Errors that can occur when querying the stock service.
#[derive(Debug, Error)]
pub enum StockError {
    /// HTTP request failed (connect, timeout, transport).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service does not know this product.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The service answered with a non-success status.
    #[error("unexpected status {status} from stock service")]
    UnexpectedStatus { status: u16 },
}

/// Remote authority on available stock and product metadata.
#[async_trait]
pub trait StockService: Send + Sync {
    /// Available units for a product.
    async fn stock(&self, product_id: ProductId) -> Result<u32, StockError>;

    /// Product metadata, as copied into the cart at add time.
    async fn product(&self, product_id: ProductId) -> Result<Product, StockError>;
}

/// Stock level response body.
#[derive(Debug, Deserialize)]
struct StockLevel {
    amount: i64,
}

// =============================================================================
// HttpStockService
// =============================================================================

/// REST client for the stock service.
#[derive(Clone)]
pub struct HttpStockService {
    inner: Arc<HttpStockServiceInner>,
}

struct HttpStockServiceInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStockService {
    /// Create a new stock service client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StockServiceConfig) -> Result<Self, StockError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpStockServiceInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        product_id: ProductId,
    ) -> Result<T, StockError> {
        let url = format!("{}/{path}", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StockError::NotFound(product_id));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Stock service returned non-success status"
            );
            return Err(StockError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse stock service response"
            );
            StockError::Parse(e)
        })
    }
}

#[async_trait]
impl StockService for HttpStockService {
    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn stock(&self, product_id: ProductId) -> Result<u32, StockError> {
        let level: StockLevel = self
            .get_json(&format!("stock/{product_id}"), product_id)
            .await?;

        // Negative counts from the service are treated as zero
        Ok(u32::try_from(level.amount.max(0)).unwrap_or(u32::MAX))
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: ProductId) -> Result<Product, StockError> {
        self.get_json(&format!("products/{product_id}"), product_id)
            .await
    }
}
