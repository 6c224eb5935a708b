//! Cartwheel Store - Shopping-cart state container.
//!
//! Tracks selected products and quantities, validates quantities against a
//! remote stock service, persists cart state across sessions, and
//! broadcasts snapshots to observers.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the cart and exposes exactly three mutations plus
//!   read accessors. Consumers receive it by reference (construct once at
//!   session start, pass it around) - there is no ambient global.
//! - [`stock::StockService`] is the remote authority on available units
//!   and product metadata. The bundled [`stock::HttpStockService`] consumes
//!   a plain REST API via `reqwest`.
//! - [`persist::PersistenceStore`] is a string-keyed get/set used to save
//!   and restore the serialized cart. [`persist::JsonFileStore`] backs it
//!   with a JSON file; [`persist::MemoryStore`] keeps it in-process.
//!
//! # Example
//!
//! ```rust,ignore
//! use cartwheel_core::ProductId;
//! use cartwheel_store::{CartStore, config::StoreConfig};
//! use cartwheel_store::persist::JsonFileStore;
//! use cartwheel_store::stock::HttpStockService;
//!
//! let config = StoreConfig::from_env()?;
//! let stock = HttpStockService::new(&config.stock);
//! let persistence = JsonFileStore::new(&config.storage_path);
//! let store = CartStore::new(stock, persistence).await;
//!
//! store.add_product(ProductId::new(1)).await?;
//! println!("{} items", store.snapshot().await.total_items());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod persist;
pub mod stock;
mod store;

pub use error::{CartError, CartOperation};
pub use store::CartStore;
