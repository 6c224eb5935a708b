//! Cartwheel Core - Shared types library.
//!
//! This crate provides common types used across all Cartwheel components:
//! - `store` - The cart state container library
//! - `cli` - Command-line front end driving a cart against live services
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, product metadata, and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
