//! # buffet-core: Pure Business Logic for Buffet
//!
//! This crate holds the catalog's value types and pure calculations. It has
//! zero I/O dependencies; everything that touches the database or the image
//! directory lives in `buffet-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Buffet Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │         Callers (admin binary, storefront/admin handlers)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ buffet-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   price   │  │   order   │  │ validation│  │   │
//! │  │   │   Item    │  │   Price   │  │   Order   │  │   rules   │  │   │
//! │  │   │  ItemKey  │  │           │  │ OrderLine │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          buffet-db (SQLite rows + image asset directory)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, ItemKey, Patch)
//! - [`price`] - Fixed-point price with exactly two fractional digits
//! - [`order`] - Order line and grand total aggregation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use buffet_core::Price;
//!
//! let price: Price = "3.5".parse().unwrap();
//! assert_eq!(price.minor(), 350);
//! assert_eq!(price.to_string(), "3.50");
//! ```

pub mod error;
pub mod order;
pub mod price;
pub mod types;
pub mod validation;

pub use error::{ValidationError, ValidationResult};
pub use order::{compute_order, quantities_from_pairs, Order, OrderLine};
pub use price::Price;
pub use types::*;

/// Smallest quantity of a single item accepted in an order.
pub const MIN_ITEM_QUANTITY: i64 = 1;

/// Largest quantity of a single item accepted in an order.
///
/// Anything above this is treated as a typo on the storefront form and
/// dropped from the order.
pub const MAX_ITEM_QUANTITY: i64 = 100;

/// Delivery surcharge added to every order, in minor units (5.00).
pub const DEFAULT_DELIVERY_MINOR: i64 = 500;
