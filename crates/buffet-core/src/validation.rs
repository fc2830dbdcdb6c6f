//! # Validation Module
//!
//! Input validation for catalog records and order quantities.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (admin binary, storefront/admin handlers)             │
//! │  └── Text → Price / ItemKey parsing                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Non-empty names, non-negative prices, quantity range              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE name                                            │
//! │  └── CHECK (price >= 0)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::price::Price;
use crate::{MAX_ITEM_QUANTITY, MIN_ITEM_QUANTITY};

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
///
/// ## Example
/// ```rust
/// use buffet_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Margherita").is_ok());
/// assert!(validate_item_name("").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }
    Ok(())
}

/// Validates that a price can be stored.
///
/// Parsed prices are never negative; this guards prices built from raw
/// minor units.
pub fn validate_price(price: Price) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates an ordered quantity.
///
/// ## Rules
/// - Between MIN_ITEM_QUANTITY (1) and MAX_ITEM_QUANTITY (100), inclusive
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(MIN_ITEM_QUANTITY..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_ITEM_QUANTITY,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Quattro Formaggi").is_ok());
        assert!(validate_item_name(" ").is_ok());
        assert_eq!(
            validate_item_name(""),
            Err(ValidationError::required("name"))
        );
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Price::zero()).is_ok());
        assert!(validate_price(Price::from_minor(1099)).is_ok());
        assert!(validate_price(Price::from_minor(-1)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(101).is_err());
    }
}
