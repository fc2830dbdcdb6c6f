//! # Order Module
//!
//! Computes order lines and the grand total for a storefront checkout.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Calculation                                 │
//! │                                                                         │
//! │  Form pairs {"1": "2", "2": "1", "name": "Nino"}                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  quantities_from_pairs() ──► {1: 2, 2: 1}   (junk keys/values dropped) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Record store query (ids 1, 2)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_order(items, quantities, delivery)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lines: [5.00 × 2 = 10.00, 12.00 × 1 = 12.00]                          │
//! │  total: 10.00 + 12.00 + 5.00 delivery = 27.00                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities outside 1-100 and ids that don't belong to any queried item are
//! dropped silently; a checkout never fails because of a bad form field.
//! A line whose total would overflow the order total is dropped the same way.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::price::Price;
use crate::types::Item;
use crate::validation::validate_quantity;

/// One priced line of an order.
///
/// Item data is copied in so the order reads the same even if the catalog
/// changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: i64,
    pub name: String,
    pub unit_price: Price,
    pub quantity: i64,
    /// unit_price × quantity
    pub line_total: Price,
}

/// A fully computed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub lines: Vec<OrderLine>,
    /// Sum of all line totals.
    pub subtotal: Price,
    /// Flat delivery surcharge.
    pub delivery: Price,
    /// subtotal + delivery
    pub total: Price,
}

impl Order {
    /// Checks if no line survived validation.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units ordered.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// Computes per-line totals and the grand total.
///
/// ## Arguments
/// * `items` - Items as returned by the record store; line order follows it
/// * `quantities` - Requested quantity per item id
/// * `delivery` - Surcharge added once to the total
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use buffet_core::{compute_order, Item, Price};
///
/// let item = |id, minor| Item {
///     id,
///     name: format!("item {id}"),
///     description: None,
///     price: Price::from_minor(minor),
///     image: None,
/// };
/// let items = [item(1, 500), item(2, 1200)];
/// let quantities = HashMap::from([(1, 2), (2, 1)]);
///
/// let order = compute_order(&items, &quantities, Price::from_minor(500));
/// assert_eq!(order.total.minor(), 2700);
/// ```
pub fn compute_order(items: &[Item], quantities: &HashMap<i64, i64>, delivery: Price) -> Order {
    let mut lines = Vec::new();
    let mut subtotal = Price::zero();

    for item in items {
        let Some(&quantity) = quantities.get(&item.id) else {
            continue;
        };
        if validate_quantity(quantity).is_err() {
            continue;
        }

        // Subtotal plus delivery must stay representable
        let Some((line_total, next_subtotal)) = item
            .price
            .checked_multiply_quantity(quantity)
            .and_then(|line| Some((line, subtotal.checked_add(line)?)))
            .filter(|(_, next)| next.checked_add(delivery).is_some())
        else {
            continue;
        };

        subtotal = next_subtotal;
        lines.push(OrderLine {
            item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            line_total,
        });
    }

    Order {
        lines,
        subtotal,
        delivery,
        total: subtotal + delivery,
    }
}

/// Builds the quantity map from raw `(item id, quantity)` form pairs.
///
/// Pairs whose key or value isn't a plain non-negative integer, or whose
/// quantity is out of range, are skipped. A repeated id keeps the last value.
/// Signed text such as `+3` or `-6` counts as malformed; digits are never
/// extracted from a larger string.
pub fn quantities_from_pairs<'a, I>(pairs: I) -> HashMap<i64, i64>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| {
            let id = parse_plain_int(key)?;
            let quantity = parse_plain_int(value)?;
            validate_quantity(quantity).ok()?;
            Some((id, quantity))
        })
        .collect()
}

fn parse_plain_int(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, minor: i64) -> Item {
        Item {
            id,
            name: format!("Item {}", id),
            description: None,
            price: Price::from_minor(minor),
            image: None,
        }
    }

    #[test]
    fn test_compute_order_totals() {
        let items = vec![item(1, 500), item(2, 1200)];
        let quantities = HashMap::from([(1, 2), (2, 1)]);

        let order = compute_order(&items, &quantities, Price::from_minor(500));

        let line_totals: Vec<i64> = order.lines.iter().map(|l| l.line_total.minor()).collect();
        assert_eq!(line_totals, vec![1000, 1200]);
        assert_eq!(order.subtotal.minor(), 2200);
        assert_eq!(order.total.minor(), 2700);
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn test_out_of_range_quantities_are_dropped() {
        let items = vec![item(1, 500), item(2, 1200), item(3, 300), item(4, 100)];
        let quantities = HashMap::from([(1, 0), (2, -4), (3, 101), (4, 100)]);

        let order = compute_order(&items, &quantities, Price::from_minor(500));

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].item_id, 4);
        assert_eq!(order.total.minor(), 100 * 100 + 500);
    }

    #[test]
    fn test_unknown_ids_and_unrequested_items_are_ignored() {
        let items = vec![item(1, 500), item(2, 1200)];
        let quantities = HashMap::from([(2, 3), (99, 5)]);

        let order = compute_order(&items, &quantities, Price::zero());

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].item_id, 2);
        assert_eq!(order.total.minor(), 3600);
    }

    #[test]
    fn test_empty_order_costs_delivery_only() {
        let order = compute_order(&[], &HashMap::new(), Price::from_minor(500));
        assert!(order.is_empty());
        assert_eq!(order.subtotal, Price::zero());
        assert_eq!(order.total.minor(), 500);
    }

    #[test]
    fn test_overflowing_lines_are_dropped() {
        let items = vec![item(1, i64::MAX / 2 + 1), item(2, 1200)];
        let quantities = HashMap::from([(1, 2), (2, 1)]);

        let order = compute_order(&items, &quantities, Price::from_minor(500));

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].item_id, 2);
        assert_eq!(order.total.minor(), 1700);
    }

    #[test]
    fn test_delivery_headroom_is_kept() {
        let items = vec![item(1, i64::MAX - 100)];
        let quantities = HashMap::from([(1, 1)]);

        let order = compute_order(&items, &quantities, Price::from_minor(500));

        assert!(order.is_empty());
        assert_eq!(order.total.minor(), 500);
    }

    #[test]
    fn test_most_expensive_parsed_price_fits() {
        let items = vec![Item {
            price: Price::MAX,
            ..item(1, 0)
        }];
        let quantities = HashMap::from([(1, 100)]);

        let order = compute_order(&items, &quantities, Price::MAX);

        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.total.minor(), Price::MAX.minor() * 101);
    }

    #[test]
    fn test_quantities_from_pairs() {
        let pairs = vec![
            ("1", "2"),
            ("2", "1"),
            ("name", "Nino"),
            ("3", "0"),
            ("4", "101"),
            ("5", "two"),
            ("-6", "1"),
            ("7", "+3"),
            ("2", "4"),
        ];

        let quantities = quantities_from_pairs(pairs);

        assert_eq!(quantities, HashMap::from([(1, 2), (2, 4)]));
    }
}
