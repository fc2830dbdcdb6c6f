//! # Domain Types
//!
//! Core domain types used throughout Buffet.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │     ItemKey     │   │    Patch<T>     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (integer)   │   │  Id(i64)        │   │  Unchanged      │       │
//! │  │  name (unique)  │   │  Name(String)   │   │  Clear          │       │
//! │  │  description?   │   └─────────────────┘   │  Set(T)         │       │
//! │  │  price          │                         └─────────────────┘       │
//! │  │  image?         │   ┌─────────────────┐                             │
//! │  └─────────────────┘   │   ItemFilter    │                             │
//! │                        │  ids, names,    │                             │
//! │                        │  order          │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! Every item has an integer `id` and a unique `name`; either one can address
//! it for update, delete or lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::price::Price;

// =============================================================================
// Item
// =============================================================================

/// A catalog item exactly as stored.
///
/// Optional fields stay `None` when absent in the store; an empty
/// description is a different value from no description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Store-assigned (or explicitly chosen) identifier.
    pub id: i64,

    /// Display name, unique across the catalog.
    pub name: String,

    /// Optional free-form description.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "descr"))]
    pub description: Option<String>,

    /// Unit price.
    pub price: Price,

    /// Generated asset file name of the item's image.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "img"))]
    pub image: Option<String>,
}

// =============================================================================
// Addressing Key
// =============================================================================

/// Prefix that forces name addressing for names that look like numbers.
pub const NAME_KEY_PREFIX: &str = "name:";

/// Selects a single item by id or by name.
///
/// ## Parsing
/// | Input          | Key                   |
/// |----------------|-----------------------|
/// | `"42"`         | `Id(42)`              |
/// | `"Margherita"` | `Name("Margherita")`  |
/// | `"name:42"`    | `Name("42")`          |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKey {
    Id(i64),
    Name(String),
}

impl FromStr for ItemKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix(NAME_KEY_PREFIX) {
            if name.is_empty() {
                return Err(ValidationError::required("item name"));
            }
            return Ok(ItemKey::Name(name.to_string()));
        }

        if s.is_empty() {
            return Err(ValidationError::required("item"));
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(ItemKey::Id)
                .map_err(|_| ValidationError::invalid_format("item", "id is out of range"));
        }

        Ok(ItemKey::Name(s.to_string()))
    }
}

/// Formats the key so that parsing it back yields the same key.
impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Id(id) => write!(f, "{}", id),
            ItemKey::Name(name)
                if name.bytes().all(|b| b.is_ascii_digit())
                    || name.starts_with(NAME_KEY_PREFIX) =>
            {
                write!(f, "{}{}", NAME_KEY_PREFIX, name)
            }
            ItemKey::Name(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// Field Presence
// =============================================================================

/// Change requested for an optional field during an update.
///
/// Separates "leave it alone" from "remove it", which a plain `Option`
/// cannot express.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Keep the stored value.
    #[default]
    Unchanged,
    /// Remove the stored value (store NULL).
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T> Patch<T> {
    /// Returns true unless the patch is `Unchanged`.
    #[inline]
    pub fn is_changed(&self) -> bool {
        !matches!(self, Patch::Unchanged)
    }

    /// Maps the carried value, keeping `Unchanged`/`Clear` as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Clear => Patch::Clear,
            Patch::Set(value) => Patch::Set(f(value)),
        }
    }
}

// =============================================================================
// Query Filter
// =============================================================================

/// Result ordering for item listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOrder {
    #[default]
    ById,
    ByName,
}

impl ItemOrder {
    /// Column used in the `ORDER BY` clause.
    pub const fn column(&self) -> &'static str {
        match self {
            ItemOrder::ById => "id",
            ItemOrder::ByName => "name",
        }
    }
}

/// Selects a subset of the catalog.
///
/// An item matches when its id is in `ids` OR its name is in `names`.
/// Both lists empty means the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub ids: Vec<i64>,
    pub names: Vec<String>,
    pub order: ItemOrder,
}

impl ItemFilter {
    /// Matches every item, ordered by id.
    pub fn all() -> Self {
        ItemFilter::default()
    }

    /// Matches the given ids.
    pub fn ids(ids: impl IntoIterator<Item = i64>) -> Self {
        ItemFilter {
            ids: ids.into_iter().collect(),
            ..ItemFilter::default()
        }
    }

    /// Splits addressing keys into id and name selections.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a ItemKey>) -> Self {
        let mut filter = ItemFilter::default();
        for key in keys {
            match key {
                ItemKey::Id(id) => filter.ids.push(*id),
                ItemKey::Name(name) => filter.names.push(name.clone()),
            }
        }
        filter
    }

    /// Sets the result ordering.
    pub fn order_by(mut self, order: ItemOrder) -> Self {
        self.order = order;
        self
    }

    /// True when no id or name restricts the selection.
    pub fn is_unrestricted(&self) -> bool {
        self.ids.is_empty() && self.names.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_parse() {
        assert_eq!("42".parse::<ItemKey>().unwrap(), ItemKey::Id(42));
        assert_eq!("0".parse::<ItemKey>().unwrap(), ItemKey::Id(0));
        assert_eq!(
            "Margherita".parse::<ItemKey>().unwrap(),
            ItemKey::Name("Margherita".to_string())
        );
        assert_eq!(
            "name:42".parse::<ItemKey>().unwrap(),
            ItemKey::Name("42".to_string())
        );
        assert_eq!(
            "-3".parse::<ItemKey>().unwrap(),
            ItemKey::Name("-3".to_string())
        );
    }

    #[test]
    fn test_item_key_parse_errors() {
        assert!(matches!(
            "".parse::<ItemKey>(),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            "name:".parse::<ItemKey>(),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            "99999999999999999999".parse::<ItemKey>(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_item_key_display_parses_back() {
        for key in [
            ItemKey::Id(7),
            ItemKey::Name("Pepperoni".to_string()),
            ItemKey::Name("2024".to_string()),
            ItemKey::Name("name:odd".to_string()),
        ] {
            assert_eq!(key.to_string().parse::<ItemKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_patch() {
        assert!(!Patch::<String>::default().is_changed());
        assert!(Patch::<String>::Clear.is_changed());
        assert_eq!(Patch::Set(2).map(|v| v * 10), Patch::Set(20));
        assert_eq!(Patch::<i32>::Clear.map(|v| v * 10), Patch::Clear);
    }

    #[test]
    fn test_filter_from_keys() {
        let keys = vec![
            ItemKey::Id(1),
            ItemKey::Name("Veggie".to_string()),
            ItemKey::Id(3),
        ];
        let filter = ItemFilter::from_keys(&keys).order_by(ItemOrder::ByName);
        assert_eq!(filter.ids, vec![1, 3]);
        assert_eq!(filter.names, vec!["Veggie".to_string()]);
        assert_eq!(filter.order.column(), "name");
        assert!(!filter.is_unrestricted());
        assert!(ItemFilter::all().is_unrestricted());
    }
}
