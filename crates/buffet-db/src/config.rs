//! # Runtime Configuration
//!
//! Settings shared by everything that serves or edits the catalog.
//!
//! | Variable          | Default       | Meaning                         |
//! |-------------------|---------------|---------------------------------|
//! | `BUFFET_DB`       | `./buffet.db` | SQLite database file            |
//! | `BUFFET_IMG_DIR`  | `img`         | Image asset directory           |
//! | `BUFFET_DELIVERY` | `5.00`        | Delivery surcharge (price text) |
//! | `BUFFET_CURRENCY` | `GEL`         | Currency code shown with prices |

use buffet_core::{Price, DEFAULT_DELIVERY_MINOR};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::assets::FsAssetStore;
use crate::pool::DbConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but can't be used.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// Catalog runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuffetConfig {
    pub database_path: PathBuf,
    pub image_dir: PathBuf,
    /// Added once to every order total.
    pub delivery: Price,
    pub currency: String,
}

impl Default for BuffetConfig {
    fn default() -> Self {
        BuffetConfig {
            database_path: PathBuf::from("./buffet.db"),
            image_dir: PathBuf::from("img"),
            delivery: Price::from_minor(DEFAULT_DELIVERY_MINOR),
            currency: "GEL".to_string(),
        }
    }
}

impl BuffetConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        BuffetConfig::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for unset
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = BuffetConfig::default();

        if let Some(path) = lookup("BUFFET_DB") {
            debug!(path = %path, "Overriding database path from environment");
            config.database_path = PathBuf::from(path);
        }

        if let Some(dir) = lookup("BUFFET_IMG_DIR") {
            debug!(dir = %dir, "Overriding image directory from environment");
            config.image_dir = PathBuf::from(dir);
        }

        if let Some(delivery) = lookup("BUFFET_DELIVERY") {
            config.delivery = delivery.parse().map_err(|e| ConfigError::InvalidValue {
                var: "BUFFET_DELIVERY".to_string(),
                reason: format!("{e}"),
            })?;
        }

        if let Some(currency) = lookup("BUFFET_CURRENCY") {
            if currency.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    var: "BUFFET_CURRENCY".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
            config.currency = currency;
        }

        Ok(config)
    }

    /// Database configuration for the configured path.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
    }

    /// Asset store rooted at the configured image directory.
    pub fn asset_store(&self) -> FsAssetStore {
        FsAssetStore::new(&self.image_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BuffetConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BuffetConfig::default());
        assert_eq!(config.delivery.to_string(), "5.00");
        assert_eq!(config.currency, "GEL");
    }

    #[test]
    fn test_overrides() {
        let config = BuffetConfig::from_lookup(lookup(&[
            ("BUFFET_DB", "/var/lib/buffet/menu.db"),
            ("BUFFET_IMG_DIR", "/srv/img"),
            ("BUFFET_DELIVERY", "3.5"),
            ("BUFFET_CURRENCY", "EUR"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/buffet/menu.db"));
        assert_eq!(config.asset_store().dir(), PathBuf::from("/srv/img").as_path());
        assert_eq!(config.delivery.minor(), 350);
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.db_config().database_path, config.database_path);
    }

    #[test]
    fn test_invalid_values() {
        let err = BuffetConfig::from_lookup(lookup(&[("BUFFET_DELIVERY", "5,00")])).unwrap_err();
        assert!(err.to_string().contains("BUFFET_DELIVERY"));

        assert!(BuffetConfig::from_lookup(lookup(&[("BUFFET_CURRENCY", " ")])).is_err());
    }
}
