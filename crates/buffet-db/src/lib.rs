//! # buffet-db: Database and Asset Layer for Buffet
//!
//! This crate owns the catalog's side effects: SQLite rows (via sqlx) and the
//! image asset directory, kept consistent by the item repository.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Buffet Data Flow                                 │
//! │                                                                         │
//! │  Caller (`buffet` admin binary, storefront/admin HTTP handlers)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    buffet-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  AssetStore  │  │   │
//! │  │   │   (pool.rs)   │    │  ItemRepo     │───►│  FsAssetStore│  │   │
//! │  │   │  SqlitePool   │◄───│  CredentialRepo│   │  (img/)      │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (items, passwd)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`assets`] - Image asset store contract and filesystem implementation
//! - [`repository`] - Item and credential repositories
//! - [`config`] - Environment-driven runtime settings
//! - [`error`] - Database and asset error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use buffet_db::{Database, DbConfig, FsAssetStore, NewItem};
//!
//! let db = Database::new(DbConfig::new("buffet.db")).await?;
//! let items = db.items(FsAssetStore::new("img"));
//!
//! let item = items.create(NewItem::new("Lobiani", "6.00".parse()?)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod assets;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use assets::{AssetStore, FsAssetStore, ImageUpload};
pub use config::{BuffetConfig, ConfigError};
pub use error::{AssetError, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credential::CredentialRepository;
pub use repository::item::{ItemChanges, ItemRepository, NewItem};
