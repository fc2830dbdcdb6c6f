//! # Repository Module
//!
//! Database repository implementations for Buffet.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller (admin binary, HTTP handler)                                   │
//! │       │                                                                 │
//! │       │  db.items(assets).query(&ItemFilter::all())                    │
//! │       ▼                                                                 │
//! │  ItemRepository<A: AssetStore>                                         │
//! │  ├── create(&self, new_item)       ─┐                                  │
//! │  ├── update(&self, key, changes)    ├─ row + asset kept consistent     │
//! │  ├── delete(&self, filter)         ─┘                                  │
//! │  └── query(&self, filter)                                              │
//! │       │                                                                 │
//! │       ├──────────────► SQLite (items)                                  │
//! │       └──────────────► AssetStore (image directory)                    │
//! │                                                                         │
//! │  CredentialRepository ──────► SQLite (passwd)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Catalog item lifecycle
//! - [`CredentialRepository`](credential::CredentialRepository) - Stored password hashes

pub mod credential;
pub mod item;
