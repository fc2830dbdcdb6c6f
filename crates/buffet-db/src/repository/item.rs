//! # Item Repository
//!
//! Catalog item lifecycle: the `items` row and its image asset.
//!
//! ## Keeping Rows and Assets Consistent
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Write Asset → Change Row → Compensate                │
//! │                                                                         │
//! │  create/update with image                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. assets.write(upload) ──── fails ──► error, database untouched      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. INSERT / UPDATE (in a transaction for update)                      │
//! │       │                                                                 │
//! │       ├── fails ──► assets.remove(new)  (best-effort) ──► error        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. COMMIT                                                             │
//! │       │                                                                 │
//! │       ├── fails ──► assets.remove(new)  (best-effort) ──► error        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. assets.remove(old)  (best-effort, only after commit)               │
//! │                                                                         │
//! │  A crash between 1 and 3 can only orphan the NEW asset; the asset a    │
//! │  committed row references is never removed before the row stops       │
//! │  referencing it.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Removal failures are logged at `warn` and never fail the operation.

use buffet_core::validation::{validate_item_name, validate_price};
use buffet_core::{Item, ItemFilter, ItemKey, Patch, Price};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::assets::{AssetStore, ImageUpload};
use crate::error::{DbError, DbResult};

/// Columns selected for an [`Item`].
const COLUMNS: &str = "id, name, descr, price, img";

// =============================================================================
// Requests
// =============================================================================

/// Input for [`ItemRepository::create`].
///
/// Optional fields left as `None` are not written at all, so column
/// defaults (and id assignment) stay with the database.
#[derive(Debug)]
pub struct NewItem {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub image: Option<ImageUpload>,
}

impl NewItem {
    /// Creates a request with only the required fields.
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        NewItem {
            id: None,
            name: name.into(),
            description: None,
            price,
            image: None,
        }
    }

    /// Requests an explicit id instead of a store-assigned one.
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches an image.
    pub fn image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Partial update for [`ItemRepository::update`].
///
/// ## Example
/// ```rust,ignore
/// // Reprice and drop the picture; name and description stay as they are
/// let changes = ItemChanges::new()
///     .price("4.50".parse()?)
///     .image(Patch::Clear);
/// repo.update(&"Lobiani".parse()?, changes).await?;
/// ```
#[derive(Debug, Default)]
pub struct ItemChanges {
    /// New id (renumber).
    pub id: Option<i64>,
    pub name: Option<String>,
    pub price: Option<Price>,
    pub description: Patch<String>,
    pub image: Patch<ImageUpload>,
}

impl ItemChanges {
    /// Creates an empty change set.
    pub fn new() -> Self {
        ItemChanges::default()
    }

    /// Renumbers the item.
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Renames the item.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reprices the item.
    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets or clears the description.
    pub fn description(mut self, description: Patch<String>) -> Self {
        self.description = description;
        self
    }

    /// Replaces or clears the image.
    pub fn image(mut self, image: Patch<ImageUpload>) -> Self {
        self.image = image;
        self
    }

    /// Checks if no field would change.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.price.is_none()
            && !self.description.is_changed()
            && !self.image.is_changed()
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog items.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items(FsAssetStore::new("img"));
///
/// let item = repo
///     .create(NewItem::new("Khachapuri", "12.00".parse()?).image(upload))
///     .await?;
/// let menu = repo.query(&ItemFilter::all().order_by(ItemOrder::ByName)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository<A> {
    pool: SqlitePool,
    assets: A,
}

impl<A: AssetStore> ItemRepository<A> {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool, assets: A) -> Self {
        ItemRepository { pool, assets }
    }

    /// Returns the asset store this repository writes to.
    pub fn assets(&self) -> &A {
        &self.assets
    }

    /// Inserts a new item, writing its image first.
    ///
    /// ## Returns
    /// * `Ok(Item)` - The committed row
    /// * `Err(DbError::Asset)` - Image write failed, nothing inserted
    /// * `Err(DbError::UniqueViolation)` - Name or id already taken
    pub async fn create(&self, item: NewItem) -> DbResult<Item> {
        validate_item_name(&item.name)?;
        validate_price(item.price)?;

        debug!(name = %item.name, "Creating item");

        let image = match item.image {
            Some(upload) => Some(self.assets.write(upload).await?),
            None => None,
        };

        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO items (name, price");
        if item.id.is_some() {
            qb.push(", id");
        }
        if image.is_some() {
            qb.push(", img");
        }
        if item.description.is_some() {
            qb.push(", descr");
        }

        qb.push(") VALUES (");
        {
            let mut values = qb.separated(", ");
            values.push_bind(item.name.clone());
            values.push_bind(item.price);
            if let Some(id) = item.id {
                values.push_bind(id);
            }
            if let Some(image) = &image {
                values.push_bind(image.clone());
            }
            if let Some(description) = item.description {
                values.push_bind(description);
            }
        }
        qb.push(") RETURNING ");
        qb.push(COLUMNS);

        match qb.build_query_as::<Item>().fetch_one(&self.pool).await {
            Ok(created) => {
                info!(id = created.id, name = %created.name, "Item created");
                Ok(created)
            }
            Err(e) => {
                if let Some(image) = &image {
                    self.discard_asset(image).await;
                }
                let err = DbError::from(e).with_duplicate_value("name", &item.name);
                Err(match item.id {
                    Some(id) => err.with_duplicate_value("id", id.to_string()),
                    None => err,
                })
            }
        }
    }

    /// Applies a partial update to the item selected by `key`.
    ///
    /// Only fields present in `changes` are written. An empty change set
    /// succeeds without touching the database.
    ///
    /// ## Returns
    /// * `Ok(())` - Update committed
    /// * `Err(DbError::NotFound)` - No item matches `key`
    /// * `Err(DbError::Asset)` - New image couldn't be written, nothing changed
    pub async fn update(&self, key: &ItemKey, changes: ItemChanges) -> DbResult<()> {
        if changes.is_empty() {
            debug!(key = %key, "Empty change set, nothing to update");
            return Ok(());
        }
        if let Some(name) = &changes.name {
            validate_item_name(name)?;
        }
        if let Some(price) = changes.price {
            validate_price(price)?;
        }

        debug!(key = %key, "Updating item");

        let ItemChanges {
            id,
            name,
            price,
            description,
            image,
        } = changes;

        let image = match image {
            Patch::Unchanged => Patch::Unchanged,
            Patch::Clear => Patch::Clear,
            Patch::Set(upload) => Patch::Set(self.assets.write(upload).await?),
        };

        let columns = ColumnChanges {
            id,
            name,
            price,
            description,
            image,
        };

        match self.apply_update(key, &columns).await {
            Ok(replaced) => {
                info!(key = %key, "Item updated");
                if let Some(old) = replaced {
                    self.discard_asset(&old).await;
                }
                Ok(())
            }
            Err(e) => {
                if let Patch::Set(new) = &columns.image {
                    self.discard_asset(new).await;
                }
                let e = match &columns.name {
                    Some(name) => e.with_duplicate_value("name", name),
                    None => e,
                };
                Err(match columns.id {
                    Some(id) => e.with_duplicate_value("id", id.to_string()),
                    None => e,
                })
            }
        }
    }

    /// Runs the update transaction and returns the asset it stopped
    /// referencing, if any.
    async fn apply_update(&self, key: &ItemKey, columns: &ColumnChanges) -> DbResult<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let old_image = if columns.image.is_changed() {
            let mut qb = QueryBuilder::<Sqlite>::new("SELECT img FROM items WHERE ");
            push_key(&mut qb, key);
            qb.build_query_scalar::<Option<String>>()
                .fetch_optional(&mut *tx)
                .await?
                .flatten()
        } else {
            None
        };

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE items SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(id) = columns.id {
                set.push("id = ");
                set.push_bind_unseparated(id);
            }
            if let Some(name) = &columns.name {
                set.push("name = ");
                set.push_bind_unseparated(name.clone());
            }
            if let Some(price) = columns.price {
                set.push("price = ");
                set.push_bind_unseparated(price);
            }
            match &columns.description {
                Patch::Unchanged => {}
                Patch::Clear => {
                    set.push("descr = NULL");
                }
                Patch::Set(description) => {
                    set.push("descr = ");
                    set.push_bind_unseparated(description.clone());
                }
            }
            match &columns.image {
                Patch::Unchanged => {}
                Patch::Clear => {
                    set.push("img = NULL");
                }
                Patch::Set(image) => {
                    set.push("img = ");
                    set.push_bind_unseparated(image.clone());
                }
            }
        }
        qb.push(" WHERE ");
        push_key(&mut qb, key);

        let result = qb.build().execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", key.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(old_image)
    }

    /// Deletes every item matching `filter` and reclaims their images.
    ///
    /// Keys that match nothing are ignored. A filter with no ids and no
    /// names deletes nothing.
    ///
    /// ## Returns
    /// Number of rows deleted.
    pub async fn delete(&self, filter: &ItemFilter) -> DbResult<u64> {
        if filter.is_unrestricted() {
            debug!("Empty delete filter, nothing to delete");
            return Ok(0);
        }

        debug!(ids = ?filter.ids, names = ?filter.names, "Deleting items");

        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT img FROM items WHERE img IS NOT NULL AND (");
        push_filter(&mut qb, filter);
        qb.push(")");
        let images: Vec<String> = qb.build_query_scalar().fetch_all(&mut *tx).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM items WHERE ");
        push_filter(&mut qb, filter);
        let deleted = qb.build().execute(&mut *tx).await?.rows_affected();

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for image in &images {
            self.discard_asset(image).await;
        }

        info!(deleted, "Items deleted");
        Ok(deleted)
    }

    /// Lists items matching `filter`, exactly as stored.
    pub async fn query(&self, filter: &ItemFilter) -> DbResult<Vec<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(COLUMNS);
        qb.push(" FROM items");
        if !filter.is_unrestricted() {
            qb.push(" WHERE ");
            push_filter(&mut qb, filter);
        }
        qb.push(" ORDER BY ");
        qb.push(filter.order.column());

        let items = qb.build_query_as::<Item>().fetch_all(&self.pool).await?;

        debug!(count = items.len(), "Query returned items");
        Ok(items)
    }

    /// Gets a single item by id or name.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - Item found
    /// * `Ok(None)` - Item not found
    pub async fn get(&self, key: &ItemKey) -> DbResult<Option<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(COLUMNS);
        qb.push(" FROM items WHERE ");
        push_key(&mut qb, key);

        let item = qb.build_query_as::<Item>().fetch_optional(&self.pool).await?;
        Ok(item)
    }

    /// Counts all items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Best-effort asset removal.
    async fn discard_asset(&self, name: &str) {
        if let Err(e) = self.assets.remove(name).await {
            warn!(asset = %name, error = %e, "Failed to remove asset");
        }
    }
}

/// Update columns after the new image (if any) has been written.
struct ColumnChanges {
    id: Option<i64>,
    name: Option<String>,
    price: Option<Price>,
    description: Patch<String>,
    image: Patch<String>,
}

fn push_key(qb: &mut QueryBuilder<'_, Sqlite>, key: &ItemKey) {
    match key {
        ItemKey::Id(id) => {
            qb.push("id = ").push_bind(*id);
        }
        ItemKey::Name(name) => {
            qb.push("name = ").push_bind(name.clone());
        }
    }
}

/// Renders `id IN (..) OR name IN (..)` for a restricted filter.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter) {
    if !filter.ids.is_empty() {
        qb.push("id IN (");
        let mut ids = qb.separated(", ");
        for id in &filter.ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    if !filter.names.is_empty() {
        if !filter.ids.is_empty() {
            qb.push(" OR ");
        }
        qb.push("name IN (");
        let mut names = qb.separated(", ");
        for name in &filter.names {
            names.push_bind(name.clone());
        }
        names.push_unseparated(")");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
