//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Substring search over name, localized name and barcode
//! - Create / partial update / soft delete / hard delete
//! - Lookups by id, exact name and barcode
//!
//! Stock quantities live in `stock_entries` and are never touched here.
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Search Works                                     │
//! │                                                                         │
//! │  Operator types: "rice"                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE '%rice%' across: name, name_localized, barcode                   │
//! │  (wildcards in the input are escaped)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Active products only, ordered by name                                 │
//! │                                                                         │
//! │  Empty query → first `limit` active products by name                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use stockroom_core::validation::validate_search_query;
use stockroom_core::{new_id, NewProduct, Product, ProductUpdate, ValidationError};

const PRODUCT_COLUMNS: &str = "id, name, name_localized, barcode, category, cost_price_cents, \
     sell_price_cents, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create(NewProduct::new("Green Tea", 350)).await?;
/// let results = repo.search("tea", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by substring.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial); empty lists active products
    /// * `limit` - Maximum results to return
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", escape_like(&query));

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 \
             AND (name LIKE ?1 ESCAPE '\\' OR name_localized LIKE ?1 ESCAPE '\\' OR barcode LIKE ?1 ESCAPE '\\') \
             ORDER BY name, id \
             LIMIT ?2"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name, id LIMIT ?1");

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.fetch_by_id(&self.pool, id).await
    }

    /// [`get_by_id`](Self::get_by_id) on a caller-supplied executor, for use
    /// inside a transaction.
    pub async fn fetch_by_id<'e, E>(&self, executor: E, id: &str) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    /// Gets a product by its exact name.
    ///
    /// Case-sensitive, no fuzzy matching. When several products share a name
    /// the oldest wins.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        self.fetch_by_name(&self.pool, name).await
    }

    pub async fn fetch_by_name<'e, E>(&self, executor: E, name: &str) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1 ORDER BY created_at, id LIMIT 1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(name)
            .fetch_optional(executor)
            .await?;

        Ok(product)
    }

    /// Gets a product by barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Validates and creates a product with no stock.
    ///
    /// ## Returns
    /// * `Err(Validation(Duplicate))` when the barcode is taken
    pub async fn create(&self, draft: NewProduct) -> DbResult<Product> {
        let draft = draft.normalized()?;

        if let Some(barcode) = &draft.barcode {
            if self.get_by_barcode(barcode).await?.is_some() {
                return Err(ValidationError::Duplicate {
                    field: "barcode".to_string(),
                    value: barcode.clone(),
                }
                .into());
            }
        }

        let product = build_product(draft);
        self.insert(&self.pool, &product).await?;

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Inserts a fully built product.
    pub async fn insert<'e, E>(&self, executor: E, product: &Product) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(product_id = %product.id, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, name_localized, barcode, category,
                cost_price_cents, sell_price_cents, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.name_localized)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.cost_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(executor)
        .await
        .map_err(|e| insert_error(e, product))?;

        Ok(())
    }

    /// Inserts `product` unless a product with exactly the same name exists.
    ///
    /// The existence check and the insert are one statement, so inside a
    /// transaction it also takes the write lock. Returns whether a row was
    /// inserted.
    pub async fn insert_if_name_free<'e, E>(&self, executor: E, product: &Product) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(product_id = %product.id, name = %product.name, "Inserting product unless name exists");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, name, name_localized, barcode, category,
                cost_price_cents, sell_price_cents, is_active,
                created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = ?2)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.name_localized)
        .bind(&product.barcode)
        .bind(&product.category)
        .bind(product.cost_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(executor)
        .await
        .map_err(|e| insert_error(e, product))?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies a partial update to catalog fields.
    pub async fn update(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let mut updated = update.apply_to(&current)?;

        if updated.barcode != current.barcode {
            if let Some(barcode) = &updated.barcode {
                if let Some(other) = self.get_by_barcode(barcode).await? {
                    if other.id != id {
                        return Err(ValidationError::Duplicate {
                            field: "barcode".to_string(),
                            value: barcode.clone(),
                        }
                        .into());
                    }
                }
            }
        }

        updated.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                name_localized = ?3,
                barcode = ?4,
                category = ?5,
                cost_price_cents = ?6,
                sell_price_cents = ?7,
                is_active = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&updated.id)
        .bind(&updated.name)
        .bind(&updated.name_localized)
        .bind(&updated.barcode)
        .bind(&updated.category)
        .bind(updated.cost_price_cents)
        .bind(updated.sell_price_cents)
        .bind(updated.is_active)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Records the latest cost price. Returns `false` when the product does
    /// not exist.
    pub async fn set_cost_price<'e, E>(&self, executor: E, id: &str, cost_price_cents: i64) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE products SET cost_price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(cost_price_cents)
            .bind(Utc::now())
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hides a product from sale and search. History and stock are kept.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// Permanently removes a product and its stock entries.
    ///
    /// Fails with `ForeignKeyViolation` while any sale item references it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Counts all products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Builds an active product from a normalised draft.
pub(crate) fn build_product(draft: NewProduct) -> Product {
    let now = Utc::now();
    Product {
        id: new_id(),
        name: draft.name,
        name_localized: draft.name_localized,
        barcode: draft.barcode,
        category: draft.category,
        cost_price_cents: draft.cost_price_cents,
        sell_price_cents: draft.sell_price_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn insert_error(e: sqlx::Error, product: &Product) -> DbError {
    match DbError::from(e) {
        DbError::UniqueViolation { field, .. } if field.contains("barcode") => {
            DbError::duplicate("barcode", product.barcode.clone().unwrap_or_default())
        }
        other => other,
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::ErrorCode;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::{NewProduct, ProductUpdate};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_if_name_free() {
        let db = db().await;
        let repo = db.products();

        let first = super::build_product(NewProduct::new("Ghee", 2000));
        assert!(repo.insert_if_name_free(db.pool(), &first).await.unwrap());

        let second = super::build_product(NewProduct::new("Ghee", 2100));
        assert!(!repo.insert_if_name_free(db.pool(), &second).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        let found = repo.fetch_by_name(db.pool(), "Ghee").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = db().await;
        let created = db
            .products()
            .create(NewProduct::new("Basmati Rice 5kg", 1899).with_barcode("6281000000011"))
            .await
            .unwrap();

        let fetched = db.products().get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Basmati Rice 5kg");
        assert_eq!(fetched.sell_price_cents, 1899);
        assert!(fetched.is_active);

        let by_barcode = db.products().get_by_barcode("6281000000011").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = db().await;
        db.products()
            .create(NewProduct::new("Tea", 100).with_barcode("111"))
            .await
            .unwrap();

        let err = db
            .products()
            .create(NewProduct::new("Coffee", 100).with_barcode("111"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_search_by_name_and_barcode() {
        let db = db().await;
        let repo = db.products();
        repo.create(NewProduct::new("Green Tea", 350).with_barcode("TEA-1")).await.unwrap();
        repo.create(NewProduct::new("Black Tea", 300)).await.unwrap();
        repo.create(NewProduct::new("Coffee Beans", 900)).await.unwrap();

        let tea = repo.search("tea", 10).await.unwrap();
        let names: Vec<&str> = tea.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Black Tea", "Green Tea"]);

        let by_code = repo.search("TEA-", 10).await.unwrap();
        assert_eq!(by_code.len(), 1);

        let all = repo.search("  ", 10).await.unwrap();
        assert_eq!(all.len(), 3);

        assert!(repo.search("100%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_by_name_is_exact() {
        let db = db().await;
        db.products().create(NewProduct::new("Olive Oil", 900)).await.unwrap();

        assert!(db.products().get_by_name("Olive Oil").await.unwrap().is_some());
        assert!(db.products().get_by_name("olive oil").await.unwrap().is_none());
        assert!(db.products().get_by_name("Olive Oil 1L").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let db = db().await;
        let repo = db.products();
        let product = repo.create(NewProduct::new("Dates", 1200)).await.unwrap();

        let updated = repo
            .update(
                &product.id,
                &ProductUpdate {
                    sell_price_cents: Some(1500),
                    category: Some(Some("Food".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.sell_price_cents, 1500);
        assert_eq!(updated.category.as_deref(), Some("Food"));

        repo.soft_delete(&product.id).await.unwrap();
        let hidden = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert!(!hidden.is_active);
        assert!(repo.search("Dates", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_product() {
        let db = db().await;
        let err = db.products().delete("does-not-exist").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_count() {
        let db = db().await;
        assert_eq!(db.products().count().await.unwrap(), 0);
        db.products().create(NewProduct::new("Salt", 50)).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 1);
    }
}
