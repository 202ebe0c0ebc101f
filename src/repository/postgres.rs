use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, postgres::PgRow, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{
    AdminDashboardStats, Brand, BrandFilter, Campaign, CampaignFilter, Cart, CartItem, Coupon,
    CouponFilter, CouponRedemption, CouponStatus, InventoryFilter, InventoryRecord, InventoryRow,
    ListParams, OptionFilter, Page, PaymentMethod, PaymentMethodFilter, Product, ProductFilter,
    ProductOption, RecordStatus, Review, ReviewFilter, ReviewStatus, StockStatus, SupportTicket,
    TicketFilter, TicketReply, TicketStatus, TransactionKind, User, Wallet, WalletFilter,
    WalletMovement, WalletStatus, WalletTransaction,
};

const BRAND_COLUMNS: &str = "id, name, slug, description, logo_url, status, created_at, updated_at";
const OPTION_COLUMNS: &str =
    r#"id, name, display_name, "values", status, created_at, updated_at"#;
const PRODUCT_COLUMNS: &str = "id, name, slug, description, category, brand_id, price_cents, sku, \
     images, option_ids, is_active, created_at, updated_at";
const INVENTORY_COLUMNS: &str =
    "id, product_id, variant_sku, quantity, low_stock_threshold, created_at, updated_at";
const CAMPAIGN_COLUMNS: &str = "id, name, description, code_prefix, discount_type, discount_value, \
     min_order_cents, max_discount_cents, starts_at, ends_at, usage_limit, per_user_limit, status, \
     created_at, updated_at";
const COUPON_COLUMNS: &str =
    "id, campaign_id, code, user_id, status, usage_count, max_uses, created_at, updated_at";
const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, rating, title, body, status, created_at, updated_at";
const WALLET_COLUMNS: &str = "id, user_id, balance_cents, currency, status, created_at, updated_at";
const WALLET_TX_COLUMNS: &str =
    "id, wallet_id, kind, amount_cents, balance_after_cents, note, created_at";
const PAYMENT_METHOD_COLUMNS: &str =
    "id, name, code, provider, description, status, sort_order, created_at, updated_at";
const TICKET_COLUMNS: &str =
    "id, user_id, subject, message, status, priority, created_at, updated_at";
const REPLY_COLUMNS: &str = "id, ticket_id, author_id, is_staff, message, created_at";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Listing queries are assembled with `QueryBuilder`
/// so every user-supplied value is bound; only whitelisted sort columns are spliced in.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the COUNT and the paged SELECT for one listing. `filters` appends
    /// `AND ...` clauses after a `WHERE TRUE` and is invoked once per query.
    async fn fetch_page<T>(
        &self,
        columns: &str,
        table: &str,
        list: &ListParams,
        filters: impl Fn(&mut QueryBuilder<'_, Postgres>),
    ) -> RepoResult<Page<T>>
    where
        T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {table} WHERE TRUE"));
        filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        if total == 0 {
            return Ok(Page::empty());
        }

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {columns} FROM {table} WHERE TRUE"));
        filters(&mut select);
        select.push(format!(
            " ORDER BY {} {}, id",
            list.sort_by,
            if list.descending { "DESC" } else { "ASC" }
        ));
        select.push(" LIMIT ");
        select.push_bind(i64::from(list.limit));
        select.push(" OFFSET ");
        select.push_bind(list.offset());

        let items = select.build_query_as::<T>().fetch_all(&self.pool).await?;
        Ok(Page { items, total })
    }
}

/// `%search%` with `\`, `%` and `_` escaped, so the search is a literal substring
/// match. Used with `ESCAPE '\'`.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Appends `AND (col1 ILIKE $n OR col2 ILIKE $m ...)` for a non-blank search.
fn push_search(builder: &mut QueryBuilder<'_, Postgres>, list: &ListParams, columns: &[&str]) {
    let Some(search) = &list.search else {
        return;
    };
    let pattern = like_pattern(search);
    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(format!("{column} ILIKE "));
        builder.push_bind(pattern.clone());
        builder.push(r" ESCAPE '\'");
    }
    builder.push(")");
}

fn push_status(builder: &mut QueryBuilder<'_, Postgres>, status: Option<&'static str>) {
    if let Some(status) = status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

fn stock_condition(status: StockStatus) -> &'static str {
    match status {
        StockStatus::OutOfStock => " AND quantity <= 0",
        StockStatus::LowStock => " AND quantity > 0 AND quantity <= low_stock_threshold",
        StockStatus::InStock => " AND quantity > 0 AND quantity > low_stock_threshold",
    }
}

/// Maps a unique-constraint violation onto `Conflict` naming `entity`.
fn conflict_as(entity: &str) -> impl FnOnce(sqlx::Error) -> RepositoryError + '_ {
    move |e| match e.as_database_error() {
        Some(db) if db.is_unique_violation() => RepositoryError::Conflict(entity.to_string()),
        _ => RepositoryError::Database(e),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Inserts the profile or refreshes its email. The stored role is never
    /// overwritten so promotions made in the database survive re-registration.
    async fn upsert_user(&self, user: &User) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO profiles (id, email, role) VALUES ($1, $2, $3)
               ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email
               RETURNING id, email, role"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    // --- Brands ---

    async fn list_brands(&self, filter: &BrandFilter) -> RepoResult<Page<Brand>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(BRAND_COLUMNS, "brands", &filter.list, |b| {
            push_status(b, status);
            push_search(b, &filter.list, &["name", "slug"]);
        })
        .await
    }

    async fn get_brand(&self, id: Uuid) -> RepoResult<Option<Brand>> {
        let sql = format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1");
        Ok(sqlx::query_as::<_, Brand>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_brand(&self, brand: &Brand) -> RepoResult<Brand> {
        let sql = format!(
            "INSERT INTO brands ({BRAND_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {BRAND_COLUMNS}"
        );
        sqlx::query_as::<_, Brand>(&sql)
            .bind(brand.id)
            .bind(&brand.name)
            .bind(&brand.slug)
            .bind(&brand.description)
            .bind(&brand.logo_url)
            .bind(brand.status.as_str())
            .bind(brand.created_at)
            .bind(brand.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Brand"))
    }

    async fn update_brand(&self, brand: &Brand) -> RepoResult<Option<Brand>> {
        let sql = format!(
            "UPDATE brands SET name = $2, slug = $3, description = $4, logo_url = $5, \
             updated_at = $6 WHERE id = $1 RETURNING {BRAND_COLUMNS}"
        );
        sqlx::query_as::<_, Brand>(&sql)
            .bind(brand.id)
            .bind(&brand.name)
            .bind(&brand.slug)
            .bind(&brand.description)
            .bind(&brand.logo_url)
            .bind(brand.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as("Brand"))
    }

    async fn delete_brand(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_brand_status(&self, id: Uuid, status: RecordStatus) -> RepoResult<Option<Brand>> {
        let sql = format!(
            "UPDATE brands SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {BRAND_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Brand>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- Options ---

    async fn list_options(&self, filter: &OptionFilter) -> RepoResult<Page<ProductOption>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(OPTION_COLUMNS, "product_options", &filter.list, |b| {
            push_status(b, status);
            push_search(b, &filter.list, &["name", "display_name"]);
        })
        .await
    }

    async fn get_option(&self, id: Uuid) -> RepoResult<Option<ProductOption>> {
        let sql = format!("SELECT {OPTION_COLUMNS} FROM product_options WHERE id = $1");
        Ok(sqlx::query_as::<_, ProductOption>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_option(&self, option: &ProductOption) -> RepoResult<ProductOption> {
        let sql = format!(
            "INSERT INTO product_options ({OPTION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, ProductOption>(&sql)
            .bind(option.id)
            .bind(&option.name)
            .bind(&option.display_name)
            .bind(&option.values)
            .bind(option.status.as_str())
            .bind(option.created_at)
            .bind(option.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Option"))
    }

    async fn update_option(&self, option: &ProductOption) -> RepoResult<Option<ProductOption>> {
        let sql = format!(
            r#"UPDATE product_options SET name = $2, display_name = $3, "values" = $4,
               updated_at = $5 WHERE id = $1 RETURNING {OPTION_COLUMNS}"#
        );
        sqlx::query_as::<_, ProductOption>(&sql)
            .bind(option.id)
            .bind(&option.name)
            .bind(&option.display_name)
            .bind(&option.values)
            .bind(option.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as("Option"))
    }

    async fn delete_option(&self, id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE products SET option_ids = array_remove(option_ids, $1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM product_options WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_option_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<ProductOption>> {
        let sql = format!(
            "UPDATE product_options SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {OPTION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, ProductOption>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- Products ---

    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<Page<Product>> {
        self.fetch_page(PRODUCT_COLUMNS, "products", &filter.list, |b| {
            if filter.active_only {
                b.push(" AND is_active = true");
            }
            if let Some(active) = filter.is_active {
                b.push(" AND is_active = ");
                b.push_bind(active);
            }
            if let Some(category) = &filter.category {
                b.push(" AND LOWER(category) = LOWER(");
                b.push_bind(category.clone());
                b.push(")");
            }
            if let Some(brand_id) = filter.brand_id {
                b.push(" AND brand_id = ");
                b.push_bind(brand_id);
            }
            push_search(b, &filter.list, &["name", "sku", "description"]);
        })
        .await
    }

    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_product(&self, product: &Product) -> RepoResult<Product> {
        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(&product.category)
            .bind(product.brand_id)
            .bind(product.price_cents)
            .bind(&product.sku)
            .bind(&product.images)
            .bind(&product.option_ids)
            .bind(product.is_active)
            .bind(product.created_at)
            .bind(product.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Product"))
    }

    async fn update_product(&self, product: &Product) -> RepoResult<Option<Product>> {
        let sql = format!(
            "UPDATE products SET name = $2, slug = $3, description = $4, category = $5, \
             brand_id = $6, price_cents = $7, sku = $8, images = $9, option_ids = $10, \
             updated_at = $11 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.slug)
            .bind(&product.description)
            .bind(&product.category)
            .bind(product.brand_id)
            .bind(product.price_cents)
            .bind(&product.sku)
            .bind(&product.images)
            .bind(&product.option_ids)
            .bind(product.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as("Product"))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_product_active(&self, id: Uuid, is_active: bool) -> RepoResult<Option<Product>> {
        let sql = format!(
            "UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- Inventory ---

    async fn list_inventory(&self, filter: &InventoryFilter) -> RepoResult<Page<InventoryRecord>> {
        let page: Page<InventoryRow> = self
            .fetch_page(INVENTORY_COLUMNS, "inventory", &filter.list, |b| {
                if let Some(product_id) = filter.product_id {
                    b.push(" AND product_id = ");
                    b.push_bind(product_id);
                }
                if let Some(status) = filter.stock_status {
                    b.push(stock_condition(status));
                }
                push_search(b, &filter.list, &["variant_sku"]);
            })
            .await?;
        Ok(Page {
            items: page.items.into_iter().map(InventoryRecord::from).collect(),
            total: page.total,
        })
    }

    async fn get_inventory(&self, id: Uuid) -> RepoResult<Option<InventoryRecord>> {
        let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventory WHERE id = $1");
        let row = sqlx::query_as::<_, InventoryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(InventoryRecord::from))
    }

    async fn insert_inventory(&self, row: &InventoryRow) -> RepoResult<InventoryRecord> {
        let sql = format!(
            "INSERT INTO inventory ({INVENTORY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {INVENTORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, InventoryRow>(&sql)
            .bind(row.id)
            .bind(row.product_id)
            .bind(&row.variant_sku)
            .bind(row.quantity)
            .bind(row.low_stock_threshold)
            .bind(row.created_at)
            .bind(row.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Inventory record"))?;
        Ok(InventoryRecord::from(row))
    }

    async fn update_inventory(&self, row: &InventoryRow) -> RepoResult<Option<InventoryRecord>> {
        let sql = format!(
            "UPDATE inventory SET variant_sku = $2, quantity = $3, low_stock_threshold = $4, \
             updated_at = $5 WHERE id = $1 RETURNING {INVENTORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, InventoryRow>(&sql)
            .bind(row.id)
            .bind(&row.variant_sku)
            .bind(row.quantity)
            .bind(row.low_stock_threshold)
            .bind(row.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as("Inventory record"))?;
        Ok(row.map(InventoryRecord::from))
    }

    async fn adjust_inventory(&self, id: Uuid, delta: i32) -> RepoResult<Option<InventoryRecord>> {
        // The guard lives in the WHERE clause so concurrent adjustments cannot
        // drive the quantity negative.
        let sql = format!(
            "UPDATE inventory SET quantity = quantity + $2, updated_at = NOW() \
             WHERE id = $1 AND quantity + $2 >= 0 RETURNING {INVENTORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, InventoryRow>(&sql)
            .bind(id)
            .bind(delta)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(InventoryRecord::from(row))),
            None => match self.get_inventory(id).await? {
                Some(_) => Err(RepositoryError::Rejected("Insufficient stock".to_string())),
                None => Ok(None),
            },
        }
    }

    async fn delete_inventory(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Campaigns ---

    async fn list_campaigns(&self, filter: &CampaignFilter) -> RepoResult<Page<Campaign>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(CAMPAIGN_COLUMNS, "campaigns", &filter.list, |b| {
            push_status(b, status);
            push_search(b, &filter.list, &["name", "code_prefix"]);
        })
        .await
    }

    async fn get_campaign(&self, id: Uuid) -> RepoResult<Option<Campaign>> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1");
        Ok(sqlx::query_as::<_, Campaign>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_campaign(&self, c: &Campaign) -> RepoResult<Campaign> {
        let sql = format!(
            "INSERT INTO campaigns ({CAMPAIGN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Campaign>(&sql)
            .bind(c.id)
            .bind(&c.name)
            .bind(&c.description)
            .bind(&c.code_prefix)
            .bind(c.discount_type.as_str())
            .bind(c.discount_value)
            .bind(c.min_order_cents)
            .bind(c.max_discount_cents)
            .bind(c.starts_at)
            .bind(c.ends_at)
            .bind(c.usage_limit)
            .bind(c.per_user_limit)
            .bind(c.status.as_str())
            .bind(c.created_at)
            .bind(c.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_campaign(&self, c: &Campaign) -> RepoResult<Option<Campaign>> {
        let sql = format!(
            "UPDATE campaigns SET name = $2, description = $3, code_prefix = $4, \
             discount_type = $5, discount_value = $6, min_order_cents = $7, \
             max_discount_cents = $8, starts_at = $9, ends_at = $10, usage_limit = $11, \
             per_user_limit = $12, updated_at = $13 WHERE id = $1 RETURNING {CAMPAIGN_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Campaign>(&sql)
            .bind(c.id)
            .bind(&c.name)
            .bind(&c.description)
            .bind(&c.code_prefix)
            .bind(c.discount_type.as_str())
            .bind(c.discount_value)
            .bind(c.min_order_cents)
            .bind(c.max_discount_cents)
            .bind(c.starts_at)
            .bind(c.ends_at)
            .bind(c.usage_limit)
            .bind(c.per_user_limit)
            .bind(c.updated_at)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_campaign(&self, id: Uuid) -> RepoResult<bool> {
        // coupons and coupon_redemptions cascade.
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_campaign_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<Campaign>> {
        let sql = format!(
            "UPDATE campaigns SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CAMPAIGN_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Campaign>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- Coupons ---

    async fn list_coupons(&self, filter: &CouponFilter) -> RepoResult<Page<Coupon>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(COUPON_COLUMNS, "coupons", &filter.list, |b| {
            push_status(b, status);
            if let Some(campaign_id) = filter.campaign_id {
                b.push(" AND campaign_id = ");
                b.push_bind(campaign_id);
            }
            push_search(b, &filter.list, &["code"]);
        })
        .await
    }

    async fn get_coupon(&self, id: Uuid) -> RepoResult<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1");
        Ok(sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_coupon_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE code = $1");
        Ok(sqlx::query_as::<_, Coupon>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_coupons(
        &self,
        campaign_id: Uuid,
        coupons: &[Coupon],
    ) -> RepoResult<Option<Vec<Coupon>>> {
        let mut tx = self.pool.begin().await?;

        // The campaign row lock serializes concurrent batches against the count below.
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE");
        let Some(campaign) = sqlx::query_as::<_, Campaign>(&sql)
            .bind(campaign_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        if coupons.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let issued =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM coupons WHERE campaign_id = $1")
                .bind(campaign_id)
                .fetch_one(&mut *tx)
                .await?;
        campaign
            .coupon_allowance(issued, coupons.len() as i64)
            .map_err(RepositoryError::Rejected)?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO coupons ({COUPON_COLUMNS}) "));
        builder.push_values(coupons, |mut row, c| {
            row.push_bind(c.id)
                .push_bind(campaign_id)
                .push_bind(c.code.clone())
                .push_bind(c.user_id)
                .push_bind(c.status.as_str())
                .push_bind(c.usage_count)
                .push_bind(c.max_uses)
                .push_bind(c.created_at)
                .push_bind(c.updated_at);
        });
        builder.push(format!(" RETURNING {COUPON_COLUMNS}"));
        let inserted = builder
            .build_query_as::<Coupon>()
            .fetch_all(&mut *tx)
            .await
            .map_err(conflict_as("Coupon code"))?;

        tx.commit().await?;
        Ok(Some(inserted))
    }

    async fn count_campaign_coupons(&self, campaign_id: Uuid) -> RepoResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM coupons WHERE campaign_id = $1")
                .bind(campaign_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn delete_coupon(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_coupon_status(
        &self,
        id: Uuid,
        status: CouponStatus,
    ) -> RepoResult<Option<Coupon>> {
        let sql = format!(
            "UPDATE coupons SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {COUPON_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Coupon>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_user_redemptions(&self, campaign_id: Uuid, user_id: Uuid) -> RepoResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coupon_redemptions WHERE campaign_id = $1 AND user_id = $2",
        )
        .bind(campaign_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn record_redemption(&self, r: &CouponRedemption) -> RepoResult<Option<Coupon>> {
        let mut tx = self.pool.begin().await?;

        // Campaign lock first, then coupon: redemptions under one campaign serialize here.
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1 FOR UPDATE");
        let Some(campaign) = sqlx::query_as::<_, Campaign>(&sql)
            .bind(r.campaign_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let sql = format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1 AND campaign_id = $2 FOR UPDATE"
        );
        let Some(coupon) = sqlx::query_as::<_, Coupon>(&sql)
            .bind(r.coupon_id)
            .bind(r.campaign_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let used = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coupon_redemptions WHERE campaign_id = $1 AND user_id = $2",
        )
        .bind(r.campaign_id)
        .bind(r.user_id)
        .fetch_one(&mut *tx)
        .await?;
        coupon
            .evaluate(&campaign, r.user_id, used, r.subtotal_cents, r.created_at)
            .map_err(|reason| RepositoryError::Rejected(reason.to_string()))?;

        let redeemed = coupon.redeemed_once(r.created_at);
        let sql = format!(
            "UPDATE coupons SET usage_count = $2, status = $3, updated_at = $4 WHERE id = $1 \
             RETURNING {COUPON_COLUMNS}"
        );
        let coupon = sqlx::query_as::<_, Coupon>(&sql)
            .bind(redeemed.id)
            .bind(redeemed.usage_count)
            .bind(redeemed.status.as_str())
            .bind(redeemed.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"INSERT INTO coupon_redemptions
                   (id, coupon_id, campaign_id, user_id, subtotal_cents, discount_cents, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(r.id)
        .bind(r.coupon_id)
        .bind(r.campaign_id)
        .bind(r.user_id)
        .bind(r.subtotal_cents)
        .bind(r.discount_cents)
        .bind(r.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(coupon))
    }

    // --- Reviews ---

    async fn list_reviews(&self, filter: &ReviewFilter) -> RepoResult<Page<Review>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(REVIEW_COLUMNS, "reviews", &filter.list, |b| {
            push_status(b, status);
            if let Some(product_id) = filter.product_id {
                b.push(" AND product_id = ");
                b.push_bind(product_id);
            }
            if let Some(rating) = filter.rating {
                b.push(" AND rating = ");
                b.push_bind(rating);
            }
            push_search(b, &filter.list, &["title", "body"]);
        })
        .await
    }

    async fn get_review(&self, id: Uuid) -> RepoResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_review(&self, review: &Review) -> RepoResult<Review> {
        let sql = format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {REVIEW_COLUMNS}"
        );
        sqlx::query_as::<_, Review>(&sql)
            .bind(review.id)
            .bind(review.product_id)
            .bind(review.user_id)
            .bind(review.rating)
            .bind(&review.title)
            .bind(&review.body)
            .bind(review.status.as_str())
            .bind(review.created_at)
            .bind(review.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Review"))
    }

    async fn set_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> RepoResult<Option<Review>> {
        let sql = format!(
            "UPDATE reviews SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {REVIEW_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_review(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Wallets ---

    async fn list_wallets(&self, filter: &WalletFilter) -> RepoResult<Page<Wallet>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(WALLET_COLUMNS, "wallets", &filter.list, |b| {
            push_status(b, status);
            if let Some(search) = &filter.list.search {
                let pattern = like_pattern(search);
                b.push(" AND (currency ILIKE ");
                b.push_bind(pattern.clone());
                b.push(r" ESCAPE '\' OR user_id IN (SELECT id FROM profiles WHERE email ILIKE ");
                b.push_bind(pattern);
                b.push(r" ESCAPE '\'))");
            }
        })
        .await
    }

    async fn get_wallet(&self, id: Uuid) -> RepoResult<Option<Wallet>> {
        let sql = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1");
        Ok(sqlx::query_as::<_, Wallet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_wallet_by_user(&self, user_id: Uuid) -> RepoResult<Option<Wallet>> {
        let sql = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE user_id = $1");
        Ok(sqlx::query_as::<_, Wallet>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_wallet(&self, wallet: &Wallet) -> RepoResult<Wallet> {
        let sql = format!(
            "INSERT INTO wallets ({WALLET_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {WALLET_COLUMNS}"
        );
        sqlx::query_as::<_, Wallet>(&sql)
            .bind(wallet.id)
            .bind(wallet.user_id)
            .bind(wallet.balance_cents)
            .bind(&wallet.currency)
            .bind(wallet.status.as_str())
            .bind(wallet.created_at)
            .bind(wallet.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Wallet"))
    }

    async fn set_wallet_status(
        &self,
        id: Uuid,
        status: WalletStatus,
    ) -> RepoResult<Option<Wallet>> {
        let sql = format!(
            "UPDATE wallets SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {WALLET_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Wallet>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn apply_wallet_movement(
        &self,
        wallet_id: Uuid,
        kind: TransactionKind,
        amount_cents: i64,
        note: Option<String>,
    ) -> RepoResult<Option<WalletMovement>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {WALLET_COLUMNS} FROM wallets WHERE id = $1 FOR UPDATE");
        let Some(wallet) = sqlx::query_as::<_, Wallet>(&sql)
            .bind(wallet_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let balance = wallet
            .balance_after(kind, amount_cents)
            .map_err(|e| RepositoryError::Rejected(e.to_string()))?;
        let now = Utc::now();

        let sql = format!(
            "UPDATE wallets SET balance_cents = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {WALLET_COLUMNS}"
        );
        let wallet = sqlx::query_as::<_, Wallet>(&sql)
            .bind(wallet_id)
            .bind(balance)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO wallet_transactions ({WALLET_TX_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {WALLET_TX_COLUMNS}"
        );
        let transaction = sqlx::query_as::<_, WalletTransaction>(&sql)
            .bind(Uuid::new_v4())
            .bind(wallet_id)
            .bind(kind.as_str())
            .bind(amount_cents)
            .bind(balance)
            .bind(note)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(WalletMovement {
            wallet,
            transaction,
        }))
    }

    async fn list_wallet_transactions(
        &self,
        wallet_id: Uuid,
        list: &ListParams,
    ) -> RepoResult<Page<WalletTransaction>> {
        // Ledger order is fixed regardless of the requested sort.
        let ledger = ListParams {
            sort_by: "created_at",
            descending: true,
            search: None,
            ..list.clone()
        };
        self.fetch_page(WALLET_TX_COLUMNS, "wallet_transactions", &ledger, |b| {
            b.push(" AND wallet_id = ");
            b.push_bind(wallet_id);
        })
        .await
    }

    // --- Payment methods ---

    async fn list_payment_methods(
        &self,
        filter: &PaymentMethodFilter,
    ) -> RepoResult<Page<PaymentMethod>> {
        let status = filter.status.map(|s| s.as_str());
        self.fetch_page(PAYMENT_METHOD_COLUMNS, "payment_methods", &filter.list, |b| {
            push_status(b, status);
            push_search(b, &filter.list, &["name", "code", "provider"]);
        })
        .await
    }

    async fn get_payment_method(&self, id: Uuid) -> RepoResult<Option<PaymentMethod>> {
        let sql = format!("SELECT {PAYMENT_METHOD_COLUMNS} FROM payment_methods WHERE id = $1");
        Ok(sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_payment_method(&self, m: &PaymentMethod) -> RepoResult<PaymentMethod> {
        let sql = format!(
            "INSERT INTO payment_methods ({PAYMENT_METHOD_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {PAYMENT_METHOD_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(m.id)
            .bind(&m.name)
            .bind(&m.code)
            .bind(&m.provider)
            .bind(&m.description)
            .bind(m.status.as_str())
            .bind(m.sort_order)
            .bind(m.created_at)
            .bind(m.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as("Payment method"))
    }

    async fn update_payment_method(&self, m: &PaymentMethod) -> RepoResult<Option<PaymentMethod>> {
        let sql = format!(
            "UPDATE payment_methods SET name = $2, code = $3, provider = $4, description = $5, \
             sort_order = $6, updated_at = $7 WHERE id = $1 RETURNING {PAYMENT_METHOD_COLUMNS}"
        );
        sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(m.id)
            .bind(&m.name)
            .bind(&m.code)
            .bind(&m.provider)
            .bind(&m.description)
            .bind(m.sort_order)
            .bind(m.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as("Payment method"))
    }

    async fn delete_payment_method(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_payment_method_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<PaymentMethod>> {
        let sql = format!(
            "UPDATE payment_methods SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PAYMENT_METHOD_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, PaymentMethod>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?)
    }

    // --- Support tickets ---

    async fn list_tickets(&self, filter: &TicketFilter) -> RepoResult<Page<SupportTicket>> {
        let status = filter.status.map(|s| s.as_str());
        let priority = filter.priority.map(|p| p.as_str());
        self.fetch_page(TICKET_COLUMNS, "support_tickets", &filter.list, |b| {
            push_status(b, status);
            if let Some(priority) = priority {
                b.push(" AND priority = ");
                b.push_bind(priority);
            }
            if let Some(user_id) = filter.user_id {
                b.push(" AND user_id = ");
                b.push_bind(user_id);
            }
            push_search(b, &filter.list, &["subject", "message"]);
        })
        .await
    }

    async fn get_ticket(&self, id: Uuid) -> RepoResult<Option<SupportTicket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM support_tickets WHERE id = $1");
        Ok(sqlx::query_as::<_, SupportTicket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_ticket(&self, t: &SupportTicket) -> RepoResult<SupportTicket> {
        let sql = format!(
            "INSERT INTO support_tickets ({TICKET_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {TICKET_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SupportTicket>(&sql)
            .bind(t.id)
            .bind(t.user_id)
            .bind(&t.subject)
            .bind(&t.message)
            .bind(t.status.as_str())
            .bind(t.priority.as_str())
            .bind(t.created_at)
            .bind(t.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_ticket(&self, t: &SupportTicket) -> RepoResult<Option<SupportTicket>> {
        let sql = format!(
            "UPDATE support_tickets SET status = $2, priority = $3, updated_at = $4 \
             WHERE id = $1 RETURNING {TICKET_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SupportTicket>(&sql)
            .bind(t.id)
            .bind(t.status.as_str())
            .bind(t.priority.as_str())
            .bind(t.updated_at)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn add_ticket_reply(
        &self,
        reply: &TicketReply,
        status: TicketStatus,
    ) -> RepoResult<TicketReply> {
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            "UPDATE support_tickets SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status <> 'CLOSED'",
        )
        .bind(reply.ticket_id)
        .bind(status.as_str())
        .bind(reply.created_at)
        .execute(&mut *tx)
        .await?;
        if moved.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::Rejected(
                "Ticket is closed and cannot receive replies".to_string(),
            ));
        }

        let sql = format!(
            "INSERT INTO ticket_replies ({REPLY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {REPLY_COLUMNS}"
        );
        let reply = sqlx::query_as::<_, TicketReply>(&sql)
            .bind(reply.id)
            .bind(reply.ticket_id)
            .bind(reply.author_id)
            .bind(reply.is_staff)
            .bind(&reply.message)
            .bind(reply.created_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(reply)
    }

    async fn list_ticket_replies(&self, ticket_id: Uuid) -> RepoResult<Vec<TicketReply>> {
        let sql = format!(
            "SELECT {REPLY_COLUMNS} FROM ticket_replies WHERE ticket_id = $1 ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, TicketReply>(&sql)
            .bind(ticket_id)
            .fetch_all(&self.pool)
            .await?)
    }

    // --- Carts ---

    async fn get_cart(&self, user_id: Uuid) -> RepoResult<Option<Cart>> {
        let header = sqlx::query_as::<_, (Uuid, DateTime<Utc>, DateTime<Utc>)>(
            "SELECT id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some((id, created_at, updated_at)) = header else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItem>(
            r#"SELECT product_id, name, unit_price_cents, quantity,
                      unit_price_cents * quantity AS line_total_cents
               FROM cart_items WHERE cart_id = $1 ORDER BY position"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut cart = Cart {
            id,
            user_id,
            items,
            total_cents: 0,
            created_at,
            updated_at,
        };
        cart.recalculate();
        Ok(Some(cart))
    }

    async fn save_cart(&self, cart: &Cart) -> RepoResult<Cart> {
        let mut tx = self.pool.begin().await?;

        // Two first-time saves race on user_id; both must write items under the row
        // that won, not under their own fresh id.
        let (cart_id, created_at) = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            r#"INSERT INTO carts (id, user_id, created_at, updated_at) VALUES ($1, $2, $3, $4)
               ON CONFLICT (user_id) DO UPDATE SET updated_at = EXCLUDED.updated_at
               RETURNING id, created_at"#,
        )
        .bind(cart.id)
        .bind(cart.user_id)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        if !cart.items.is_empty() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO cart_items (cart_id, position, product_id, name, unit_price_cents, quantity) ",
            );
            builder.push_values(cart.items.iter().enumerate(), |mut row, (position, item)| {
                row.push_bind(cart_id)
                    .push_bind(position as i32)
                    .push_bind(item.product_id)
                    .push_bind(item.name.clone())
                    .push_bind(item.unit_price_cents)
                    .push_bind(item.quantity);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(Cart {
            id: cart_id,
            created_at,
            ..cart.clone()
        })
    }

    // --- Dashboard ---

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let row = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64, i64)>(
            r#"SELECT
                (SELECT COUNT(*) FROM products),
                (SELECT COUNT(*) FROM products WHERE is_active = true),
                (SELECT COUNT(*) FROM inventory WHERE quantity > 0 AND quantity <= low_stock_threshold),
                (SELECT COUNT(*) FROM inventory WHERE quantity <= 0),
                (SELECT COUNT(*) FROM reviews WHERE status = 'PENDING'),
                (SELECT COUNT(*) FROM support_tickets WHERE status IN ('OPEN', 'IN_PROGRESS')),
                (SELECT COUNT(*) FROM campaigns WHERE status = 'ACTIVE'),
                (SELECT COALESCE(SUM(balance_cents), 0)::BIGINT FROM wallets)"#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminDashboardStats {
            total_products: row.0,
            active_products: row.1,
            low_stock_items: row.2,
            out_of_stock_items: row.3,
            pending_reviews: row.4,
            open_tickets: row.5,
            active_campaigns: row.6,
            total_wallet_balance_cents: row.7,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_matches_wildcards_literally() {
        assert_eq!(like_pattern("tee"), "%tee%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }
}
