//! In-process `Repository` used by the test-suite and for database-less local runs.
//!
//! Mirrors the Postgres semantics that handlers rely on: unique keys surface as
//! `Conflict`, guarded writes as `Rejected`/`None`, and listings filter before paging.

use async_trait::async_trait;
use chrono::Utc;
use std::{cmp::Ordering, collections::HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepoResult, Repository, RepositoryError};
use crate::models::{
    AdminDashboardStats, Brand, BrandFilter, Campaign, CampaignFilter, Cart, Coupon, CouponFilter,
    CouponRedemption, CouponStatus, InventoryFilter, InventoryRecord, InventoryRow, ListParams,
    OptionFilter, Page, PaymentMethod, PaymentMethodFilter, Product, ProductFilter, ProductOption,
    RecordStatus, Review, ReviewFilter, ReviewStatus, StockStatus, SupportTicket, TicketFilter,
    TicketReply, TicketStatus, TransactionKind, User, Wallet, WalletFilter, WalletMovement,
    WalletStatus, WalletTransaction, sort_by_column,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    brands: HashMap<Uuid, Brand>,
    options: HashMap<Uuid, ProductOption>,
    products: HashMap<Uuid, Product>,
    inventory: HashMap<Uuid, InventoryRow>,
    campaigns: HashMap<Uuid, Campaign>,
    coupons: HashMap<Uuid, Coupon>,
    redemptions: Vec<CouponRedemption>,
    reviews: HashMap<Uuid, Review>,
    wallets: HashMap<Uuid, Wallet>,
    wallet_transactions: Vec<WalletTransaction>,
    payment_methods: HashMap<Uuid, PaymentMethod>,
    tickets: HashMap<Uuid, SupportTicket>,
    ticket_replies: Vec<TicketReply>,
    carts: HashMap<Uuid, Cart>,
}

/// InMemoryRepository
///
/// All tables live behind one `RwLock`, so every call is atomic with respect to the
/// others.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user profile, typically an admin for tests or local demos.
    pub async fn with_user(self, user: User) -> Self {
        self.tables.write().await.users.insert(user.id, user);
        self
    }
}

fn text_matches(needle: &Option<String>, fields: &[&str]) -> bool {
    match needle {
        Some(n) => fields.iter().any(|f| f.to_lowercase().contains(n)),
        None => true,
    }
}

fn compare_brands(column: &str, a: &Brand, b: &Brand) -> Ordering {
    match column {
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_options(column: &str, a: &ProductOption, b: &ProductOption) -> Ordering {
    match column {
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_products(column: &str, a: &Product, b: &Product) -> Ordering {
    match column {
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "price_cents" => a.price_cents.cmp(&b.price_cents),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_inventory(column: &str, a: &InventoryRecord, b: &InventoryRecord) -> Ordering {
    match column {
        "quantity" => a.quantity.cmp(&b.quantity),
        "variant_sku" => a.variant_sku.cmp(&b.variant_sku),
        "created_at" => a.created_at.cmp(&b.created_at),
        _ => a.updated_at.cmp(&b.updated_at),
    }
}

fn compare_campaigns(column: &str, a: &Campaign, b: &Campaign) -> Ordering {
    match column {
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "starts_at" => a.starts_at.cmp(&b.starts_at),
        "ends_at" => a.ends_at.cmp(&b.ends_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_coupons(column: &str, a: &Coupon, b: &Coupon) -> Ordering {
    match column {
        "code" => a.code.cmp(&b.code),
        "usage_count" => a.usage_count.cmp(&b.usage_count),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_reviews(column: &str, a: &Review, b: &Review) -> Ordering {
    match column {
        "rating" => a.rating.cmp(&b.rating),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_wallets(column: &str, a: &Wallet, b: &Wallet) -> Ordering {
    match column {
        "balance_cents" => a.balance_cents.cmp(&b.balance_cents),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn compare_payment_methods(column: &str, a: &PaymentMethod, b: &PaymentMethod) -> Ordering {
    match column {
        "name" => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.sort_order.cmp(&b.sort_order),
    }
}

fn compare_tickets(column: &str, a: &SupportTicket, b: &SupportTicket) -> Ordering {
    match column {
        "created_at" => a.created_at.cmp(&b.created_at),
        _ => a.updated_at.cmp(&b.updated_at),
    }
}

/// Sorts and pages already-filtered rows.
fn page_of<T>(
    mut rows: Vec<T>,
    list: &ListParams,
    cmp: impl Fn(&str, &T, &T) -> Ordering,
) -> Page<T> {
    sort_by_column(&mut rows, list.descending, |a, b| cmp(list.sort_by, a, b));
    list.slice(rows)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> RepoResult<User> {
        let mut t = self.tables.write().await;
        // Like the SQL upsert: email follows the provider, role is never overwritten.
        let stored = t
            .users
            .entry(user.id)
            .and_modify(|existing| existing.email = user.email.clone())
            .or_insert_with(|| user.clone());
        Ok(stored.clone())
    }

    // --- Brands ---

    async fn list_brands(&self, filter: &BrandFilter) -> RepoResult<Page<Brand>> {
        let t = self.tables.read().await;
        let needle = filter.list.needle();
        let rows = t
            .brands
            .values()
            .filter(|b| filter.status.is_none_or(|s| s == b.status))
            .filter(|b| text_matches(&needle, &[&b.name, &b.slug]))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_brands))
    }

    async fn get_brand(&self, id: Uuid) -> RepoResult<Option<Brand>> {
        Ok(self.tables.read().await.brands.get(&id).cloned())
    }

    async fn insert_brand(&self, brand: &Brand) -> RepoResult<Brand> {
        let mut t = self.tables.write().await;
        if t.brands.values().any(|b| b.slug == brand.slug) {
            return Err(RepositoryError::Conflict("Brand".to_string()));
        }
        t.brands.insert(brand.id, brand.clone());
        Ok(brand.clone())
    }

    async fn update_brand(&self, brand: &Brand) -> RepoResult<Option<Brand>> {
        let mut t = self.tables.write().await;
        if t.brands.values().any(|b| b.slug == brand.slug && b.id != brand.id) {
            return Err(RepositoryError::Conflict("Brand".to_string()));
        }
        Ok(t.brands.get_mut(&brand.id).map(|slot| {
            *slot = brand.clone();
            slot.clone()
        }))
    }

    async fn delete_brand(&self, id: Uuid) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.brands.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE SET NULL.
            for product in t.products.values_mut() {
                if product.brand_id == Some(id) {
                    product.brand_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn set_brand_status(&self, id: Uuid, status: RecordStatus) -> RepoResult<Option<Brand>> {
        let mut t = self.tables.write().await;
        Ok(t.brands.get_mut(&id).map(|b| {
            b.status = status;
            b.updated_at = Utc::now();
            b.clone()
        }))
    }

    // --- Options ---

    async fn list_options(&self, filter: &OptionFilter) -> RepoResult<Page<ProductOption>> {
        let t = self.tables.read().await;
        let needle = filter.list.needle();
        let rows = t
            .options
            .values()
            .filter(|o| filter.status.is_none_or(|s| s == o.status))
            .filter(|o| text_matches(&needle, &[&o.name, &o.display_name]))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_options))
    }

    async fn get_option(&self, id: Uuid) -> RepoResult<Option<ProductOption>> {
        Ok(self.tables.read().await.options.get(&id).cloned())
    }

    async fn insert_option(&self, option: &ProductOption) -> RepoResult<ProductOption> {
        let mut t = self.tables.write().await;
        if t.options.values().any(|o| o.name == option.name) {
            return Err(RepositoryError::Conflict("Option".to_string()));
        }
        t.options.insert(option.id, option.clone());
        Ok(option.clone())
    }

    async fn update_option(&self, option: &ProductOption) -> RepoResult<Option<ProductOption>> {
        let mut t = self.tables.write().await;
        if t.options.values().any(|o| o.name == option.name && o.id != option.id) {
            return Err(RepositoryError::Conflict("Option".to_string()));
        }
        Ok(t.options.get_mut(&option.id).map(|slot| {
            *slot = option.clone();
            slot.clone()
        }))
    }

    async fn delete_option(&self, id: Uuid) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.options.remove(&id).is_some();
        if removed {
            for product in t.products.values_mut() {
                product.option_ids.retain(|o| *o != id);
            }
        }
        Ok(removed)
    }

    async fn set_option_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<ProductOption>> {
        let mut t = self.tables.write().await;
        Ok(t.options.get_mut(&id).map(|o| {
            o.status = status;
            o.updated_at = Utc::now();
            o.clone()
        }))
    }

    // --- Products ---

    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<Page<Product>> {
        let t = self.tables.read().await;
        let rows = t
            .products
            .values()
            .filter(|p| p.matches(filter))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_products))
    }

    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> RepoResult<Product> {
        let mut t = self.tables.write().await;
        if t
            .products
            .values()
            .any(|p| p.slug == product.slug || p.sku == product.sku)
        {
            return Err(RepositoryError::Conflict("Product".to_string()));
        }
        t.products.insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn update_product(&self, product: &Product) -> RepoResult<Option<Product>> {
        let mut t = self.tables.write().await;
        if t
            .products
            .values()
            .any(|p| p.id != product.id && (p.slug == product.slug || p.sku == product.sku))
        {
            return Err(RepositoryError::Conflict("Product".to_string()));
        }
        Ok(t.products.get_mut(&product.id).map(|slot| {
            *slot = product.clone();
            slot.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.products.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE CASCADE on inventory and reviews.
            t.inventory.retain(|_, row| row.product_id != id);
            t.reviews.retain(|_, r| r.product_id != id);
        }
        Ok(removed)
    }

    async fn set_product_active(&self, id: Uuid, is_active: bool) -> RepoResult<Option<Product>> {
        let mut t = self.tables.write().await;
        Ok(t.products.get_mut(&id).map(|p| {
            p.is_active = is_active;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    // --- Inventory ---

    async fn list_inventory(&self, filter: &InventoryFilter) -> RepoResult<Page<InventoryRecord>> {
        let t = self.tables.read().await;
        let rows = t
            .inventory
            .values()
            .cloned()
            .map(InventoryRecord::from)
            .filter(|r| filter.matches(r))
            .collect();
        Ok(page_of(rows, &filter.list, compare_inventory))
    }

    async fn get_inventory(&self, id: Uuid) -> RepoResult<Option<InventoryRecord>> {
        let t = self.tables.read().await;
        Ok(t.inventory.get(&id).cloned().map(InventoryRecord::from))
    }

    async fn insert_inventory(&self, row: &InventoryRow) -> RepoResult<InventoryRecord> {
        let mut t = self.tables.write().await;
        if t.inventory.values().any(|r| r.variant_sku == row.variant_sku) {
            return Err(RepositoryError::Conflict("Inventory record".to_string()));
        }
        t.inventory.insert(row.id, row.clone());
        Ok(InventoryRecord::from(row.clone()))
    }

    async fn update_inventory(&self, row: &InventoryRow) -> RepoResult<Option<InventoryRecord>> {
        let mut t = self.tables.write().await;
        if t
            .inventory
            .values()
            .any(|r| r.variant_sku == row.variant_sku && r.id != row.id)
        {
            return Err(RepositoryError::Conflict("Inventory record".to_string()));
        }
        Ok(t.inventory.get_mut(&row.id).map(|slot| {
            *slot = row.clone();
            InventoryRecord::from(slot.clone())
        }))
    }

    async fn adjust_inventory(&self, id: Uuid, delta: i32) -> RepoResult<Option<InventoryRecord>> {
        let mut t = self.tables.write().await;
        let Some(row) = t.inventory.get_mut(&id) else {
            return Ok(None);
        };
        let next = row.quantity.saturating_add(delta);
        if next < 0 {
            return Err(RepositoryError::Rejected("Insufficient stock".to_string()));
        }
        row.quantity = next;
        row.updated_at = Utc::now();
        Ok(Some(InventoryRecord::from(row.clone())))
    }

    async fn delete_inventory(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().await.inventory.remove(&id).is_some())
    }

    // --- Campaigns ---

    async fn list_campaigns(&self, filter: &CampaignFilter) -> RepoResult<Page<Campaign>> {
        let t = self.tables.read().await;
        let needle = filter.list.needle();
        let rows = t
            .campaigns
            .values()
            .filter(|c| filter.status.is_none_or(|s| s == c.status))
            .filter(|c| text_matches(&needle, &[&c.name, &c.code_prefix]))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_campaigns))
    }

    async fn get_campaign(&self, id: Uuid) -> RepoResult<Option<Campaign>> {
        Ok(self.tables.read().await.campaigns.get(&id).cloned())
    }

    async fn insert_campaign(&self, campaign: &Campaign) -> RepoResult<Campaign> {
        let mut t = self.tables.write().await;
        t.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign.clone())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> RepoResult<Option<Campaign>> {
        let mut t = self.tables.write().await;
        Ok(t.campaigns.get_mut(&campaign.id).map(|slot| {
            *slot = campaign.clone();
            slot.clone()
        }))
    }

    async fn delete_campaign(&self, id: Uuid) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.campaigns.remove(&id).is_some();
        if removed {
            t.coupons.retain(|_, c| c.campaign_id != id);
            t.redemptions.retain(|r| r.campaign_id != id);
        }
        Ok(removed)
    }

    async fn set_campaign_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<Campaign>> {
        let mut t = self.tables.write().await;
        Ok(t.campaigns.get_mut(&id).map(|c| {
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    // --- Coupons ---

    async fn list_coupons(&self, filter: &CouponFilter) -> RepoResult<Page<Coupon>> {
        let t = self.tables.read().await;
        let rows = t
            .coupons
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_coupons))
    }

    async fn get_coupon(&self, id: Uuid) -> RepoResult<Option<Coupon>> {
        Ok(self.tables.read().await.coupons.get(&id).cloned())
    }

    async fn get_coupon_by_code(&self, code: &str) -> RepoResult<Option<Coupon>> {
        let t = self.tables.read().await;
        Ok(t.coupons.values().find(|c| c.code == code).cloned())
    }

    async fn insert_coupons(
        &self,
        campaign_id: Uuid,
        coupons: &[Coupon],
    ) -> RepoResult<Option<Vec<Coupon>>> {
        let mut t = self.tables.write().await;
        let Some(campaign) = t.campaigns.get(&campaign_id) else {
            return Ok(None);
        };
        let issued = t
            .coupons
            .values()
            .filter(|c| c.campaign_id == campaign_id)
            .count() as i64;
        campaign
            .coupon_allowance(issued, coupons.len() as i64)
            .map_err(RepositoryError::Rejected)?;

        let mut codes: std::collections::HashSet<&str> =
            t.coupons.values().map(|c| c.code.as_str()).collect();
        if !coupons.iter().all(|c| codes.insert(c.code.as_str())) {
            return Err(RepositoryError::Conflict("Coupon code".to_string()));
        }
        let inserted: Vec<Coupon> = coupons
            .iter()
            .map(|c| Coupon {
                campaign_id,
                ..c.clone()
            })
            .collect();
        for coupon in &inserted {
            t.coupons.insert(coupon.id, coupon.clone());
        }
        Ok(Some(inserted))
    }

    async fn count_campaign_coupons(&self, campaign_id: Uuid) -> RepoResult<i64> {
        let t = self.tables.read().await;
        Ok(t.coupons
            .values()
            .filter(|c| c.campaign_id == campaign_id)
            .count() as i64)
    }

    async fn delete_coupon(&self, id: Uuid) -> RepoResult<bool> {
        let mut t = self.tables.write().await;
        let removed = t.coupons.remove(&id).is_some();
        if removed {
            t.redemptions.retain(|r| r.coupon_id != id);
        }
        Ok(removed)
    }

    async fn set_coupon_status(
        &self,
        id: Uuid,
        status: CouponStatus,
    ) -> RepoResult<Option<Coupon>> {
        let mut t = self.tables.write().await;
        Ok(t.coupons.get_mut(&id).map(|c| {
            c.status = status;
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn count_user_redemptions(&self, campaign_id: Uuid, user_id: Uuid) -> RepoResult<i64> {
        let t = self.tables.read().await;
        Ok(t.redemptions
            .iter()
            .filter(|r| r.campaign_id == campaign_id && r.user_id == user_id)
            .count() as i64)
    }

    async fn record_redemption(&self, redemption: &CouponRedemption) -> RepoResult<Option<Coupon>> {
        let mut t = self.tables.write().await;
        let Some(campaign) = t.campaigns.get(&redemption.campaign_id) else {
            return Ok(None);
        };
        let Some(coupon) = t
            .coupons
            .get(&redemption.coupon_id)
            .filter(|c| c.campaign_id == redemption.campaign_id)
        else {
            return Ok(None);
        };
        let used = t
            .redemptions
            .iter()
            .filter(|r| r.campaign_id == redemption.campaign_id && r.user_id == redemption.user_id)
            .count() as i64;
        coupon
            .evaluate(
                campaign,
                redemption.user_id,
                used,
                redemption.subtotal_cents,
                redemption.created_at,
            )
            .map_err(|reason| RepositoryError::Rejected(reason.to_string()))?;

        let updated = coupon.clone().redeemed_once(redemption.created_at);
        t.coupons.insert(updated.id, updated.clone());
        t.redemptions.push(redemption.clone());
        Ok(Some(updated))
    }

    // --- Reviews ---

    async fn list_reviews(&self, filter: &ReviewFilter) -> RepoResult<Page<Review>> {
        let t = self.tables.read().await;
        let rows = t
            .reviews
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_reviews))
    }

    async fn get_review(&self, id: Uuid) -> RepoResult<Option<Review>> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn insert_review(&self, review: &Review) -> RepoResult<Review> {
        let mut t = self.tables.write().await;
        if t
            .reviews
            .values()
            .any(|r| r.product_id == review.product_id && r.user_id == review.user_id)
        {
            return Err(RepositoryError::Conflict("Review".to_string()));
        }
        t.reviews.insert(review.id, review.clone());
        Ok(review.clone())
    }

    async fn set_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
    ) -> RepoResult<Option<Review>> {
        let mut t = self.tables.write().await;
        Ok(t.reviews.get_mut(&id).map(|r| {
            r.status = status;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn delete_review(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().await.reviews.remove(&id).is_some())
    }

    // --- Wallets ---

    async fn list_wallets(&self, filter: &WalletFilter) -> RepoResult<Page<Wallet>> {
        let t = self.tables.read().await;
        let needle = filter.list.needle();
        let rows = t
            .wallets
            .values()
            .filter(|w| filter.status.is_none_or(|s| s == w.status))
            .filter(|w| {
                let email = t.users.get(&w.user_id).map(|u| u.email.as_str()).unwrap_or("");
                text_matches(&needle, &[email, &w.currency])
            })
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_wallets))
    }

    async fn get_wallet(&self, id: Uuid) -> RepoResult<Option<Wallet>> {
        Ok(self.tables.read().await.wallets.get(&id).cloned())
    }

    async fn get_wallet_by_user(&self, user_id: Uuid) -> RepoResult<Option<Wallet>> {
        let t = self.tables.read().await;
        Ok(t.wallets.values().find(|w| w.user_id == user_id).cloned())
    }

    async fn insert_wallet(&self, wallet: &Wallet) -> RepoResult<Wallet> {
        let mut t = self.tables.write().await;
        if t.wallets.values().any(|w| w.user_id == wallet.user_id) {
            return Err(RepositoryError::Conflict("Wallet".to_string()));
        }
        t.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet.clone())
    }

    async fn set_wallet_status(
        &self,
        id: Uuid,
        status: WalletStatus,
    ) -> RepoResult<Option<Wallet>> {
        let mut t = self.tables.write().await;
        Ok(t.wallets.get_mut(&id).map(|w| {
            w.status = status;
            w.updated_at = Utc::now();
            w.clone()
        }))
    }

    async fn apply_wallet_movement(
        &self,
        wallet_id: Uuid,
        kind: TransactionKind,
        amount_cents: i64,
        note: Option<String>,
    ) -> RepoResult<Option<WalletMovement>> {
        let mut t = self.tables.write().await;
        let Some(wallet) = t.wallets.get_mut(&wallet_id) else {
            return Ok(None);
        };
        let balance = wallet
            .balance_after(kind, amount_cents)
            .map_err(|e| RepositoryError::Rejected(e.to_string()))?;
        let now = Utc::now();
        wallet.balance_cents = balance;
        wallet.updated_at = now;
        let wallet = wallet.clone();

        let transaction = WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount_cents,
            balance_after_cents: balance,
            note,
            created_at: now,
        };
        t.wallet_transactions.push(transaction.clone());
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
        let t = self.tables.read().await;
        let mut rows: Vec<WalletTransaction> = t
            .wallet_transactions
            .iter()
            .filter(|tx| tx.wallet_id == wallet_id)
            .cloned()
            .collect();
        // Ledger is always newest first.
        rows.reverse();
        Ok(list.slice(rows))
    }

    // --- Payment methods ---

    async fn list_payment_methods(
        &self,
        filter: &PaymentMethodFilter,
    ) -> RepoResult<Page<PaymentMethod>> {
        let t = self.tables.read().await;
        let needle = filter.list.needle();
        let rows = t
            .payment_methods
            .values()
            .filter(|m| filter.status.is_none_or(|s| s == m.status))
            .filter(|m| text_matches(&needle, &[&m.name, &m.code, &m.provider]))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_payment_methods))
    }

    async fn get_payment_method(&self, id: Uuid) -> RepoResult<Option<PaymentMethod>> {
        Ok(self.tables.read().await.payment_methods.get(&id).cloned())
    }

    async fn insert_payment_method(&self, method: &PaymentMethod) -> RepoResult<PaymentMethod> {
        let mut t = self.tables.write().await;
        if t.payment_methods.values().any(|m| m.code == method.code) {
            return Err(RepositoryError::Conflict("Payment method".to_string()));
        }
        t.payment_methods.insert(method.id, method.clone());
        Ok(method.clone())
    }

    async fn update_payment_method(
        &self,
        method: &PaymentMethod,
    ) -> RepoResult<Option<PaymentMethod>> {
        let mut t = self.tables.write().await;
        if t
            .payment_methods
            .values()
            .any(|m| m.code == method.code && m.id != method.id)
        {
            return Err(RepositoryError::Conflict("Payment method".to_string()));
        }
        Ok(t.payment_methods.get_mut(&method.id).map(|slot| {
            *slot = method.clone();
            slot.clone()
        }))
    }

    async fn delete_payment_method(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.tables.write().await.payment_methods.remove(&id).is_some())
    }

    async fn set_payment_method_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<PaymentMethod>> {
        let mut t = self.tables.write().await;
        Ok(t.payment_methods.get_mut(&id).map(|m| {
            m.status = status;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    // --- Support tickets ---

    async fn list_tickets(&self, filter: &TicketFilter) -> RepoResult<Page<SupportTicket>> {
        let t = self.tables.read().await;
        let rows = t
            .tickets
            .values()
            .filter(|tk| filter.matches(tk))
            .cloned()
            .collect();
        Ok(page_of(rows, &filter.list, compare_tickets))
    }

    async fn get_ticket(&self, id: Uuid) -> RepoResult<Option<SupportTicket>> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn insert_ticket(&self, ticket: &SupportTicket) -> RepoResult<SupportTicket> {
        let mut t = self.tables.write().await;
        t.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket.clone())
    }

    async fn update_ticket(&self, ticket: &SupportTicket) -> RepoResult<Option<SupportTicket>> {
        let mut t = self.tables.write().await;
        Ok(t.tickets.get_mut(&ticket.id).map(|slot| {
            *slot = ticket.clone();
            slot.clone()
        }))
    }

    async fn add_ticket_reply(
        &self,
        reply: &TicketReply,
        status: TicketStatus,
    ) -> RepoResult<TicketReply> {
        let mut t = self.tables.write().await;
        let Some(ticket) = t.tickets.get_mut(&reply.ticket_id) else {
            return Err(RepositoryError::Rejected("Ticket no longer exists".to_string()));
        };
        ticket.status = status;
        ticket.updated_at = reply.created_at;
        t.ticket_replies.push(reply.clone());
        Ok(reply.clone())
    }

    async fn list_ticket_replies(&self, ticket_id: Uuid) -> RepoResult<Vec<TicketReply>> {
        let t = self.tables.read().await;
        Ok(t.ticket_replies
            .iter()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    // --- Carts ---

    async fn get_cart(&self, user_id: Uuid) -> RepoResult<Option<Cart>> {
        Ok(self.tables.read().await.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> RepoResult<Cart> {
        let mut t = self.tables.write().await;
        // The first stored cart keeps its identity, like the SQL upsert.
        let stored = match t.carts.get(&cart.user_id) {
            Some(existing) => Cart {
                id: existing.id,
                created_at: existing.created_at,
                ..cart.clone()
            },
            None => cart.clone(),
        };
        t.carts.insert(cart.user_id, stored.clone());
        Ok(stored)
    }

    // --- Dashboard ---

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let t = self.tables.read().await;
        let stock: Vec<StockStatus> = t
            .inventory
            .values()
            .map(|r| StockStatus::derive(r.quantity, r.low_stock_threshold))
            .collect();
        Ok(AdminDashboardStats {
            total_products: t.products.len() as i64,
            active_products: t.products.values().filter(|p| p.is_active).count() as i64,
            low_stock_items: stock.iter().filter(|s| **s == StockStatus::LowStock).count() as i64,
            out_of_stock_items: stock
                .iter()
                .filter(|s| **s == StockStatus::OutOfStock)
                .count() as i64,
            pending_reviews: t
                .reviews
                .values()
                .filter(|r| r.status == ReviewStatus::Pending)
                .count() as i64,
            open_tickets: t
                .tickets
                .values()
                .filter(|tk| matches!(tk.status, TicketStatus::Open | TicketStatus::InProgress))
                .count() as i64,
            active_campaigns: t
                .campaigns
                .values()
                .filter(|c| c.status == RecordStatus::Active)
                .count() as i64,
            total_wallet_balance_cents: t.wallets.values().map(|w| w.balance_cents).sum(),
        })
    }
}
