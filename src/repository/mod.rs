use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AdminDashboardStats, Brand, BrandFilter, Campaign, CampaignFilter, Cart, Coupon, CouponFilter,
    CouponRedemption, CouponStatus, InventoryFilter, InventoryRecord, InventoryRow, ListParams,
    OptionFilter, Page, PaymentMethod, PaymentMethodFilter, Product, ProductFilter, ProductOption,
    RecordStatus, Review, ReviewFilter, ReviewStatus, SupportTicket, TicketFilter, TicketReply,
    TicketStatus, TransactionKind, User, Wallet, WalletFilter, WalletMovement, WalletStatus,
    WalletTransaction,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Persistence failures. `Conflict` and `Rejected` are expected outcomes (unique keys,
/// guarded updates that lost their precondition); `Database` is a genuine fault.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint was hit; carries the human name of the entity.
    #[error("{0} already exists")]
    Conflict(String),

    /// A guarded write found its precondition no longer held.
    #[error("{0}")]
    Rejected(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract used by every handler. Handlers build fully-formed
/// entities (ids, timestamps, validated fields) and the repository stores them, so
/// both implementations stay free of business rules beyond filtering and paging.
///
/// `Send + Sync + async_trait` make `Arc<dyn Repository>` shareable across axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn upsert_user(&self, user: &User) -> RepoResult<User>;

    // --- Brands ---
    async fn list_brands(&self, filter: &BrandFilter) -> RepoResult<Page<Brand>>;
    async fn get_brand(&self, id: Uuid) -> RepoResult<Option<Brand>>;
    async fn insert_brand(&self, brand: &Brand) -> RepoResult<Brand>;
    async fn update_brand(&self, brand: &Brand) -> RepoResult<Option<Brand>>;
    async fn delete_brand(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_brand_status(&self, id: Uuid, status: RecordStatus) -> RepoResult<Option<Brand>>;

    // --- Options ---
    async fn list_options(&self, filter: &OptionFilter) -> RepoResult<Page<ProductOption>>;
    async fn get_option(&self, id: Uuid) -> RepoResult<Option<ProductOption>>;
    async fn insert_option(&self, option: &ProductOption) -> RepoResult<ProductOption>;
    async fn update_option(&self, option: &ProductOption) -> RepoResult<Option<ProductOption>>;
    async fn delete_option(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_option_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<ProductOption>>;

    // --- Products ---
    async fn list_products(&self, filter: &ProductFilter) -> RepoResult<Page<Product>>;
    async fn get_product(&self, id: Uuid) -> RepoResult<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> RepoResult<Product>;
    async fn update_product(&self, product: &Product) -> RepoResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_product_active(&self, id: Uuid, is_active: bool) -> RepoResult<Option<Product>>;

    // --- Inventory ---
    async fn list_inventory(&self, filter: &InventoryFilter) -> RepoResult<Page<InventoryRecord>>;
    async fn get_inventory(&self, id: Uuid) -> RepoResult<Option<InventoryRecord>>;
    async fn insert_inventory(&self, row: &InventoryRow) -> RepoResult<InventoryRecord>;
    async fn update_inventory(&self, row: &InventoryRow) -> RepoResult<Option<InventoryRecord>>;
    /// Atomically adds `delta`; `Rejected` if the result would be negative.
    async fn adjust_inventory(&self, id: Uuid, delta: i32) -> RepoResult<Option<InventoryRecord>>;
    async fn delete_inventory(&self, id: Uuid) -> RepoResult<bool>;

    // --- Campaigns ---
    async fn list_campaigns(&self, filter: &CampaignFilter) -> RepoResult<Page<Campaign>>;
    async fn get_campaign(&self, id: Uuid) -> RepoResult<Option<Campaign>>;
    async fn insert_campaign(&self, campaign: &Campaign) -> RepoResult<Campaign>;
    async fn update_campaign(&self, campaign: &Campaign) -> RepoResult<Option<Campaign>>;
    /// Deletes the campaign together with its coupons.
    async fn delete_campaign(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_campaign_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<Campaign>>;

    // --- Coupons ---
    async fn list_coupons(&self, filter: &CouponFilter) -> RepoResult<Page<Coupon>>;
    async fn get_coupon(&self, id: Uuid) -> RepoResult<Option<Coupon>>;
    async fn get_coupon_by_code(&self, code: &str) -> RepoResult<Option<Coupon>>;
    /// Inserts all coupons of `campaign_id` or none. The campaign's `usage_limit` is
    /// checked against the stored count in the same write: `Rejected` when the batch
    /// would exceed it, `Conflict` on a duplicate code, `None` when the campaign is gone.
    async fn insert_coupons(
        &self,
        campaign_id: Uuid,
        coupons: &[Coupon],
    ) -> RepoResult<Option<Vec<Coupon>>>;
    async fn count_campaign_coupons(&self, campaign_id: Uuid) -> RepoResult<i64>;
    async fn delete_coupon(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_coupon_status(&self, id: Uuid, status: CouponStatus)
    -> RepoResult<Option<Coupon>>;
    async fn count_user_redemptions(&self, campaign_id: Uuid, user_id: Uuid) -> RepoResult<i64>;
    /// Consumes one use of the coupon and records the redemption. Every coupon rule is
    /// re-evaluated against the locked coupon and campaign at `redemption.created_at`;
    /// a failing rule is `Rejected` with its reason. `None` when either row is gone.
    async fn record_redemption(&self, redemption: &CouponRedemption) -> RepoResult<Option<Coupon>>;

    // --- Reviews ---
    async fn list_reviews(&self, filter: &ReviewFilter) -> RepoResult<Page<Review>>;
    async fn get_review(&self, id: Uuid) -> RepoResult<Option<Review>>;
    /// `Conflict` if the user already reviewed the product.
    async fn insert_review(&self, review: &Review) -> RepoResult<Review>;
    async fn set_review_status(&self, id: Uuid, status: ReviewStatus)
    -> RepoResult<Option<Review>>;
    async fn delete_review(&self, id: Uuid) -> RepoResult<bool>;

    // --- Wallets ---
    async fn list_wallets(&self, filter: &WalletFilter) -> RepoResult<Page<Wallet>>;
    async fn get_wallet(&self, id: Uuid) -> RepoResult<Option<Wallet>>;
    async fn get_wallet_by_user(&self, user_id: Uuid) -> RepoResult<Option<Wallet>>;
    /// `Conflict` if the user already owns a wallet.
    async fn insert_wallet(&self, wallet: &Wallet) -> RepoResult<Wallet>;
    async fn set_wallet_status(&self, id: Uuid, status: WalletStatus)
    -> RepoResult<Option<Wallet>>;
    /// Moves the balance and appends the ledger line in one unit. The status and
    /// balance guards are re-checked at write time (`Rejected` if they fail).
    async fn apply_wallet_movement(
        &self,
        wallet_id: Uuid,
        kind: TransactionKind,
        amount_cents: i64,
        note: Option<String>,
    ) -> RepoResult<Option<WalletMovement>>;
    async fn list_wallet_transactions(
        &self,
        wallet_id: Uuid,
        list: &ListParams,
    ) -> RepoResult<Page<WalletTransaction>>;

    // --- Payment methods ---
    async fn list_payment_methods(
        &self,
        filter: &PaymentMethodFilter,
    ) -> RepoResult<Page<PaymentMethod>>;
    async fn get_payment_method(&self, id: Uuid) -> RepoResult<Option<PaymentMethod>>;
    async fn insert_payment_method(&self, method: &PaymentMethod) -> RepoResult<PaymentMethod>;
    async fn update_payment_method(
        &self,
        method: &PaymentMethod,
    ) -> RepoResult<Option<PaymentMethod>>;
    async fn delete_payment_method(&self, id: Uuid) -> RepoResult<bool>;
    async fn set_payment_method_status(
        &self,
        id: Uuid,
        status: RecordStatus,
    ) -> RepoResult<Option<PaymentMethod>>;

    // --- Support tickets ---
    async fn list_tickets(&self, filter: &TicketFilter) -> RepoResult<Page<SupportTicket>>;
    async fn get_ticket(&self, id: Uuid) -> RepoResult<Option<SupportTicket>>;
    async fn insert_ticket(&self, ticket: &SupportTicket) -> RepoResult<SupportTicket>;
    async fn update_ticket(&self, ticket: &SupportTicket) -> RepoResult<Option<SupportTicket>>;
    /// Appends the reply and moves the ticket to `status`.
    async fn add_ticket_reply(
        &self,
        reply: &TicketReply,
        status: TicketStatus,
    ) -> RepoResult<TicketReply>;
    async fn list_ticket_replies(&self, ticket_id: Uuid) -> RepoResult<Vec<TicketReply>>;

    // --- Carts ---
    async fn get_cart(&self, user_id: Uuid) -> RepoResult<Option<Cart>>;
    /// Replaces the stored cart (header and all lines) with `cart`.
    async fn save_cart(&self, cart: &Cart) -> RepoResult<Cart>;

    // --- Dashboard ---
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats>;
}

/// RepositoryState
///
/// The shared persistence handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
