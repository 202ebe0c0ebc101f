//! Runs the repository contract against a real database. Skipped unless
//! `DATABASE_URL` is set (a `.env` file is honoured).

mod common;

use chrono::{Duration, Utc};
use commerce_api::{
    PostgresRepository,
    models::{
        Campaign, Cart, Coupon, CouponRedemption, CouponStatus, DiscountType, InventoryFilter,
        InventoryRow, ListParams, Product, ProductFilter, ProductQuery, RecordStatus,
        StockStatus, TransactionKind, Wallet, WalletStatus,
    },
    repository::{Repository, RepositoryError},
};
use common::product;
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres repository tests");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Short unique tag; the database outlives a single run, so every key carries one.
fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn tagged_product(name: &str, category: &str, price_cents: i64, tag: &str) -> Product {
    product(&format!("{name} {tag}"), category, price_cents, true)
}

fn campaign(usage_limit: Option<i64>) -> Campaign {
    let now = Utc::now();
    Campaign {
        id: Uuid::new_v4(),
        name: "Launch".to_string(),
        description: None,
        code_prefix: "LAUNCH".to_string(),
        discount_type: DiscountType::Fixed,
        discount_value: 500,
        min_order_cents: 0,
        max_discount_cents: None,
        starts_at: now - Duration::minutes(1),
        ends_at: now + Duration::days(1),
        usage_limit,
        per_user_limit: 1,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

fn coupon(campaign_id: Uuid, code: String, max_uses: i64) -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4(),
        campaign_id,
        code,
        user_id: None,
        status: CouponStatus::Active,
        usage_count: 0,
        max_uses,
        created_at: now,
        updated_at: now,
    }
}

fn redemption(coupon: &Coupon, user_id: Uuid) -> CouponRedemption {
    CouponRedemption {
        id: Uuid::new_v4(),
        coupon_id: coupon.id,
        campaign_id: coupon.campaign_id,
        user_id,
        subtotal_cents: 5000,
        discount_cents: 500,
        created_at: Utc::now(),
    }
}

fn rejection<T: std::fmt::Debug>(result: Result<T, RepositoryError>) -> String {
    match result {
        Err(RepositoryError::Rejected(msg)) => msg,
        other => panic!("expected rejection, got {other:?}"),
    }
}

// --- Tests ---

#[tokio::test]
#[serial]
async fn test_postgres_redemption_rechecks_rules_under_lock() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let campaign = repo.insert_campaign(&campaign(None)).await.unwrap();
    let shared = coupon(campaign.id, format!("PG-{}", tag()), 2);
    repo.insert_coupons(campaign.id, std::slice::from_ref(&shared))
        .await
        .unwrap()
        .unwrap();

    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    let stored = repo
        .record_redemption(&redemption(&shared, first))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.usage_count, 1);

    let msg = rejection(repo.record_redemption(&redemption(&shared, first)).await);
    assert!(msg.contains("maximum number of times"));

    let stored = repo
        .record_redemption(&redemption(&shared, second))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, CouponStatus::Redeemed);

    let msg = rejection(
        repo.record_redemption(&redemption(&shared, Uuid::new_v4()))
            .await,
    );
    assert_eq!(msg, "Coupon usage limit reached");
    assert_eq!(repo.count_user_redemptions(campaign.id, first).await.unwrap(), 1);

    assert!(repo.delete_campaign(campaign.id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn test_postgres_concurrent_redemptions_of_last_use() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let campaign = repo.insert_campaign(&campaign(None)).await.unwrap();
    let single = coupon(campaign.id, format!("PG-{}", tag()), 1);
    repo.insert_coupons(campaign.id, std::slice::from_ref(&single))
        .await
        .unwrap()
        .unwrap();

    let first = redemption(&single, Uuid::new_v4());
    let second = redemption(&single, Uuid::new_v4());
    let (a, b) = tokio::join!(
        repo.record_redemption(&first),
        repo.record_redemption(&second),
    );
    let won = [&a, &b].iter().filter(|r| matches!(r, Ok(Some(_)))).count();
    assert_eq!(won, 1, "exactly one redemption may take the last use: {a:?} {b:?}");

    let stored = repo.get_coupon(single.id).await.unwrap().unwrap();
    assert_eq!(stored.usage_count, 1);
    assert_eq!(stored.status, CouponStatus::Redeemed);

    repo.delete_campaign(campaign.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_postgres_coupon_batch_respects_usage_limit() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let campaign = repo.insert_campaign(&campaign(Some(2))).await.unwrap();
    let t = tag();
    let batch: Vec<Coupon> = (1..=3)
        .map(|n| coupon(campaign.id, format!("PG-{t}-{n}"), 1))
        .collect();

    let msg = rejection(repo.insert_coupons(campaign.id, &batch).await);
    assert_eq!(msg, "Campaign allows 2 coupons, 0 already issued");
    assert_eq!(repo.count_campaign_coupons(campaign.id).await.unwrap(), 0);

    let stored = repo
        .insert_coupons(campaign.id, &batch[..2])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(matches!(
        repo.insert_coupons(campaign.id, &batch[..1]).await,
        Err(RepositoryError::Rejected(_))
    ));
    assert!(
        repo.insert_coupons(Uuid::new_v4(), &batch[2..])
            .await
            .unwrap()
            .is_none()
    );

    repo.delete_campaign(campaign.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_postgres_wallet_movements_keep_ledger() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let now = Utc::now();
    let user_id = Uuid::new_v4();
    let wallet = repo
        .insert_wallet(&Wallet {
            id: Uuid::new_v4(),
            user_id,
            balance_cents: 0,
            currency: "USD".to_string(),
            status: WalletStatus::Active,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    repo.apply_wallet_movement(wallet.id, TransactionKind::Credit, 1000, None)
        .await
        .unwrap();
    repo.apply_wallet_movement(wallet.id, TransactionKind::Debit, 400, Some("order".into()))
        .await
        .unwrap();
    let msg = rejection(
        repo.apply_wallet_movement(wallet.id, TransactionKind::Debit, 601, None)
            .await,
    );
    assert_eq!(msg, "Insufficient balance");

    let ledger = repo
        .list_wallet_transactions(wallet.id, &ListParams::default())
        .await
        .unwrap();
    assert_eq!(ledger.total, 2);
    assert_eq!(ledger.items[0].kind, TransactionKind::Debit);
    assert_eq!(ledger.items[0].balance_after_cents, 600);
    assert_eq!(
        repo.get_wallet_by_user(user_id)
            .await
            .unwrap()
            .unwrap()
            .balance_cents,
        600
    );
}

#[tokio::test]
#[serial]
async fn test_postgres_concurrent_first_carts_share_one_identity() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let t = tag();
    let shoe = repo
        .insert_product(&tagged_product("Trail Runner", "shoes", 8999, &t))
        .await
        .unwrap();
    let tee = repo
        .insert_product(&tagged_product("Alpha Tee", "shirts", 1999, &t))
        .await
        .unwrap();

    let now = Utc::now();
    let user_id = Uuid::new_v4();
    let mut first = Cart::new(user_id, now);
    first.add_item(&shoe, 1, now).unwrap();
    let mut second = Cart::new(user_id, now);
    second.add_item(&tee, 2, now).unwrap();

    let (a, b) = tokio::join!(repo.save_cart(&first), repo.save_cart(&second));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);

    let stored = repo.get_cart(user_id).await.unwrap().unwrap();
    assert_eq!(stored.id, a.id);
    assert_eq!(stored.items.len(), 1);

    repo.delete_product(shoe.id).await.unwrap();
    repo.delete_product(tee.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_postgres_inventory_stock_filter() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let t = tag();
    let shoe = repo
        .insert_product(&tagged_product("Trail Runner", "shoes", 8999, &t))
        .await
        .unwrap();
    let now = Utc::now();
    for (suffix, quantity) in [("EMPTY", 0), ("LOW", 3), ("PLENTY", 50)] {
        repo.insert_inventory(&InventoryRow {
            id: Uuid::new_v4(),
            product_id: shoe.id,
            variant_sku: format!("{t}-{suffix}"),
            quantity,
            low_stock_threshold: 5,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    }

    let filter = |stock_status| InventoryFilter {
        product_id: Some(shoe.id),
        stock_status: Some(stock_status),
        ..Default::default()
    };
    let low = repo.list_inventory(&filter(StockStatus::LowStock)).await.unwrap();
    assert_eq!(low.total, 1);
    assert_eq!(low.items[0].variant_sku, format!("{t}-LOW"));
    assert_eq!(low.items[0].stock_status, StockStatus::LowStock);

    let out = repo.list_inventory(&filter(StockStatus::OutOfStock)).await.unwrap();
    assert_eq!(out.items[0].variant_sku, format!("{t}-EMPTY"));

    let plenty = repo.list_inventory(&filter(StockStatus::InStock)).await.unwrap();
    let id = plenty.items[0].id;
    assert!(matches!(
        repo.adjust_inventory(id, -51).await,
        Err(RepositoryError::Rejected(_))
    ));
    let record = repo.adjust_inventory(id, -50).await.unwrap().unwrap();
    assert_eq!(record.stock_status, StockStatus::OutOfStock);

    repo.delete_product(shoe.id).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_postgres_product_paging_sorting_and_literal_search() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let repo = ctx.repository();
    let t = tag();
    let category = format!("tees-{t}");
    let mut ids = Vec::new();
    for (name, price) in [
        ("Tee 100_A", 2500),
        ("Tee 100XA", 1500),
        ("Tee 50%", 3500),
        ("Tee Plain", 500),
    ] {
        let stored = repo
            .insert_product(&tagged_product(name, &category, price, &t))
            .await
            .unwrap();
        ids.push(stored.id);
    }

    let query = ProductQuery {
        category: Some(category.clone()),
        ..Default::default()
    };
    let list = ListParams {
        page: 2,
        limit: 2,
        sort_by: "price_cents",
        descending: false,
        ..Default::default()
    };
    let page = repo
        .list_products(&ProductFilter::storefront(list, query.clone()))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    let prices: Vec<i64> = page.items.iter().map(|p| p.price_cents).collect();
    assert_eq!(prices, vec![2500, 3500]);

    for (needle, expected) in [("100_A", "Tee 100_A"), ("50%", "Tee 50%")] {
        let list = ListParams {
            search: Some(needle.to_string()),
            ..Default::default()
        };
        let found = repo
            .list_products(&ProductFilter::storefront(list, query.clone()))
            .await
            .unwrap();
        assert_eq!(found.total, 1, "search {needle:?} must match literally");
        assert_eq!(found.items[0].name, format!("{expected} {t}"));
    }

    for id in ids {
        repo.delete_product(id).await.unwrap();
    }
}
