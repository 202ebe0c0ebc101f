mod common;

use chrono::Utc;
use commerce_api::{
    InMemoryRepository,
    models::{
        Campaign, Cart, Coupon, CouponRedemption, CouponStatus, DiscountType, InventoryFilter,
        InventoryRow, ListParams, ProductFilter, ProductQuery, ROLE_ADMIN, ROLE_CUSTOMER,
        RecordStatus, Review, ReviewStatus, StockStatus, TransactionKind, User, Wallet,
        WalletStatus,
    },
    repository::{Repository, RepositoryError},
};
use common::*;
use uuid::Uuid;

fn inventory_row(product_id: Uuid, sku: &str, quantity: i32) -> InventoryRow {
    let now = Utc::now();
    InventoryRow {
        id: Uuid::new_v4(),
        product_id,
        variant_sku: sku.to_string(),
        quantity,
        low_stock_threshold: 5,
        created_at: now,
        updated_at: now,
    }
}

fn campaign() -> Campaign {
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
        starts_at: now,
        ends_at: now + chrono::Duration::days(1),
        usage_limit: None,
        per_user_limit: 1,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

fn coupon(campaign_id: Uuid, code: &str, max_uses: i64) -> Coupon {
    let now = Utc::now();
    Coupon {
        id: Uuid::new_v4(),
        campaign_id,
        code: code.to_string(),
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

#[tokio::test]
async fn test_upsert_user_keeps_existing_role() {
    let repo = InMemoryRepository::new();
    let id = Uuid::new_v4();
    repo.upsert_user(&User {
        id,
        email: "staff@shop.test".to_string(),
        role: ROLE_ADMIN.to_string(),
    })
    .await
    .unwrap();

    // A later login mirrors the profile as a customer; the role must survive.
    let stored = repo
        .upsert_user(&User {
            id,
            email: "staff+new@shop.test".to_string(),
            role: ROLE_CUSTOMER.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(stored.role, ROLE_ADMIN);
    assert_eq!(stored.email, "staff+new@shop.test");
}

#[tokio::test]
async fn test_duplicate_product_keys_conflict() {
    let repo = InMemoryRepository::new();
    let original = product("Trail Runner", "shoes", 8999, true);
    repo.insert_product(&original).await.unwrap();

    let same_slug = commerce_api::models::Product {
        id: Uuid::new_v4(),
        sku: "OTHER-SKU".to_string(),
        ..original.clone()
    };
    assert!(matches!(
        repo.insert_product(&same_slug).await,
        Err(RepositoryError::Conflict(_))
    ));

    let same_sku = commerce_api::models::Product {
        id: Uuid::new_v4(),
        slug: "other-slug".to_string(),
        ..original
    };
    assert!(matches!(
        repo.insert_product(&same_sku).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_delete_product_cascades() {
    let repo = InMemoryRepository::new();
    let shoe = repo
        .insert_product(&product("Trail Runner", "shoes", 8999, true))
        .await
        .unwrap();
    let row = repo
        .insert_inventory(&inventory_row(shoe.id, "TR-42", 10))
        .await
        .unwrap();
    let now = Utc::now();
    let review = repo
        .insert_review(&Review {
            id: Uuid::new_v4(),
            product_id: shoe.id,
            user_id: CUSTOMER_ID,
            rating: 5,
            title: "Love them".to_string(),
            body: "Best shoes I have owned.".to_string(),
            status: ReviewStatus::Approved,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    assert!(repo.delete_product(shoe.id).await.unwrap());
    assert!(repo.get_inventory(row.id).await.unwrap().is_none());
    assert!(repo.get_review(review.id).await.unwrap().is_none());
    assert!(!repo.delete_product(shoe.id).await.unwrap());
}

#[tokio::test]
async fn test_inventory_stock_filter_and_guarded_adjustment() {
    let repo = InMemoryRepository::new();
    let product_id = Uuid::new_v4();
    repo.insert_inventory(&inventory_row(product_id, "SKU-EMPTY", 0))
        .await
        .unwrap();
    repo.insert_inventory(&inventory_row(product_id, "SKU-LOW", 3))
        .await
        .unwrap();
    let plenty = repo
        .insert_inventory(&inventory_row(product_id, "SKU-PLENTY", 50))
        .await
        .unwrap();

    let low = repo
        .list_inventory(&InventoryFilter {
            stock_status: Some(StockStatus::LowStock),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(low.total, 1);
    assert_eq!(low.items[0].variant_sku, "SKU-LOW");

    assert!(matches!(
        repo.adjust_inventory(plenty.id, -51).await,
        Err(RepositoryError::Rejected(_))
    ));
    let record = repo.adjust_inventory(plenty.id, -50).await.unwrap().unwrap();
    assert_eq!(record.stock_status, StockStatus::OutOfStock);
    assert!(repo.adjust_inventory(Uuid::new_v4(), 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_product_listing_filters_before_paging() {
    let repo = InMemoryRepository::new();
    for (name, active) in [
        ("Alpha Tee", true),
        ("Bravo Tee", false),
        ("Charlie Tee", true),
        ("Delta Tee", true),
    ] {
        repo.insert_product(&product(name, "shirts", 1999, active))
            .await
            .unwrap();
    }

    let list = ListParams {
        page: 1,
        limit: 2,
        sort_by: "name",
        descending: false,
        ..Default::default()
    };
    let page = repo
        .list_products(&ProductFilter::storefront(list.clone(), ProductQuery::default()))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha Tee", "Charlie Tee"]);

    let admin_page = repo
        .list_products(&ProductFilter::admin(list, ProductQuery::default()))
        .await
        .unwrap();
    assert_eq!(admin_page.total, 4);
}

#[tokio::test]
async fn test_coupon_batch_is_all_or_nothing() {
    let repo = InMemoryRepository::new();
    let campaign = repo.insert_campaign(&campaign()).await.unwrap();
    repo.insert_coupons(campaign.id, &[coupon(campaign.id, "LAUNCH-AAAA", 1)])
        .await
        .unwrap();

    let batch = [
        coupon(campaign.id, "LAUNCH-BBBB", 1),
        coupon(campaign.id, "LAUNCH-AAAA", 1),
    ];
    assert!(matches!(
        repo.insert_coupons(campaign.id, &batch).await,
        Err(RepositoryError::Conflict(_))
    ));
    assert_eq!(repo.count_campaign_coupons(campaign.id).await.unwrap(), 1);
    assert!(repo.get_coupon_by_code("LAUNCH-BBBB").await.unwrap().is_none());
}

#[tokio::test]
async fn test_redemption_exhausts_coupon() {
    let repo = InMemoryRepository::new();
    let campaign = repo.insert_campaign(&campaign()).await.unwrap();
    let code = coupon(campaign.id, "LAUNCH-TWICE", 2);
    repo.insert_coupons(campaign.id, std::slice::from_ref(&code))
        .await
        .unwrap();

    let first = repo
        .record_redemption(&redemption(&code, CUSTOMER_ID))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.usage_count, 1);
    assert_eq!(first.status, CouponStatus::Active);

    let second = repo
        .record_redemption(&redemption(&code, OTHER_CUSTOMER_ID))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.status, CouponStatus::Redeemed);

    match repo.record_redemption(&redemption(&code, CUSTOMER_ID)).await {
        Err(RepositoryError::Rejected(msg)) => assert_eq!(msg, "Coupon usage limit reached"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(
        repo.count_user_redemptions(campaign.id, CUSTOMER_ID)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_coupon_batch_respects_usage_limit_at_write() {
    let repo = InMemoryRepository::new();
    let campaign = repo
        .insert_campaign(&Campaign {
            usage_limit: Some(2),
            ..campaign()
        })
        .await
        .unwrap();

    let batch = [
        coupon(campaign.id, "LAUNCH-ONE", 1),
        coupon(campaign.id, "LAUNCH-TWO", 1),
        coupon(campaign.id, "LAUNCH-THREE", 1),
    ];
    match repo.insert_coupons(campaign.id, &batch).await {
        Err(RepositoryError::Rejected(msg)) => {
            assert_eq!(msg, "Campaign allows 2 coupons, 0 already issued")
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(repo.count_campaign_coupons(campaign.id).await.unwrap(), 0);

    repo.insert_coupons(campaign.id, &batch[..2]).await.unwrap();
    assert!(
        repo.insert_coupons(Uuid::new_v4(), &batch[2..])
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_redemption_rechecks_campaign_rules() {
    let repo = InMemoryRepository::new();
    let campaign = repo.insert_campaign(&campaign()).await.unwrap();
    let shared = coupon(campaign.id, "LAUNCH-SHARED", 10);
    repo.insert_coupons(campaign.id, std::slice::from_ref(&shared))
        .await
        .unwrap();

    // Two redemptions quoted before either was written: only one fits the per-user limit.
    repo.record_redemption(&redemption(&shared, CUSTOMER_ID))
        .await
        .unwrap()
        .unwrap();
    match repo.record_redemption(&redemption(&shared, CUSTOMER_ID)).await {
        Err(RepositoryError::Rejected(msg)) => assert!(msg.contains("maximum number of times")),
        other => panic!("expected rejection, got {other:?}"),
    }

    repo.set_campaign_status(campaign.id, RecordStatus::Inactive)
        .await
        .unwrap();
    match repo
        .record_redemption(&redemption(&shared, OTHER_CUSTOMER_ID))
        .await
    {
        Err(RepositoryError::Rejected(msg)) => assert_eq!(msg, "Coupon campaign is not active"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(
        repo.get_coupon(shared.id).await.unwrap().unwrap().usage_count,
        1
    );
}

#[tokio::test]
async fn test_delete_campaign_removes_its_coupons() {
    let repo = InMemoryRepository::new();
    let campaign = repo.insert_campaign(&campaign()).await.unwrap();
    repo.insert_coupons(campaign.id, &[coupon(campaign.id, "LAUNCH-GONE", 1)])
        .await
        .unwrap();

    assert!(repo.delete_campaign(campaign.id).await.unwrap());
    assert!(repo.get_coupon_by_code("LAUNCH-GONE").await.unwrap().is_none());
}

#[tokio::test]
async fn test_wallet_movements_append_ledger_newest_first() {
    let repo = InMemoryRepository::new();
    let now = Utc::now();
    let wallet = repo
        .insert_wallet(&Wallet {
            id: Uuid::new_v4(),
            user_id: CUSTOMER_ID,
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

    match repo
        .apply_wallet_movement(wallet.id, TransactionKind::Debit, 601, None)
        .await
    {
        Err(RepositoryError::Rejected(msg)) => assert_eq!(msg, "Insufficient balance"),
        other => panic!("expected rejection, got {other:?}"),
    }

    let ledger = repo
        .list_wallet_transactions(wallet.id, &ListParams::default())
        .await
        .unwrap();
    assert_eq!(ledger.total, 2);
    assert_eq!(ledger.items[0].kind, TransactionKind::Debit);
    assert_eq!(ledger.items[0].balance_after_cents, 600);
    assert_eq!(
        repo.get_wallet_by_user(CUSTOMER_ID)
            .await
            .unwrap()
            .unwrap()
            .balance_cents,
        600
    );
}

#[tokio::test]
async fn test_stats_aggregate_every_table() {
    let repo = InMemoryRepository::new();
    let shoe = repo
        .insert_product(&product("Trail Runner", "shoes", 8999, true))
        .await
        .unwrap();
    repo.insert_product(&product("Retired Boot", "shoes", 4999, false))
        .await
        .unwrap();
    repo.insert_inventory(&inventory_row(shoe.id, "TR-40", 0))
        .await
        .unwrap();
    repo.insert_inventory(&inventory_row(shoe.id, "TR-41", 2))
        .await
        .unwrap();
    repo.insert_campaign(&campaign()).await.unwrap();

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.total_products, 2);
    assert_eq!(stats.active_products, 1);
    assert_eq!(stats.out_of_stock_items, 1);
    assert_eq!(stats.low_stock_items, 1);
    assert_eq!(stats.active_campaigns, 1);
    assert_eq!(stats.total_wallet_balance_cents, 0);
}

#[tokio::test]
async fn test_concurrent_first_carts_share_one_identity() {
    let repo = InMemoryRepository::new();
    let now = Utc::now();
    let shoe = product("Trail Runner", "shoes", 8999, true);
    let tee = product("Alpha Tee", "shirts", 1999, true);

    // Both requests started from an empty cart and built their own.
    let mut first = Cart::new(CUSTOMER_ID, now);
    first.add_item(&shoe, 1, now).unwrap();
    let mut second = Cart::new(CUSTOMER_ID, now);
    second.add_item(&tee, 2, now).unwrap();

    let saved_first = repo.save_cart(&first).await.unwrap();
    let saved_second = repo.save_cart(&second).await.unwrap();

    assert_eq!(saved_first.id, first.id);
    assert_eq!(saved_second.id, first.id);
    let stored = repo.get_cart(CUSTOMER_ID).await.unwrap().unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.total_cents, 3998);
}
