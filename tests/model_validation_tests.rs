use chrono::{Duration, Utc};
use commerce_api::{
    AppError,
    models::{
        CreateBrandRequest, CreateCampaignRequest, CreateCouponRequest, CreateOptionRequest,
        CreatePaymentMethodRequest, CreateProductRequest, CreateTicketRequest,
        CreateWalletRequest, DiscountType, GenerateCouponsRequest, LoginRequest,
        PresignedUrlRequest, RegisterUserRequest, TicketPriority, UpdateProductRequest,
        UploadFolder, WalletMovementRequest,
    },
};
use uuid::Uuid;

fn validation_message(result: Result<(), AppError>) -> String {
    match result {
        Err(AppError::Validation(msg)) => msg,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

fn product_request() -> CreateProductRequest {
    CreateProductRequest {
        name: "Trail Runner".to_string(),
        slug: "trail-runner".to_string(),
        description: Some("Lightweight trail shoe".to_string()),
        category: "shoes".to_string(),
        brand_id: None,
        price_cents: 8999,
        sku: "TR-001".to_string(),
        images: vec!["https://cdn.example.com/tr-001.png".to_string()],
        option_ids: vec![],
        is_active: true,
    }
}

#[test]
fn test_product_request_rules() {
    assert!(product_request().validate().is_ok());

    let msg = validation_message(
        CreateProductRequest {
            name: "X".to_string(),
            ..product_request()
        }
        .validate(),
    );
    assert_eq!(msg, "name must be between 2 and 120 characters");

    let bad_slug = CreateProductRequest {
        slug: "Trail Runner".to_string(),
        ..product_request()
    };
    assert!(bad_slug.validate().is_err());

    let bad_sku = CreateProductRequest {
        sku: "-TR".to_string(),
        ..product_request()
    };
    assert!(bad_sku.validate().is_err());

    let too_many_images = CreateProductRequest {
        images: vec!["https://cdn.example.com/a.png".to_string(); 11],
        ..product_request()
    };
    assert!(too_many_images.validate().is_err());
}

#[test]
fn test_product_request_defaults_to_active() {
    let parsed: CreateProductRequest = serde_json::from_value(serde_json::json!({
        "name": "Trail Runner",
        "slug": "trail-runner",
        "category": "shoes",
        "price_cents": 8999,
        "sku": "TR-001"
    }))
    .unwrap();
    assert!(parsed.is_active);
    assert!(parsed.images.is_empty());
}

#[test]
fn test_product_update_validates_present_fields_only() {
    assert!(UpdateProductRequest::default().validate().is_ok());
    let update = UpdateProductRequest {
        price_cents: Some(-5),
        ..Default::default()
    };
    assert!(update.validate().is_err());
}

#[test]
fn test_brand_request_rules() {
    let brand = CreateBrandRequest {
        name: "Northwind".to_string(),
        slug: "northwind".to_string(),
        description: None,
        logo_url: Some("https://cdn.example.com/northwind.svg".to_string()),
    };
    assert!(brand.validate().is_ok());

    let msg = validation_message(
        CreateBrandRequest {
            logo_url: Some("ftp://cdn.example.com/logo.svg".to_string()),
            ..brand
        }
        .validate(),
    );
    assert_eq!(msg, "logo_url must be an http(s) URL");
}

#[test]
fn test_option_request_requires_values() {
    let option = CreateOptionRequest {
        name: "size".to_string(),
        display_name: "Size".to_string(),
        values: vec![],
    };
    assert!(option.validate().is_err());
}

#[test]
fn test_payment_method_code_is_upper_snake_case() {
    let method = CreatePaymentMethodRequest {
        name: "Credit card".to_string(),
        code: "CREDIT_CARD".to_string(),
        provider: "stripe".to_string(),
        description: None,
        sort_order: 1,
    };
    assert!(method.validate().is_ok());

    let lower = CreatePaymentMethodRequest {
        code: "credit-card".to_string(),
        ..method
    };
    assert!(lower.validate().is_err());
}

fn campaign_request(discount_type: DiscountType, discount_value: i64) -> CreateCampaignRequest {
    let now = Utc::now();
    CreateCampaignRequest {
        name: "Spring Sale".to_string(),
        description: None,
        code_prefix: "SPRING".to_string(),
        discount_type,
        discount_value,
        min_order_cents: 0,
        max_discount_cents: None,
        starts_at: now,
        ends_at: now + Duration::days(14),
        usage_limit: None,
        per_user_limit: 1,
    }
}

#[test]
fn test_campaign_discount_bounds() {
    let now = Utc::now();
    assert!(campaign_request(DiscountType::Percentage, 100).into_campaign(now).is_ok());
    assert!(campaign_request(DiscountType::Percentage, 101).into_campaign(now).is_err());
    assert!(campaign_request(DiscountType::Percentage, 0).into_campaign(now).is_err());
    assert!(campaign_request(DiscountType::Fixed, 25_000).into_campaign(now).is_ok());

    let lower_prefix = CreateCampaignRequest {
        code_prefix: "spring".to_string(),
        ..campaign_request(DiscountType::Fixed, 500)
    };
    assert!(lower_prefix.into_campaign(now).is_err());
}

#[test]
fn test_campaign_discount_calculation() {
    let now = Utc::now();
    let mut campaign = campaign_request(DiscountType::Percentage, 15)
        .into_campaign(now)
        .unwrap();
    assert_eq!(campaign.discount_for(999), 149);

    campaign.max_discount_cents = Some(100);
    assert_eq!(campaign.discount_for(10_000), 100);

    let fixed = campaign_request(DiscountType::Fixed, 2_000)
        .into_campaign(now)
        .unwrap();
    // A fixed discount never exceeds the subtotal.
    assert_eq!(fixed.discount_for(1_500), 1_500);
}

#[test]
fn test_coupon_requests() {
    let batch = GenerateCouponsRequest {
        count: 0,
        max_uses: 1,
        user_id: None,
    };
    assert!(batch.validate().is_err());

    let huge = GenerateCouponsRequest {
        count: 501,
        ..batch
    };
    assert!(huge.validate().is_err());

    let manual = CreateCouponRequest {
        campaign_id: Uuid::new_v4(),
        code: "VIP-2024".to_string(),
        user_id: None,
        max_uses: 1,
    };
    assert!(manual.validate().is_ok());

    let lower = CreateCouponRequest {
        code: "vip-2024".to_string(),
        ..manual
    };
    assert!(lower.validate().is_err());
}

#[test]
fn test_wallet_requests() {
    let wallet = CreateWalletRequest {
        user_id: Uuid::new_v4(),
        currency: "eur".to_string(),
    };
    assert!(wallet.validate().is_ok());

    let bad = CreateWalletRequest {
        currency: "EURO".to_string(),
        ..wallet
    };
    assert!(bad.validate().is_err());

    let negative = WalletMovementRequest {
        amount_cents: -100,
        note: None,
    };
    assert_eq!(
        validation_message(negative.validate()),
        "amount_cents must be greater than 0"
    );
}

#[test]
fn test_ticket_request_rules() {
    let ticket = CreateTicketRequest {
        subject: "Hi".to_string(),
        message: "Where is my order?".to_string(),
        priority: TicketPriority::Low,
    };
    assert!(ticket.validate().is_err());

    let parsed: CreateTicketRequest = serde_json::from_value(serde_json::json!({
        "subject": "Damaged item",
        "message": "The box arrived crushed."
    }))
    .unwrap();
    assert_eq!(parsed.priority, TicketPriority::Medium);
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_auth_requests() {
    let register = RegisterUserRequest {
        email: "shopper@example.com".to_string(),
        password: "correct-horse".to_string(),
    };
    assert!(register.validate().is_ok());

    let short = RegisterUserRequest {
        password: "short".to_string(),
        ..register.clone()
    };
    assert_eq!(
        validation_message(short.validate()),
        "password must be at least 8 characters"
    );

    let bad_email = RegisterUserRequest {
        email: "shopper.example.com".to_string(),
        ..register
    };
    assert!(bad_email.validate().is_err());

    let login = LoginRequest {
        email: "shopper@example.com".to_string(),
        password: String::new(),
    };
    assert_eq!(validation_message(login.validate()), "password is required");
}

#[test]
fn test_upload_request_rules() {
    let upload = PresignedUrlRequest {
        filename: "Banner.JPG".to_string(),
        file_type: "image/jpeg".to_string(),
        folder: UploadFolder::Brands,
    };
    assert!(upload.validate().is_ok());

    let id = Uuid::nil();
    assert_eq!(
        upload.object_key(id),
        format!("brands/{id}.jpg")
    );

    let no_extension = PresignedUrlRequest {
        filename: "banner".to_string(),
        ..upload.clone()
    };
    assert!(no_extension.object_key(id).ends_with(".bin"));

    let svg = PresignedUrlRequest {
        file_type: "image/svg+xml".to_string(),
        ..upload
    };
    assert!(svg.validate().is_err());
}
