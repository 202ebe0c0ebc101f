mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let (app, _) = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-me-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/v1/products"));
    assert!(paths.contains_key("/api/v1/admin/campaigns/{id}/coupons"));
    assert!(paths.contains_key("/api/v1/coupons/redeem"));
}

#[tokio::test]
async fn test_storefront_lists_only_active_products() {
    let (app, state) = test_app().await;
    seed_product(&state.repo, "Trail Runner", "shoes", 8999, true).await;
    seed_product(&state.repo, "Road Racer", "shoes", 12999, true).await;
    seed_product(&state.repo, "Retired Boot", "shoes", 4999, false).await;
    seed_product(&state.repo, "Rain Jacket", "outerwear", 15999, true).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/products?category=shoes&sort_by=name&sort_order=asc",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Road Racer", "Trail Runner"]);
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_product_listing_paginates() {
    let (app, state) = test_app().await;
    for name in ["Alpha Tee", "Bravo Tee", "Charlie Tee", "Delta Tee", "Echo Tee"] {
        seed_product(&state.repo, name, "shirts", 1999, true).await;
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/products?page=2&limit=2&sort_by=name&sort_order=asc",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pagination"],
        json!({ "page": 2, "limit": 2, "total": 5, "total_pages": 3 })
    );
    assert_eq!(body["data"][0]["name"], "Charlie Tee");
    assert_eq!(body["data"][1]["name"], "Delta Tee");
}

#[tokio::test]
async fn test_product_search_matches_description() {
    let (app, state) = test_app().await;
    seed_product(&state.repo, "Trail Runner", "shoes", 8999, true).await;
    seed_product(&state.repo, "Rain Jacket", "outerwear", 15999, true).await;

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/products?search=JACKET%20for",
        None,
        None,
    )
    .await;

    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Rain Jacket");
}

#[tokio::test]
async fn test_inactive_product_is_hidden_from_store_but_not_dashboard() {
    let (app, state) = test_app().await;
    let hidden = seed_product(&state.repo, "Retired Boot", "shoes", 4999, false).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/products/{}", hidden.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/admin/products/{}", hidden.id),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
async fn test_invalid_status_filter_is_rejected() {
    let (app, _) = test_app().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/admin/brands?status=archived",
        Some(ADMIN_ID),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = test_app().await;

    for uri in ["/api/v1/cart", "/api/v1/wallet", "/api/v1/admin/stats"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["message"], "Missing bearer token");
    }
}

#[tokio::test]
async fn test_customers_cannot_reach_dashboard() {
    let (app, _) = test_app().await;

    for uri in ["/api/v1/admin/stats", "/api/v1/admin/products", "/api/v1/admin/wallets"] {
        let (status, body) = send(&app, Method::GET, uri, Some(CUSTOMER_ID), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["message"], "Admin access required");
    }
}

#[tokio::test]
async fn test_brand_lifecycle() {
    let (app, _) = test_app().await;
    let brand = json!({ "name": "Northwind", "slug": "northwind", "description": "Outdoor gear" });

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/brands",
        Some(ADMIN_ID),
        Some(brand.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "ACTIVE");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/brands",
        Some(ADMIN_ID),
        Some(brand),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Brand already exists");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/admin/brands/{id}/deactivate"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The store only lists active brands.
    let (_, body) = send(&app, Method::GET, "/api/v1/brands", None, None).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/brands/{id}"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/brands/{id}"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_checks_brand_reference() {
    let (app, _) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/products",
        Some(ADMIN_ID),
        Some(json!({
            "name": "Trail Runner",
            "slug": "trail-runner",
            "category": "shoes",
            "price_cents": 8999,
            "sku": "TR-001",
            "brand_id": uuid::Uuid::new_v4()
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Unknown brand_id"));
}

#[tokio::test]
async fn test_create_product_then_duplicate_sku_conflicts() {
    let (app, _) = test_app().await;
    let product = json!({
        "name": "Trail Runner",
        "slug": "trail-runner",
        "category": "shoes",
        "price_cents": 8999,
        "sku": "TR-001"
    });

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/products",
        Some(ADMIN_ID),
        Some(product),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_active"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/products",
        Some(ADMIN_ID),
        Some(json!({
            "name": "Trail Runner Two",
            "slug": "trail-runner-two",
            "category": "shoes",
            "price_cents": 9999,
            "sku": "TR-001"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cart_flow() {
    let (app, state) = test_app().await;
    let shoe = seed_product(&state.repo, "Trail Runner", "shoes", 8999, true).await;
    let sock = seed_product(&state.repo, "Wool Sock", "socks", 1250, true).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/cart", Some(CUSTOMER_ID), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_cents"], 0);

    send(
        &app,
        Method::POST,
        "/api/v1/cart/items",
        Some(CUSTOMER_ID),
        Some(json!({ "product_id": shoe.id, "quantity": 1 })),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/api/v1/cart/items",
        Some(CUSTOMER_ID),
        Some(json!({ "product_id": sock.id, "quantity": 2 })),
    )
    .await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/cart/items",
        Some(CUSTOMER_ID),
        Some(json!({ "product_id": sock.id, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_cents"], 8999 + 3 * 1250);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/cart/items/{}", shoe.id),
        Some(CUSTOMER_ID),
        Some(json!({ "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_cents"], 2 * 8999 + 3 * 1250);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/cart/items/{}", sock.id),
        Some(CUSTOMER_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_cents"], 2 * 8999);

    // Another customer's cart is untouched.
    let (_, body) = send(&app, Method::GET, "/api/v1/cart", Some(OTHER_CUSTOMER_ID), None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);

    let (status, body) = send(&app, Method::DELETE, "/api/v1/cart", Some(CUSTOMER_ID), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_cents"], 0);
}

#[tokio::test]
async fn test_cart_refuses_inactive_products() {
    let (app, state) = test_app().await;
    let retired = seed_product(&state.repo, "Retired Boot", "shoes", 4999, false).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/cart/items",
        Some(CUSTOMER_ID),
        Some(json!({ "product_id": retired.id, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_stats() {
    let (app, state) = test_app().await;
    seed_product(&state.repo, "Trail Runner", "shoes", 8999, true).await;
    seed_product(&state.repo, "Retired Boot", "shoes", 4999, false).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/admin/stats", Some(ADMIN_ID), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_products"], 2);
    assert_eq!(body["data"]["active_products"], 1);
    assert_eq!(body["data"]["open_tickets"], 0);
}

async fn send_raw(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

#[tokio::test]
async fn test_body_missing_required_field_is_json_400() {
    let (app, _) = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/campaigns",
        Some(ADMIN_ID),
        Some(json!({ "code_prefix": "SPRING", "discount_type": "PERCENTAGE" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("missing field"));
}

#[tokio::test]
async fn test_malformed_json_and_wrong_content_type_are_json_400() {
    let (app, _) = test_app().await;

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/brands")
        .header("authorization", bearer(ADMIN_ID))
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": \"Northwind\""))
        .unwrap();
    let (status, body) = send_raw(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let plain_text = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/admin/brands")
        .header("authorization", bearer(ADMIN_ID))
        .body(Body::from("name=Northwind"))
        .unwrap();
    let (status, body) = send_raw(&app, plain_text).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_bad_path_uuid_is_json_400() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/products/not-a-uuid", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_bad_query_value_is_json_400() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/products?page=abc", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("page"));
}

#[tokio::test]
async fn test_product_listing_sorts_by_price() {
    let (app, state) = test_app().await;
    seed_product(&state.repo, "Rain Jacket", "outerwear", 15999, true).await;
    seed_product(&state.repo, "Trail Runner", "shoes", 8999, true).await;
    seed_product(&state.repo, "Road Racer", "shoes", 12999, true).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/products?sort_by=price_cents&sort_order=asc",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let prices: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price_cents"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![8999, 12999, 15999]);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/products?sort_by=price_cents&sort_order=desc&limit=1",
        None,
        None,
    )
    .await;
    assert_eq!(body["data"][0]["name"], "Rain Jacket");
    assert_eq!(body["pagination"]["total_pages"], 3);
}

#[tokio::test]
async fn test_option_lifecycle_through_admin_routes() {
    let (app, _) = test_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/options",
        Some(CUSTOMER_ID),
        Some(json!({ "name": "size", "display_name": "Size", "values": ["S", "M"] })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/options",
        Some(ADMIN_ID),
        Some(json!({ "name": "size", "display_name": "Size", "values": [" S", "M ", "L"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["values"], json!(["S", "M", "L"]));
    assert_eq!(body["data"]["status"], "ACTIVE");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/admin/options",
        Some(ADMIN_ID),
        Some(json!({ "name": "size", "display_name": "Sizes", "values": ["XL"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Option already exists");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/options/{id}"),
        Some(ADMIN_ID),
        Some(json!({ "display_name": "Shoe size", "values": ["40", "41", "42"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["display_name"], "Shoe size");
    assert_eq!(body["data"]["name"], "size");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/admin/options/{id}/deactivate"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "INACTIVE");

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/admin/options?status=ACTIVE",
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/admin/options/{id}/activate"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(body["data"]["status"], "ACTIVE");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/options/{id}"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Option deleted");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/admin/options/{id}"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Option not found");
}

#[tokio::test]
async fn test_payment_method_lifecycle_and_public_checkout_list() {
    let (app, _) = test_app().await;

    let mut ids = Vec::new();
    for (name, code, sort_order) in [("Bank Transfer", "BANK_TRANSFER", 2), ("Card", "CARD", 1)] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/admin/payment-methods",
            Some(ADMIN_ID),
            Some(json!({
                "name": name,
                "code": code,
                "provider": "stripe",
                "sort_order": sort_order,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }
    let (bank, card) = (&ids[0], &ids[1]);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/admin/payment-methods",
        Some(ADMIN_ID),
        Some(json!({ "name": "Card again", "code": "CARD", "provider": "adyen" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/api/v1/payment-methods", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["CARD", "BANK_TRANSFER"]);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/admin/payment-methods/{bank}"),
        Some(ADMIN_ID),
        Some(json!({ "description": "Pay within 3 days" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Pay within 3 days");

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/admin/payment-methods/{card}/deactivate"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/v1/payment-methods", None, None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["code"], "BANK_TRANSFER");

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/admin/payment-methods",
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 2);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/payment-methods/{card}"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/admin/payment-methods/{card}"),
        Some(ADMIN_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Payment method not found");
}
