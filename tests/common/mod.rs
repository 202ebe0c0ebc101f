#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use commerce_api::{
    AppConfig, AppState, InMemoryRepository, MockStorageService,
    auth::{AuthUser, issue_access_token},
    create_router,
    models::{Product, ROLE_ADMIN, ROLE_CUSTOMER, User},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_ID: Uuid = Uuid::from_u128(0xA0);
pub const CUSTOMER_ID: Uuid = Uuid::from_u128(0xC1);
pub const OTHER_CUSTOMER_ID: Uuid = Uuid::from_u128(0xC2);

pub fn user(id: Uuid, role: &str) -> User {
    User {
        id,
        email: format!("{}@shop.test", role),
        role: role.to_string(),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        id: ADMIN_ID,
        email: "admin@shop.test".to_string(),
        role: ROLE_ADMIN.to_string(),
    }
}

pub fn customer() -> AuthUser {
    AuthUser {
        id: CUSTOMER_ID,
        email: "customer@shop.test".to_string(),
        role: ROLE_CUSTOMER.to_string(),
    }
}

pub fn other_customer() -> AuthUser {
    AuthUser {
        id: OTHER_CUSTOMER_ID,
        email: "other@shop.test".to_string(),
        role: ROLE_CUSTOMER.to_string(),
    }
}

/// In-memory repository seeded with one admin and two customers.
pub async fn seeded_repo() -> Arc<InMemoryRepository> {
    Arc::new(
        InMemoryRepository::new()
            .with_user(user(ADMIN_ID, ROLE_ADMIN))
            .await
            .with_user(user(CUSTOMER_ID, ROLE_CUSTOMER))
            .await
            .with_user(user(OTHER_CUSTOMER_ID, ROLE_CUSTOMER))
            .await,
    )
}

pub fn state_with(repo: RepositoryState, storage: StorageState) -> AppState {
    AppState {
        repo,
        storage,
        config: AppConfig::default(),
    }
}

pub async fn test_state() -> AppState {
    state_with(seeded_repo().await, Arc::new(MockStorageService::new()))
}

pub async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (create_router(state.clone()), state)
}

pub fn bearer(user_id: Uuid) -> String {
    let token = issue_access_token(
        &AppConfig::default().jwt_secret,
        user_id,
        None,
        Duration::hours(1),
    )
    .unwrap();
    format!("Bearer {}", token)
}

/// Sends one request through the router and returns the status and the JSON body
/// (`Value::Null` for non-JSON bodies).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    as_user: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = as_user {
        builder = builder.header(header::AUTHORIZATION, bearer(id));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub fn product(name: &str, category: &str, price_cents: i64, is_active: bool) -> Product {
    let now = Utc::now();
    let slug = name.to_lowercase().replace(' ', "-");
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        sku: slug.to_uppercase(),
        slug,
        description: Some(format!("{} for everyday use", name)),
        category: category.to_string(),
        brand_id: None,
        price_cents,
        images: vec![],
        option_ids: vec![],
        is_active,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed_product(
    repo: &RepositoryState,
    name: &str,
    category: &str,
    price_cents: i64,
    is_active: bool,
) -> Product {
    repo.insert_product(&product(name, category, price_cents, is_active))
        .await
        .unwrap()
}
