use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use super::{JsonResult, found, ok};
use crate::{
    AppState,
    auth::AuthUser,
    error::AppResult,
    extract::{Json, Path},
    models::{AddCartItemRequest, Cart, UpdateCartItemRequest},
    repository::RepositoryState,
};

/// The caller's cart, or a fresh empty one if they never had one.
async fn load_cart(repo: &RepositoryState, user: &AuthUser) -> AppResult<Cart> {
    Ok(match repo.get_cart(user.id).await? {
        Some(cart) => cart,
        None => Cart::new(user.id, Utc::now()),
    })
}

/// get_cart
///
/// [Customer Route] Current cart with line and grand totals.
#[utoipa::path(
    get,
    path = "/api/v1/cart",
    responses((status = 200, description = "Cart", body = Cart))
)]
pub async fn get_cart(user: AuthUser, State(state): State<AppState>) -> JsonResult<Cart> {
    ok(load_cart(&state.repo, &user).await?)
}

/// add_cart_item
///
/// [Customer Route] Adds a product; an existing line for the same product is
/// incremented instead of duplicated.
#[utoipa::path(
    post,
    path = "/api/v1/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = Cart),
        (status = 404, description = "Product not found or inactive")
    )
)]
pub async fn add_cart_item(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<AddCartItemRequest>,
) -> JsonResult<Cart> {
    let product = found(state.repo.get_product(payload.product_id).await?, "Product")?;
    let mut cart = load_cart(&state.repo, &user).await?;
    cart.add_item(&product, payload.quantity, Utc::now())?;
    ok(state.repo.save_cart(&cart).await?)
}

/// Quantity `0` removes the line.
#[utoipa::path(
    put,
    path = "/api/v1/cart/items/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID of the line")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = Cart),
        (status = 404, description = "No such line")
    )
)]
pub async fn update_cart_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> JsonResult<Cart> {
    let mut cart = load_cart(&state.repo, &user).await?;
    cart.set_quantity(product_id, payload.quantity, Utc::now())?;
    ok(state.repo.save_cart(&cart).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/items/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID of the line")),
    responses(
        (status = 200, description = "Updated cart", body = Cart),
        (status = 404, description = "No such line")
    )
)]
pub async fn remove_cart_item(
    user: AuthUser,
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> JsonResult<Cart> {
    let mut cart = load_cart(&state.repo, &user).await?;
    cart.remove_item(product_id, Utc::now())?;
    ok(state.repo.save_cart(&cart).await?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    responses((status = 200, description = "Emptied cart", body = Cart))
)]
pub async fn clear_cart(user: AuthUser, State(state): State<AppState>) -> JsonResult<Cart> {
    let mut cart = load_cart(&state.repo, &user).await?;
    cart.clear(Utc::now());
    ok(state.repo.save_cart(&cart).await?)
}
