use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use super::{CreatedResult, JsonResult, ListResult, created, found, ok, paginated};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    models::{
        CreateProductRequest, ListQuery, Product, ProductFilter, ProductQuery,
        UpdateProductRequest,
    },
    repository::RepositoryState,
    response::MessageResponse,
};

/// list_products
///
/// [Public Route] Store catalogue. Inactive products are always excluded, then the
/// search and category filters apply, then sorting and pagination.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ListQuery, ProductQuery),
    responses((status = 200, description = "Active products", body = [Product]))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<ProductQuery>,
) -> ListResult<Product> {
    let filter = ProductFilter::storefront(list.params(Product::SORTABLE), query);
    let page = state.repo.list_products(&filter).await?;
    paginated(page, &filter.list)
}

/// get_product
///
/// [Public Route] Product detail. Unknown and inactive products are both 404.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Not found or inactive")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Product> {
    let product = state
        .repo
        .get_product(id)
        .await?
        .filter(|p| p.is_active);
    ok(found(product, "Product")?)
}

/// [Admin Route] Full catalogue including inactive products.
#[utoipa::path(
    get,
    path = "/api/v1/admin/products",
    params(ListQuery, ProductQuery),
    responses((status = 200, description = "Products", body = [Product]))
)]
pub async fn list_admin_products(
    user: AuthUser,
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<ProductQuery>,
) -> ListResult<Product> {
    user.require_admin()?;
    let filter = ProductFilter::admin(list.params(Product::SORTABLE), query);
    let page = state.repo.list_products(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Product", body = Product))
)]
pub async fn get_admin_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Product> {
    user.require_admin()?;
    ok(found(state.repo.get_product(id).await?, "Product")?)
}

/// Rejects references to brands or options that do not exist.
async fn check_references(
    repo: &RepositoryState,
    brand_id: Option<Uuid>,
    option_ids: &[Uuid],
) -> AppResult<()> {
    if let Some(brand_id) = brand_id {
        if repo.get_brand(brand_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown brand_id {brand_id}")));
        }
    }
    for option_id in option_ids {
        if repo.get_option(*option_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown option id {option_id}")));
        }
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Slug or SKU taken")
    )
)]
pub async fn create_product(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> CreatedResult<Product> {
    user.require_admin()?;
    payload.validate()?;
    check_references(&state.repo, payload.brand_id, &payload.option_ids).await?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        slug: payload.slug,
        description: payload.description,
        category: payload.category.trim().to_string(),
        brand_id: payload.brand_id,
        price_cents: payload.price_cents,
        sku: payload.sku,
        images: payload.images,
        option_ids: payload.option_ids,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };
    let product = state.repo.insert_product(&product).await?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
    created(product, "Product created")
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses((status = 200, description = "Updated", body = Product))
)]
pub async fn update_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> JsonResult<Product> {
    user.require_admin()?;
    payload.validate()?;
    check_references(
        &state.repo,
        payload.brand_id,
        payload.option_ids.as_deref().unwrap_or_default(),
    )
    .await?;

    let mut product = found(state.repo.get_product(id).await?, "Product")?;
    payload.apply(&mut product);
    product.updated_at = Utc::now();
    ok(found(state.repo.update_product(&product).await?, "Product")?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_product(id).await? {
        return Err(AppError::NotFound("Product"));
    }
    tracing::info!(product_id = %id, "product deleted");
    Ok(Json(MessageResponse::new("Product deleted")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/products/{id}/activate",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Activated", body = Product))
)]
pub async fn activate_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Product> {
    user.require_admin()?;
    ok(found(state.repo.set_product_active(id, true).await?, "Product")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/products/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Deactivated", body = Product))
)]
pub async fn deactivate_product(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Product> {
    user.require_admin()?;
    ok(found(state.repo.set_product_active(id, false).await?, "Product")?)
}
