use axum::extract::State;
use chrono::Utc;
use uuid::Uuid;

use super::{CreatedResult, JsonResult, ListResult, created, found, ok, paginated};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    models::{Brand, BrandFilter, CreateBrandRequest, ListQuery, RecordStatus, UpdateBrandRequest},
    response::MessageResponse,
};

/// list_public_brands
///
/// [Public Route] Active brands for the store's brand filter.
#[utoipa::path(
    get,
    path = "/api/v1/brands",
    params(ListQuery),
    responses((status = 200, description = "Active brands", body = [Brand]))
)]
pub async fn list_public_brands(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<Brand> {
    let filter = BrandFilter {
        list: query.params(Brand::SORTABLE),
        status: Some(RecordStatus::Active),
    };
    let page = state.repo.list_brands(&filter).await?;
    paginated(page, &filter.list)
}

/// [Admin Route] Brand management table.
#[utoipa::path(
    get,
    path = "/api/v1/admin/brands",
    params(ListQuery),
    responses(
        (status = 200, description = "Brands", body = [Brand]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_brands(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<Brand> {
    user.require_admin()?;
    let filter = BrandFilter {
        list: query.params(Brand::SORTABLE),
        status: query.status()?,
    };
    let page = state.repo.list_brands(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand", body = Brand),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_brand(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Brand> {
    user.require_admin()?;
    ok(found(state.repo.get_brand(id).await?, "Brand")?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/brands",
    request_body = CreateBrandRequest,
    responses(
        (status = 201, description = "Created", body = Brand),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Slug taken")
    )
)]
pub async fn create_brand(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateBrandRequest>,
) -> CreatedResult<Brand> {
    user.require_admin()?;
    payload.validate()?;

    let now = Utc::now();
    let brand = Brand {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        slug: payload.slug,
        description: payload.description,
        logo_url: payload.logo_url,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let brand = state.repo.insert_brand(&brand).await?;
    tracing::info!(brand_id = %brand.id, "brand created");
    created(brand, "Brand created")
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    request_body = UpdateBrandRequest,
    responses(
        (status = 200, description = "Updated", body = Brand),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_brand(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBrandRequest>,
) -> JsonResult<Brand> {
    user.require_admin()?;
    payload.validate()?;

    let mut brand = found(state.repo.get_brand(id).await?, "Brand")?;
    payload.apply(&mut brand);
    brand.updated_at = Utc::now();
    ok(found(state.repo.update_brand(&brand).await?, "Brand")?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/brands/{id}",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_brand(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_brand(id).await? {
        return Err(AppError::NotFound("Brand"));
    }
    Ok(Json(MessageResponse::new("Brand deleted")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/brands/{id}/activate",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses((status = 200, description = "Activated", body = Brand))
)]
pub async fn activate_brand(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Brand> {
    user.require_admin()?;
    let brand = state.repo.set_brand_status(id, RecordStatus::Active).await?;
    ok(found(brand, "Brand")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/brands/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Brand ID")),
    responses((status = 200, description = "Deactivated", body = Brand))
)]
pub async fn deactivate_brand(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Brand> {
    user.require_admin()?;
    let brand = state.repo.set_brand_status(id, RecordStatus::Inactive).await?;
    ok(found(brand, "Brand")?)
}
