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
        CreateOptionRequest, ListQuery, OptionFilter, ProductOption, RecordStatus,
        UpdateOptionRequest, normalize_values,
    },
    response::MessageResponse,
};

/// list_options
///
/// [Admin Route] Product options (Size, Colour, ...) table.
#[utoipa::path(
    get,
    path = "/api/v1/admin/options",
    params(ListQuery),
    responses((status = 200, description = "Options", body = [ProductOption]))
)]
pub async fn list_options(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<ProductOption> {
    user.require_admin()?;
    let filter = OptionFilter {
        list: query.params(ProductOption::SORTABLE),
        status: query.status()?,
    };
    let page = state.repo.list_options(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/options/{id}",
    params(("id" = Uuid, Path, description = "Option ID")),
    responses(
        (status = 200, description = "Option", body = ProductOption),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<ProductOption> {
    user.require_admin()?;
    ok(found(state.repo.get_option(id).await?, "Option")?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/options",
    request_body = CreateOptionRequest,
    responses(
        (status = 201, description = "Created", body = ProductOption),
        (status = 409, description = "Name taken")
    )
)]
pub async fn create_option(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateOptionRequest>,
) -> CreatedResult<ProductOption> {
    user.require_admin()?;
    payload.validate()?;

    let now = Utc::now();
    let option = ProductOption {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        display_name: payload.display_name.trim().to_string(),
        values: normalize_values(payload.values),
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    created(state.repo.insert_option(&option).await?, "Option created")
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/options/{id}",
    params(("id" = Uuid, Path, description = "Option ID")),
    request_body = UpdateOptionRequest,
    responses((status = 200, description = "Updated", body = ProductOption))
)]
pub async fn update_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOptionRequest>,
) -> JsonResult<ProductOption> {
    user.require_admin()?;
    payload.validate()?;

    let mut option = found(state.repo.get_option(id).await?, "Option")?;
    payload.apply(&mut option);
    option.updated_at = Utc::now();
    ok(found(state.repo.update_option(&option).await?, "Option")?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/options/{id}",
    params(("id" = Uuid, Path, description = "Option ID")),
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_option(id).await? {
        return Err(AppError::NotFound("Option"));
    }
    Ok(Json(MessageResponse::new("Option deleted")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/options/{id}/activate",
    params(("id" = Uuid, Path, description = "Option ID")),
    responses((status = 200, description = "Activated", body = ProductOption))
)]
pub async fn activate_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<ProductOption> {
    user.require_admin()?;
    let option = state.repo.set_option_status(id, RecordStatus::Active).await?;
    ok(found(option, "Option")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/options/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Option ID")),
    responses((status = 200, description = "Deactivated", body = ProductOption))
)]
pub async fn deactivate_option(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<ProductOption> {
    user.require_admin()?;
    let option = state.repo.set_option_status(id, RecordStatus::Inactive).await?;
    ok(found(option, "Option")?)
}
