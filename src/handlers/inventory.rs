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
        AdjustStockRequest, CreateInventoryRequest, InventoryFilter, InventoryQuery,
        InventoryRecord, InventoryRow, ListQuery, StockStatus, UpdateInventoryRequest,
    },
    response::MessageResponse,
};

/// list_inventory
///
/// [Admin Route] Stock levels per variant. `stock_status` filters on the derived
/// status; `search` matches the variant SKU.
#[utoipa::path(
    get,
    path = "/api/v1/admin/inventory",
    params(ListQuery, InventoryQuery),
    responses((status = 200, description = "Inventory", body = [InventoryRecord]))
)]
pub async fn list_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<InventoryQuery>,
) -> ListResult<InventoryRecord> {
    user.require_admin()?;
    let stock_status = query
        .stock_status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<StockStatus>)
        .transpose()?;

    let filter = InventoryFilter {
        list: list.params(InventoryRecord::SORTABLE),
        product_id: query.product_id,
        stock_status,
    };
    let page = state.repo.list_inventory(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory ID")),
    responses((status = 200, description = "Inventory record", body = InventoryRecord))
)]
pub async fn get_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<InventoryRecord> {
    user.require_admin()?;
    ok(found(state.repo.get_inventory(id).await?, "Inventory record")?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/inventory",
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Created", body = InventoryRecord),
        (status = 400, description = "Validation failed or unknown product"),
        (status = 409, description = "Variant SKU taken")
    )
)]
pub async fn create_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryRequest>,
) -> CreatedResult<InventoryRecord> {
    user.require_admin()?;
    payload.validate()?;
    if state.repo.get_product(payload.product_id).await?.is_none() {
        return Err(AppError::Validation(format!(
            "Unknown product_id {}",
            payload.product_id
        )));
    }

    let now = Utc::now();
    let row = InventoryRow {
        id: Uuid::new_v4(),
        product_id: payload.product_id,
        variant_sku: payload.variant_sku.trim().to_string(),
        quantity: payload.quantity,
        low_stock_threshold: payload.low_stock_threshold,
        created_at: now,
        updated_at: now,
    };
    created(state.repo.insert_inventory(&row).await?, "Inventory created")
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory ID")),
    request_body = UpdateInventoryRequest,
    responses((status = 200, description = "Updated", body = InventoryRecord))
)]
pub async fn update_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> JsonResult<InventoryRecord> {
    user.require_admin()?;
    payload.validate()?;

    let current = found(state.repo.get_inventory(id).await?, "Inventory record")?;
    let row = InventoryRow {
        id: current.id,
        product_id: current.product_id,
        variant_sku: payload
            .variant_sku
            .map(|sku| sku.trim().to_string())
            .unwrap_or(current.variant_sku),
        quantity: payload.quantity.unwrap_or(current.quantity),
        low_stock_threshold: payload
            .low_stock_threshold
            .unwrap_or(current.low_stock_threshold),
        created_at: current.created_at,
        updated_at: Utc::now(),
    };
    ok(found(state.repo.update_inventory(&row).await?, "Inventory record")?)
}

/// adjust_stock
///
/// [Admin Route] Relative stock movement. The result may not go below zero; the check
/// is repeated inside the write so concurrent adjustments cannot oversell.
#[utoipa::path(
    post,
    path = "/api/v1/admin/inventory/{id}/adjust",
    params(("id" = Uuid, Path, description = "Inventory ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Adjusted", body = InventoryRecord),
        (status = 400, description = "Insufficient stock")
    )
)]
pub async fn adjust_stock(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> JsonResult<InventoryRecord> {
    user.require_admin()?;
    if payload.delta == 0 {
        return Err(AppError::Validation("delta must not be zero".to_string()));
    }

    let current = found(state.repo.get_inventory(id).await?, "Inventory record")?;
    current.adjusted_quantity(payload.delta)?;

    let record = found(
        state.repo.adjust_inventory(id, payload.delta).await?,
        "Inventory record",
    )?;
    tracing::info!(
        inventory_id = %id,
        delta = payload.delta,
        quantity = record.quantity,
        reason = payload.reason.as_deref().unwrap_or("-"),
        "stock adjusted"
    );
    ok(record)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory ID")),
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_inventory(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_inventory(id).await? {
        return Err(AppError::NotFound("Inventory record"));
    }
    Ok(Json(MessageResponse::new("Inventory record deleted")))
}
