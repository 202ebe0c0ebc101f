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
        CreatePaymentMethodRequest, ListQuery, PaymentMethod, PaymentMethodFilter, RecordStatus,
        UpdatePaymentMethodRequest,
    },
    response::MessageResponse,
};

/// list_public_payment_methods
///
/// [Public Route] Checkout options, active only, in `sort_order`.
#[utoipa::path(
    get,
    path = "/api/v1/payment-methods",
    params(ListQuery),
    responses((status = 200, description = "Active payment methods", body = [PaymentMethod]))
)]
pub async fn list_public_payment_methods(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<PaymentMethod> {
    let mut list = query.params(PaymentMethod::SORTABLE);
    if query.sort_order.is_none() {
        list.descending = false;
    }
    let filter = PaymentMethodFilter {
        list,
        status: Some(RecordStatus::Active),
    };
    let page = state.repo.list_payment_methods(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/payment-methods",
    params(ListQuery),
    responses((status = 200, description = "Payment methods", body = [PaymentMethod]))
)]
pub async fn list_payment_methods(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<PaymentMethod> {
    user.require_admin()?;
    let filter = PaymentMethodFilter {
        list: query.params(PaymentMethod::SORTABLE),
        status: query.status()?,
    };
    let page = state.repo.list_payment_methods(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/payment-methods/{id}",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    responses((status = 200, description = "Payment method", body = PaymentMethod))
)]
pub async fn get_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<PaymentMethod> {
    user.require_admin()?;
    ok(found(state.repo.get_payment_method(id).await?, "Payment method")?)
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/payment-methods",
    request_body = CreatePaymentMethodRequest,
    responses(
        (status = 201, description = "Created", body = PaymentMethod),
        (status = 409, description = "Code taken")
    )
)]
pub async fn create_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentMethodRequest>,
) -> CreatedResult<PaymentMethod> {
    user.require_admin()?;
    payload.validate()?;

    let now = Utc::now();
    let method = PaymentMethod {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        code: payload.code,
        provider: payload.provider.trim().to_string(),
        description: payload.description,
        status: RecordStatus::Active,
        sort_order: payload.sort_order,
        created_at: now,
        updated_at: now,
    };
    created(
        state.repo.insert_payment_method(&method).await?,
        "Payment method created",
    )
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/payment-methods/{id}",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    request_body = UpdatePaymentMethodRequest,
    responses((status = 200, description = "Updated", body = PaymentMethod))
)]
pub async fn update_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentMethodRequest>,
) -> JsonResult<PaymentMethod> {
    user.require_admin()?;
    payload.validate()?;

    let mut method = found(state.repo.get_payment_method(id).await?, "Payment method")?;
    payload.apply(&mut method);
    method.updated_at = Utc::now();
    ok(found(
        state.repo.update_payment_method(&method).await?,
        "Payment method",
    )?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/payment-methods/{id}",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_payment_method(id).await? {
        return Err(AppError::NotFound("Payment method"));
    }
    Ok(Json(MessageResponse::new("Payment method deleted")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/payment-methods/{id}/activate",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    responses((status = 200, description = "Activated", body = PaymentMethod))
)]
pub async fn activate_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<PaymentMethod> {
    user.require_admin()?;
    let method = state
        .repo
        .set_payment_method_status(id, RecordStatus::Active)
        .await?;
    ok(found(method, "Payment method")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/payment-methods/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Payment method ID")),
    responses((status = 200, description = "Deactivated", body = PaymentMethod))
)]
pub async fn deactivate_payment_method(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<PaymentMethod> {
    user.require_admin()?;
    let method = state
        .repo
        .set_payment_method_status(id, RecordStatus::Inactive)
        .await?;
    ok(found(method, "Payment method")?)
}
