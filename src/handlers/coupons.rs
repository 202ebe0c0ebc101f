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
        ApplyCouponRequest, Campaign, Coupon, CouponFilter, CouponQuery, CouponQuote,
        CouponRedemption, CouponStatus, CreateCouponRequest, ListQuery,
    },
    repository::RepositoryState,
    response::MessageResponse,
};

/// list_coupons
///
/// [Admin Route] Coupons table, optionally narrowed to one campaign.
#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons",
    params(ListQuery, CouponQuery),
    responses((status = 200, description = "Coupons", body = [Coupon]))
)]
pub async fn list_coupons(
    user: AuthUser,
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<CouponQuery>,
) -> ListResult<Coupon> {
    user.require_admin()?;
    let filter = CouponFilter {
        list: list.params(Coupon::SORTABLE),
        status: list.status()?,
        campaign_id: query.campaign_id,
    };
    let page = state.repo.list_coupons(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses((status = 200, description = "Coupon", body = Coupon))
)]
pub async fn get_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Coupon> {
    user.require_admin()?;
    ok(found(state.repo.get_coupon(id).await?, "Coupon")?)
}

/// Manually issued code. Counts against the campaign's `usage_limit` like generated ones.
#[utoipa::path(
    post,
    path = "/api/v1/admin/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Created", body = Coupon),
        (status = 409, description = "Code taken")
    )
)]
pub async fn create_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponRequest>,
) -> CreatedResult<Coupon> {
    user.require_admin()?;
    payload.validate()?;
    let campaign = state
        .repo
        .get_campaign(payload.campaign_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("Unknown campaign_id {}", payload.campaign_id))
        })?;

    let now = Utc::now();
    let coupon = Coupon {
        id: Uuid::new_v4(),
        campaign_id: campaign.id,
        code: payload.code,
        user_id: payload.user_id,
        status: CouponStatus::Active,
        usage_count: 0,
        max_uses: payload.max_uses,
        created_at: now,
        updated_at: now,
    };
    let coupon = found(
        state
            .repo
            .insert_coupons(campaign.id, std::slice::from_ref(&coupon))
            .await?,
        "Campaign",
    )?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::Internal("coupon insert returned nothing".to_string()))?;
    created(coupon, "Coupon created")
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_coupon(id).await? {
        return Err(AppError::NotFound("Coupon"));
    }
    Ok(Json(MessageResponse::new("Coupon deleted")))
}

/// Fully redeemed coupons stay REDEEMED.
async fn toggle_coupon(
    repo: &RepositoryState,
    id: Uuid,
    status: CouponStatus,
) -> AppResult<Coupon> {
    let coupon = found(repo.get_coupon(id).await?, "Coupon")?;
    if coupon.status == CouponStatus::Redeemed {
        return Err(AppError::BadRequest(
            "Coupon has been fully redeemed".to_string(),
        ));
    }
    found(repo.set_coupon_status(id, status).await?, "Coupon")
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/coupons/{id}/activate",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses((status = 200, description = "Activated", body = Coupon))
)]
pub async fn activate_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Coupon> {
    user.require_admin()?;
    ok(toggle_coupon(&state.repo, id, CouponStatus::Active).await?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/coupons/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses((status = 200, description = "Deactivated", body = Coupon))
)]
pub async fn deactivate_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Coupon> {
    user.require_admin()?;
    ok(toggle_coupon(&state.repo, id, CouponStatus::Inactive).await?)
}

/// Looks up the coupon and its campaign and runs every redemption rule for `user`.
async fn quote(
    repo: &RepositoryState,
    user: &AuthUser,
    payload: &ApplyCouponRequest,
) -> AppResult<(Coupon, Campaign, CouponQuote)> {
    if payload.subtotal_cents < 0 {
        return Err(AppError::Validation(
            "subtotal_cents must not be negative".to_string(),
        ));
    }
    let code = payload.code.trim().to_ascii_uppercase();
    let coupon = found(repo.get_coupon_by_code(&code).await?, "Coupon")?;
    let campaign = found(repo.get_campaign(coupon.campaign_id).await?, "Campaign")?;
    let used = repo.count_user_redemptions(campaign.id, user.id).await?;

    let discount_cents =
        coupon.evaluate(&campaign, user.id, used, payload.subtotal_cents, Utc::now())?;
    let quote = CouponQuote {
        code: coupon.code.clone(),
        campaign_id: campaign.id,
        subtotal_cents: payload.subtotal_cents,
        discount_cents,
        total_cents: payload.subtotal_cents - discount_cents,
    };
    Ok((coupon, campaign, quote))
}

/// validate_coupon
///
/// [Customer Route] Dry run: reports the discount the code would give on
/// `subtotal_cents` without consuming it.
#[utoipa::path(
    post,
    path = "/api/v1/coupons/validate",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Applicable", body = CouponQuote),
        (status = 400, description = "Not applicable"),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn validate_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ApplyCouponRequest>,
) -> JsonResult<CouponQuote> {
    let (_, _, quote) = quote(&state.repo, &user, &payload).await?;
    ok(quote)
}

/// redeem_coupon
///
/// [Customer Route] Re-evaluates the code, consumes one use and records the redemption.
#[utoipa::path(
    post,
    path = "/api/v1/coupons/redeem",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Redeemed", body = CouponQuote),
        (status = 400, description = "Not applicable or already used up")
    )
)]
pub async fn redeem_coupon(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ApplyCouponRequest>,
) -> JsonResult<CouponQuote> {
    let (coupon, campaign, quote) = quote(&state.repo, &user, &payload).await?;

    let redemption = CouponRedemption {
        id: Uuid::new_v4(),
        coupon_id: coupon.id,
        campaign_id: campaign.id,
        user_id: user.id,
        subtotal_cents: quote.subtotal_cents,
        discount_cents: quote.discount_cents,
        created_at: Utc::now(),
    };
    // Rules are checked again under lock; a concurrent redemption may have won.
    found(state.repo.record_redemption(&redemption).await?, "Coupon")?;

    tracing::info!(
        coupon_id = %coupon.id,
        user_id = %user.id,
        discount_cents = quote.discount_cents,
        "coupon redeemed"
    );
    ok(quote)
}
