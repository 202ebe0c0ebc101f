use std::collections::HashSet;

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
        Campaign, CampaignFilter, Coupon, CouponStatus, CreateCampaignRequest,
        GenerateCouponsRequest, ListQuery, RecordStatus, UpdateCampaignRequest, generate_code,
    },
    repository::RepositoryError,
    response::MessageResponse,
};

/// Attempts at drawing a fresh batch when a generated code collides with a stored one.
const GENERATE_ATTEMPTS: usize = 3;

/// list_campaigns
///
/// [Admin Route] Coupon campaigns table.
#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns",
    params(ListQuery),
    responses((status = 200, description = "Campaigns", body = [Campaign]))
)]
pub async fn list_campaigns(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ListResult<Campaign> {
    user.require_admin()?;
    let filter = CampaignFilter {
        list: query.params(Campaign::SORTABLE),
        status: query.status()?,
    };
    let page = state.repo.list_campaigns(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, description = "Campaign", body = Campaign))
)]
pub async fn get_campaign(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Campaign> {
    user.require_admin()?;
    ok(found(state.repo.get_campaign(id).await?, "Campaign")?)
}

/// New campaigns start INACTIVE.
#[utoipa::path(
    post,
    path = "/api/v1/admin/campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Created", body = Campaign),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_campaign(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCampaignRequest>,
) -> CreatedResult<Campaign> {
    user.require_admin()?;
    let campaign = payload.into_campaign(Utc::now())?;
    let campaign = state.repo.insert_campaign(&campaign).await?;
    tracing::info!(campaign_id = %campaign.id, "campaign created");
    created(campaign, "Campaign created")
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Updated", body = Campaign),
        (status = 400, description = "Merged campaign is invalid")
    )
)]
pub async fn update_campaign(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCampaignRequest>,
) -> JsonResult<Campaign> {
    user.require_admin()?;
    let current = found(state.repo.get_campaign(id).await?, "Campaign")?;
    let next = payload.merge(&current, Utc::now())?;
    ok(found(state.repo.update_campaign(&next).await?, "Campaign")?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/campaigns/{id}",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, description = "Deleted with its coupons", body = MessageResponse))
)]
pub async fn delete_campaign(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_campaign(id).await? {
        return Err(AppError::NotFound("Campaign"));
    }
    tracing::info!(campaign_id = %id, "campaign deleted");
    Ok(Json(MessageResponse::new("Campaign deleted")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/campaigns/{id}/activate",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, description = "Activated", body = Campaign))
)]
pub async fn activate_campaign(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Campaign> {
    user.require_admin()?;
    let campaign = state.repo.set_campaign_status(id, RecordStatus::Active).await?;
    ok(found(campaign, "Campaign")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/campaigns/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    responses((status = 200, description = "Deactivated", body = Campaign))
)]
pub async fn deactivate_campaign(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Campaign> {
    user.require_admin()?;
    let campaign = state
        .repo
        .set_campaign_status(id, RecordStatus::Inactive)
        .await?;
    ok(found(campaign, "Campaign")?)
}

/// Draws `count` distinct codes for `campaign`.
fn draw_batch(campaign: &Campaign, payload: &GenerateCouponsRequest) -> Vec<Coupon> {
    let now = Utc::now();
    let mut rng = rand::rng();
    let mut seen = HashSet::with_capacity(payload.count as usize);
    let mut coupons = Vec::with_capacity(payload.count as usize);

    while coupons.len() < payload.count as usize {
        let code = generate_code(&campaign.code_prefix, &mut rng);
        if !seen.insert(code.clone()) {
            continue;
        }
        coupons.push(Coupon {
            id: Uuid::new_v4(),
            campaign_id: campaign.id,
            code,
            user_id: payload.user_id,
            status: CouponStatus::Active,
            usage_count: 0,
            max_uses: payload.max_uses,
            created_at: now,
            updated_at: now,
        });
    }
    coupons
}

/// generate_coupons
///
/// [Admin Route] Issues a batch of random codes under the campaign. The campaign's
/// `usage_limit` caps how many coupons it may ever hold.
#[utoipa::path(
    post,
    path = "/api/v1/admin/campaigns/{id}/coupons",
    params(("id" = Uuid, Path, description = "Campaign ID")),
    request_body = GenerateCouponsRequest,
    responses(
        (status = 201, description = "Generated coupons", body = [Coupon]),
        (status = 400, description = "Would exceed the campaign usage limit")
    )
)]
pub async fn generate_coupons(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<GenerateCouponsRequest>,
) -> CreatedResult<Vec<Coupon>> {
    user.require_admin()?;
    payload.validate()?;
    let campaign = found(state.repo.get_campaign(id).await?, "Campaign")?;

    for attempt in 1..=GENERATE_ATTEMPTS {
        let batch = draw_batch(&campaign, &payload);
        match state.repo.insert_coupons(id, &batch).await {
            Ok(coupons) => {
                let coupons = found(coupons, "Campaign")?;
                tracing::info!(campaign_id = %id, count = coupons.len(), "coupons generated");
                return created(coupons, "Coupons generated");
            }
            Err(RepositoryError::Conflict(_)) if attempt < GENERATE_ATTEMPTS => {
                tracing::warn!(campaign_id = %id, attempt, "coupon code collision, redrawing");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::Internal("could not draw unique coupon codes".to_string()))
}
