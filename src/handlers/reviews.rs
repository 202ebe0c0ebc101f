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
        CreateReviewRequest, ListQuery, Review, ReviewFilter, ReviewQuery, ReviewStatus,
    },
    response::MessageResponse,
};

/// list_product_reviews
///
/// [Public Route] Approved reviews of an active product.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product ID"), ListQuery),
    responses(
        (status = 200, description = "Approved reviews", body = [Review]),
        (status = 404, description = "Product not found")
    )
)]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(list): Query<ListQuery>,
) -> ListResult<Review> {
    let product = state
        .repo
        .get_product(product_id)
        .await?
        .filter(|p| p.is_active);
    found(product, "Product")?;

    let filter = ReviewFilter {
        list: list.params(Review::SORTABLE),
        status: Some(ReviewStatus::Approved),
        product_id: Some(product_id),
        rating: None,
    };
    let page = state.repo.list_reviews(&filter).await?;
    paginated(page, &filter.list)
}

/// create_review
///
/// [Customer Route] Submits a review. It stays PENDING until moderated.
#[utoipa::path(
    post,
    path = "/api/v1/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Submitted for moderation", body = Review),
        (status = 409, description = "Already reviewed this product")
    )
)]
pub async fn create_review(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateReviewRequest>,
) -> CreatedResult<Review> {
    payload.validate()?;
    let product = state
        .repo
        .get_product(payload.product_id)
        .await?
        .filter(|p| p.is_active);
    found(product, "Product")?;

    let now = Utc::now();
    let review = Review {
        id: Uuid::new_v4(),
        product_id: payload.product_id,
        user_id: user.id,
        rating: payload.rating,
        title: payload.title.trim().to_string(),
        body: payload.body.trim().to_string(),
        status: ReviewStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    created(state.repo.insert_review(&review).await?, "Review submitted")
}

/// [Admin Route] Moderation queue. `status` accepts PENDING, APPROVED or REJECTED.
#[utoipa::path(
    get,
    path = "/api/v1/admin/reviews",
    params(ListQuery, ReviewQuery),
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn list_reviews(
    user: AuthUser,
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(query): Query<ReviewQuery>,
) -> ListResult<Review> {
    user.require_admin()?;
    let filter = ReviewFilter {
        list: list.params(Review::SORTABLE),
        status: list.status()?,
        product_id: query.product_id,
        rating: query.rating,
    };
    let page = state.repo.list_reviews(&filter).await?;
    paginated(page, &filter.list)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses((status = 200, description = "Review", body = Review))
)]
pub async fn get_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Review> {
    user.require_admin()?;
    ok(found(state.repo.get_review(id).await?, "Review")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/reviews/{id}/approve",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses((status = 200, description = "Approved", body = Review))
)]
pub async fn approve_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Review> {
    user.require_admin()?;
    let review = state.repo.set_review_status(id, ReviewStatus::Approved).await?;
    ok(found(review, "Review")?)
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/reviews/{id}/reject",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses((status = 200, description = "Rejected", body = Review))
)]
pub async fn reject_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> JsonResult<Review> {
    user.require_admin()?;
    let review = state.repo.set_review_status(id, ReviewStatus::Rejected).await?;
    ok(found(review, "Review")?)
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_review(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    user.require_admin()?;
    if !state.repo.delete_review(id).await? {
        return Err(AppError::NotFound("Review"));
    }
    Ok(Json(MessageResponse::new("Review deleted")))
}
