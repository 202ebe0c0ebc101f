use axum::extract::State;
use uuid::Uuid;

use super::{JsonResult, ok};
use crate::{
    AppState,
    auth::AuthUser,
    extract::Json,
    models::{PresignedUrlRequest, PresignedUrlResponse},
};

/// presigned_upload
///
/// [Admin Route] Short-lived URL for a direct browser-to-bucket image upload. The
/// object key is `<folder>/<uuid>.<ext>`, never derived from the client's filename.
#[utoipa::path(
    post,
    path = "/api/v1/admin/uploads/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "Upload URL", body = PresignedUrlResponse),
        (status = 400, description = "Unsupported file type"),
        (status = 500, description = "Storage unavailable")
    )
)]
pub async fn presigned_upload(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> JsonResult<PresignedUrlResponse> {
    user.require_admin()?;
    payload.validate()?;

    let resource_key = payload.object_key(Uuid::new_v4());
    let upload_url = state
        .storage
        .presigned_upload_url(&resource_key, &payload.file_type)
        .await?;
    tracing::debug!(%resource_key, user_id = %user.id, "presigned upload issued");

    ok(PresignedUrlResponse {
        upload_url,
        resource_key,
    })
}
