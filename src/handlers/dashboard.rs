use axum::extract::State;

use super::{JsonResult, ok};
use crate::{AppState, auth::AuthUser, models::AdminDashboardStats};

/// get_stats
///
/// [Admin Route] Landing-page counters.
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminDashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_stats(user: AuthUser, State(state): State<AppState>) -> JsonResult<AdminDashboardStats> {
    user.require_admin()?;
    ok(state.repo.get_stats().await?)
}
