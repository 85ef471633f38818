use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::auth_helpers::school_scope;
use crate::utils::errors::AppError;

use super::model::{ActivityLogFilterParams, PaginatedActivityLogsResponse};
use super::service::ActivityLogService;

#[utoipa::path(
    get,
    path = "/api/activity-logs",
    params(ActivityLogFilterParams),
    responses(
        (status = 200, description = "Paginated activity logs", body = PaginatedActivityLogsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin tiers only")
    ),
    tag = "Activity Logs",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_activity_logs(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<ActivityLogFilterParams>,
) -> Result<Json<PaginatedActivityLogsResponse>, AppError> {
    let logs =
        ActivityLogService::get_activity_logs(&state.db, school_scope(&auth_user), filters).await?;
    Ok(Json(logs))
}
