use axum::{Json, extract::State};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{check_any_role, check_role};
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::auth_helpers::school_scope;
use crate::utils::errors::AppError;

use super::model::{AdminStats, StudentStats, TeacherStats};
use super::service::StatsService;

#[utoipa::path(
    get,
    path = "/api/stats/admin",
    responses(
        (status = 200, description = "Admin dashboard counts", body = AdminStats),
        (status = 403, description = "Forbidden - admin tiers only")
    ),
    tag = "Stats",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn admin_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<AdminStats>, AppError> {
    check_any_role(&auth_user, &[UserRole::SuperAdmin, UserRole::Principal])?;

    let stats = StatsService::admin_stats(&state.db, school_scope(&auth_user)).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/stats/teacher",
    responses(
        (status = 200, description = "Teacher dashboard counts", body = TeacherStats),
        (status = 403, description = "Forbidden - teachers only")
    ),
    tag = "Stats",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn teacher_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<TeacherStats>, AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let stats = StatsService::teacher_stats(&state.db, auth_user.user_id()?).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/stats/student",
    responses(
        (status = 200, description = "Student dashboard counts", body = StudentStats),
        (status = 403, description = "Forbidden - students only")
    ),
    tag = "Stats",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn student_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<StudentStats>, AppError> {
    check_role(&auth_user, UserRole::Student)?;

    let stats = StatsService::student_stats(&state.db, auth_user.user_id()?).await?;
    Ok(Json(stats))
}
