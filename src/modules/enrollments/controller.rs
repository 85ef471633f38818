use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::auth_helpers::school_scope;
use crate::utils::errors::AppError;

use super::model::{AssignTeacherDto, EnrollStudentDto, TeacherAssignmentView};
use super::service::EnrollmentService;

#[utoipa::path(
    post,
    path = "/api/enrollments/students",
    request_body = EnrollStudentDto,
    responses(
        (status = 201, description = "Student enrolled"),
        (status = 400, description = "Role or school mismatch"),
        (status = 403, description = "Forbidden - admin tiers only"),
        (status = 409, description = "Already enrolled")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn enroll_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(dto): Json<EnrollStudentDto>,
) -> Result<StatusCode, AppError> {
    EnrollmentService::enroll_student(&state.db, school_scope(&auth_user), dto).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    post,
    path = "/api/enrollments/teachers",
    request_body = AssignTeacherDto,
    responses(
        (status = 201, description = "Teacher assigned"),
        (status = 400, description = "Role or school mismatch"),
        (status = 403, description = "Forbidden - admin tiers only"),
        (status = 409, description = "Already assigned")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn assign_teacher(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(dto): Json<AssignTeacherDto>,
) -> Result<StatusCode, AppError> {
    EnrollmentService::assign_teacher(&state.db, school_scope(&auth_user), dto).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/api/enrollments/teachers",
    responses(
        (status = 200, description = "Teacher assignments", body = [TeacherAssignmentView]),
        (status = 403, description = "Forbidden - admin tiers only")
    ),
    tag = "Enrollments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teacher_assignments(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<TeacherAssignmentView>>, AppError> {
    let assignments =
        EnrollmentService::get_teacher_assignments(&state.db, school_scope(&auth_user)).await?;
    Ok(Json(assignments))
}
