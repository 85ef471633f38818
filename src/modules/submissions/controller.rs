use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::{check_any_role, check_role};
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationParams;
use crate::validator::ValidatedJson;

use super::model::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, Submission,
    SubmissionWithStudent,
};
use super::service::SubmissionService;

#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = CreateSubmissionDto,
    responses(
        (status = 201, description = "Submission created", body = Submission),
        (status = 400, description = "Deadline passed or attempts exhausted"),
        (status = 403, description = "Not enrolled in the course"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateSubmissionDto>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    check_role(&auth_user, UserRole::Student)?;

    let student_id = auth_user.user_id()?;
    let submission = SubmissionService::create_submission(&state.db, student_id, dto).await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// A student's submissions. Students may only read their own; admin
/// tiers may read anyone's.
#[utoipa::path(
    get,
    path = "/api/submissions/student/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "The student's submissions", body = PaginatedSubmissionsResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_submissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(student_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedSubmissionsResponse>, AppError> {
    if auth_user.role() == UserRole::Student && auth_user.user_id()? != student_id {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Students can only view their own submissions"
        )));
    }
    if auth_user.role() == UserRole::Teacher {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "Teachers view submissions per assignment"
        )));
    }

    let submissions = SubmissionService::get_student_submissions(
        &state.db,
        state.storage.as_ref(),
        student_id,
        pagination,
    )
    .await?;

    Ok(Json(submissions))
}

#[utoipa::path(
    get,
    path = "/api/submissions/assignment/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Submissions to the assignment", body = [SubmissionWithStudent]),
        (status = 403, description = "Not a teacher of this course"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignment_submissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<Vec<SubmissionWithStudent>>, AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    let submissions =
        SubmissionService::get_assignment_submissions(&state.db, teacher_id, assignment_id)
            .await?;

    Ok(Json(submissions))
}

#[utoipa::path(
    patch,
    path = "/api/submissions/{id}/grade",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = GradeSubmissionDto,
    responses(
        (status = 200, description = "Submission graded", body = Submission),
        (status = 400, description = "Grade exceeds total marks"),
        (status = 403, description = "Not a teacher of this course"),
        (status = 404, description = "Submission not found")
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn grade_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<GradeSubmissionDto>,
) -> Result<Json<Submission>, AppError> {
    check_any_role(&auth_user, &[UserRole::Teacher])?;

    let teacher_id = auth_user.user_id()?;
    let submission = SubmissionService::grade_submission(&state.db, teacher_id, id, dto).await?;

    Ok(Json(submission))
}
