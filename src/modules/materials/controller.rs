use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_role;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateAssignmentDto, CreateNotesDto, MaterialDetail, UpdateMaterialDto};
use super::service::MaterialService;

#[utoipa::path(
    post,
    path = "/api/materials/notes",
    request_body = CreateNotesDto,
    responses(
        (status = 201, description = "Notes created", body = MaterialDetail),
        (status = 403, description = "Not a teacher of this course")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_notes(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateNotesDto>,
) -> Result<(StatusCode, Json<MaterialDetail>), AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    let material = MaterialService::create_notes(&state.db, teacher_id, dto).await?;

    Ok((StatusCode::CREATED, Json(material)))
}

#[utoipa::path(
    post,
    path = "/api/materials/assignments",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = MaterialDetail),
        (status = 403, description = "Not a teacher of this course")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<MaterialDetail>), AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    let material = MaterialService::create_assignment(&state.db, teacher_id, dto).await?;

    Ok((StatusCode::CREATED, Json(material)))
}

/// Materials of a course. Students get their own submission state per
/// assignment; everyone else gets the plain detail rows.
#[utoipa::path(
    get,
    path = "/api/courses/{id}/materials",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Materials of the course"),
        (status = 403, description = "Student not enrolled in the course")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course_materials(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    if auth_user.role() == UserRole::Student {
        let student_id = auth_user.user_id()?;
        let materials =
            MaterialService::get_course_materials_for_student(&state.db, course_id, student_id)
                .await?;
        return Ok(Json(materials).into_response());
    }

    let materials = MaterialService::get_course_materials(&state.db, course_id).await?;
    Ok(Json(materials).into_response())
}

#[utoipa::path(
    get,
    path = "/api/materials/mine",
    responses(
        (status = 200, description = "Materials created by the caller", body = [MaterialDetail]),
        (status = 403, description = "Forbidden - teachers only")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_materials(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<MaterialDetail>>, AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    let materials = MaterialService::get_teacher_materials(&state.db, teacher_id).await?;
    Ok(Json(materials))
}

#[utoipa::path(
    patch,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Material ID")),
    request_body = UpdateMaterialDto,
    responses(
        (status = 200, description = "Material updated", body = MaterialDetail),
        (status = 403, description = "Not the creating teacher"),
        (status = 404, description = "Material not found")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_material(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateMaterialDto>,
) -> Result<Json<MaterialDetail>, AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    let material = MaterialService::update_material(&state.db, id, teacher_id, dto).await?;
    Ok(Json(material))
}

#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Material ID")),
    responses(
        (status = 204, description = "Material soft-deleted"),
        (status = 403, description = "Not the creating teacher"),
        (status = 404, description = "Material not found")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_material(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    MaterialService::delete_material(&state.db, id, teacher_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/materials/{id}/restore",
    params(("id" = Uuid, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material restored", body = MaterialDetail),
        (status = 403, description = "Not the creating teacher"),
        (status = 404, description = "Material not found")
    ),
    tag = "Materials",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn restore_material(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MaterialDetail>, AppError> {
    check_role(&auth_user, UserRole::Teacher)?;

    let teacher_id = auth_user.user_id()?;
    let material = MaterialService::restore_material(&state.db, id, teacher_id).await?;
    Ok(Json(material))
}
