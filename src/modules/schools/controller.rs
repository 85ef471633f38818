use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    AssignPrincipalDto, CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams,
    UpdateSchoolDto,
};
use super::service::SchoolService;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created", body = School),
        (status = 400, description = "Invalid subscription window"),
        (status = 403, description = "Forbidden - super admin only"),
        (status = 409, description = "School name already in use")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_school(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let school = SchoolService::create_school(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(SchoolFilterParams),
    responses(
        (status = 200, description = "Paginated schools with principal summary", body = PaginatedSchoolsResponse),
        (status = 403, description = "Forbidden - super admin only")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_schools(
    State(state): State<AppState>,
    Query(filters): Query<SchoolFilterParams>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let schools = SchoolService::get_schools(&state.db, filters).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 404, description = "School not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_school_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::get_school_by_id(&state.db, id).await?;
    Ok(Json(school))
}

#[utoipa::path(
    patch,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = School),
        (status = 404, description = "School not found"),
        (status = 409, description = "School name already in use")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_school(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<School>, AppError> {
    let school = SchoolService::update_school(&state.db, id, dto).await?;
    Ok(Json(school))
}

#[utoipa::path(
    patch,
    path = "/api/schools/{id}/assign-principal",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = AssignPrincipalDto,
    responses(
        (status = 200, description = "Principal assigned"),
        (status = 404, description = "School or user not found")
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn assign_principal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(dto): Json<AssignPrincipalDto>,
) -> Result<StatusCode, AppError> {
    SchoolService::assign_principal(&state.db, id, dto).await?;
    Ok(StatusCode::OK)
}
