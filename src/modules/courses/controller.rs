use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_any_role;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::auth_helpers::{resolve_school_id, school_scope};
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    Course, CourseFilterParams, CreateCourseDto, PaginatedCoursesResponse, UpdateCourseDto,
};
use super::service::CourseService;

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Forbidden - admin tiers only")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    check_any_role(&auth_user, &[UserRole::SuperAdmin, UserRole::Principal])?;

    let school_id = resolve_school_id(&auth_user, dto.school_id)?;
    let course = CourseService::create_course(&state.db, school_id, dto).await?;

    Ok((StatusCode::CREATED, Json(course)))
}

/// Role-aware listing: admin tiers see the school's catalog, teachers
/// their assignments, students their enrollments.
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Courses visible to the caller", body = PaginatedCoursesResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    let user_id = auth_user.user_id()?;

    let response = match auth_user.role() {
        UserRole::SuperAdmin => {
            let school_id = filters.school_id;
            CourseService::get_courses_by_school(&state.db, school_id, filters).await?
        }
        UserRole::Principal => {
            CourseService::get_courses_by_school(&state.db, auth_user.school_id(), filters).await?
        }
        UserRole::Teacher => {
            let courses = CourseService::get_courses_for_teacher(&state.db, user_id).await?;
            unpaginated(courses)
        }
        UserRole::Student => {
            let courses = CourseService::get_courses_for_student(&state.db, user_id).await?;
            unpaginated(courses)
        }
    };

    Ok(Json(response))
}

/// Teacher and student listings are small per-user sets; wrap them in
/// the shared envelope without slicing.
fn unpaginated(courses: Vec<Course>) -> PaginatedCoursesResponse {
    let total = courses.len() as i64;
    PaginatedCoursesResponse {
        data: courses,
        meta: crate::utils::pagination::PaginationMeta {
            total,
            limit: total.max(1),
            offset: Some(0),
            page: None,
            has_more: false,
        },
    }
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = Course),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_course_by_id(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::get_course_by_id(&state.db, id, school_scope(&auth_user)).await?;
    Ok(Json(course))
}

#[utoipa::path(
    patch,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Forbidden - admin tiers only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    check_any_role(&auth_user, &[UserRole::SuperAdmin, UserRole::Principal])?;

    let course =
        CourseService::update_course(&state.db, id, school_scope(&auth_user), dto).await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course soft-deleted"),
        (status = 403, description = "Forbidden - admin tiers only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    check_any_role(&auth_user, &[UserRole::SuperAdmin, UserRole::Principal])?;

    CourseService::delete_course(&state.db, id, school_scope(&auth_user)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/courses/{id}/restore",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course restored", body = Course),
        (status = 403, description = "Forbidden - admin tiers only"),
        (status = 404, description = "Course not found")
    ),
    tag = "Courses",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn restore_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    check_any_role(&auth_user, &[UserRole::SuperAdmin, UserRole::Principal])?;

    let course = CourseService::restore_course(&state.db, id, school_scope(&auth_user)).await?;
    Ok(Json(course))
}
