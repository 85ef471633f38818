use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    ApproveSignupDto, CreateSignupRequestDto, PaginatedSignupRequestsResponse,
    SignupRequestFilterParams, SignupRequestView,
};
use super::service::SignupService;

/// Public signup endpoint: stages a request for the approver tier.
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = CreateSignupRequestDto,
    responses(
        (status = 201, description = "Signup request staged", body = SignupRequestView),
        (status = 400, description = "Invalid role or missing school"),
        (status = 409, description = "Email already in use or request already open")
    ),
    tag = "Signup"
)]
#[instrument(skip(state, dto))]
pub async fn create_signup_request(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSignupRequestDto>,
) -> Result<(StatusCode, Json<SignupRequestView>), AppError> {
    let request = SignupService::create_signup_request(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/signup-requests",
    params(SignupRequestFilterParams),
    responses(
        (status = 200, description = "Signup requests for the caller's tier", body = PaginatedSignupRequestsResponse),
        (status = 403, description = "Caller has no approval tier")
    ),
    tag = "Signup",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_signup_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<SignupRequestFilterParams>,
) -> Result<Json<PaginatedSignupRequestsResponse>, AppError> {
    let requests = SignupService::get_signup_requests(
        &state.db,
        auth_user.role(),
        auth_user.school_id(),
        filters,
    )
    .await?;
    Ok(Json(requests))
}

#[utoipa::path(
    patch,
    path = "/api/signup-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Signup request ID")),
    request_body = ApproveSignupDto,
    responses(
        (status = 200, description = "Signup approved, user created", body = SignupRequestView),
        (status = 403, description = "Tier or school mismatch"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already resolved or teacher limit reached")
    ),
    tag = "Signup",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_signup_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Json(dto): Json<ApproveSignupDto>,
) -> Result<Json<SignupRequestView>, AppError> {
    let approver_id = auth_user.user_id()?;
    let request = SignupService::approve_signup_request(
        &state.db,
        approver_id,
        auth_user.role(),
        auth_user.school_id(),
        id,
        dto,
    )
    .await?;
    Ok(Json(request))
}

#[utoipa::path(
    patch,
    path = "/api/signup-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Signup request ID")),
    responses(
        (status = 200, description = "Signup rejected", body = SignupRequestView),
        (status = 403, description = "Tier or school mismatch"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already resolved")
    ),
    tag = "Signup",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_signup_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SignupRequestView>, AppError> {
    let approver_id = auth_user.user_id()?;
    let request = SignupService::reject_signup_request(
        &state.db,
        approver_id,
        auth_user.role(),
        auth_user.school_id(),
        id,
    )
    .await?;
    Ok(Json(request))
}
