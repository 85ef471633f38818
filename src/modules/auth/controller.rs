use axum::Json;
use axum::extract::{Path, Query, State};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    ChangePasswordRequestDto, LoginRequest, LogoutRequest, MessageResponse,
    PaginatedPasswordRequestsResponse, PasswordRequestFilterParams, RefreshRequest,
    SwitchRoleRequest, TokenResponse,
};
use super::service::AuthService;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Login and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::login(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = TokenResponse),
        (status = 401, description = "Invalid, expired, or reused refresh token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = AuthService::refresh(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Revoke a refresh token (idempotent)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::logout(&state.db, &dto.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Revoke every session of the authenticated user
#[utoipa::path(
    post,
    path = "/api/auth/logout-all",
    responses(
        (status = 200, description = "All sessions revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn logout_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    AuthService::logout_all(&state.db, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out from all sessions".to_string(),
    }))
}

/// Request a password change
///
/// Super admins change their password immediately; everyone else stages a
/// request for their approver tier.
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequestDto,
    responses(
        (status = 200, description = "Password changed or request staged", body = MessageResponse),
        (status = 400, description = "Current password is incorrect", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "A request is already pending", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequestDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let message = AuthService::change_password(&state.db, user_id, dto).await?;
    Ok(Json(MessageResponse { message }))
}

/// Mint a token pair acting as a lower role
#[utoipa::path(
    post,
    path = "/api/auth/switch-role",
    request_body = SwitchRoleRequest,
    responses(
        (status = 200, description = "Token pair for the requested role", body = TokenResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Switch not allowed", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn switch_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SwitchRoleRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let response =
        AuthService::switch_role(&state.db, user_id, dto.role, &state.jwt_config).await?;
    Ok(Json(response))
}

/// List password change requests awaiting the caller's tier
#[utoipa::path(
    get,
    path = "/api/auth/password-requests",
    params(PasswordRequestFilterParams),
    responses(
        (status = 200, description = "Requests visible to the caller", body = PaginatedPasswordRequestsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller has no approval tier", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_password_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<PasswordRequestFilterParams>,
) -> Result<Json<PaginatedPasswordRequestsResponse>, AppError> {
    let response = AuthService::list_password_requests(
        &state.db,
        auth_user.role(),
        auth_user.school_id(),
        filters,
    )
    .await?;
    Ok(Json(response))
}

/// Approve a password change request
#[utoipa::path(
    patch,
    path = "/api/auth/password-requests/{id}/approve",
    params(("id" = Uuid, Path, description = "Password change request ID")),
    responses(
        (status = 200, description = "Request approved", body = MessageResponse),
        (status = 403, description = "Tier or school mismatch", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already resolved", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn approve_password_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let approver_id = auth_user.user_id()?;
    let message = AuthService::approve_password_request(
        &state.db,
        approver_id,
        auth_user.role(),
        auth_user.school_id(),
        id,
    )
    .await?;
    Ok(Json(MessageResponse { message }))
}

/// Reject a password change request
#[utoipa::path(
    patch,
    path = "/api/auth/password-requests/{id}/reject",
    params(("id" = Uuid, Path, description = "Password change request ID")),
    responses(
        (status = 200, description = "Request rejected", body = MessageResponse),
        (status = 403, description = "Tier or school mismatch", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request already resolved", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reject_password_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let approver_id = auth_user.user_id()?;
    let message = AuthService::reject_password_request(
        &state.db,
        approver_id,
        auth_user.role(),
        auth_user.school_id(),
        id,
    )
    .await?;
    Ok(Json(MessageResponse { message }))
}
