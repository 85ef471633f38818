use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::model::UserRole;

/// JWT claims carried by access tokens.
///
/// `role` is the effective role the token acts as; `base_role` is the
/// authentic role from the user record. They differ only after a role
/// switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub name: String,
    pub role: UserRole,
    pub base_role: UserRole,
    pub school_id: Option<Uuid>,
    pub exp: usize,
    pub iat: usize,
}

/// A persisted refresh token. The raw token is never stored; `token_hash`
/// is a salted bcrypt hash and can only be matched by verification.
///
/// Lifecycle: created at login or rotation, mutated only to flip `revoked`
/// and set `replaced_by`, physically deleted only by the expiry sweep.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub revoked: bool,
    /// Set on the superseded token, pointing at its successor.
    pub replaced_by: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Approval status shared by password change and signup requests.
/// Terminal statuses are immutable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A staged password change awaiting approval. The new hash is
/// pre-computed but not applied to the user record until approval.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub new_password_hash: String,
    pub status: ApprovalStatus,
    pub school_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Password change request joined with the requesting user, as shown to
/// approvers.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PasswordChangeRequestView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_role: UserRole,
    pub status: ApprovalStatus,
    pub school_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token must not be empty"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LogoutRequest {
    #[validate(length(min = 1, message = "refresh_token must not be empty"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequestDto {
    #[validate(length(min = 1, message = "current_password must not be empty"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "new_password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SwitchRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PasswordRequestFilterParams {
    pub status: Option<ApprovalStatus>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedPasswordRequestsResponse {
    pub data: Vec<PasswordChangeRequestView>,
    pub meta: crate::utils::pagination::PaginationMeta,
}
