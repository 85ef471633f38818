use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::auth::model::ApprovalStatus;
use crate::modules::users::model::UserRole;

/// A self-service signup awaiting approval. The password is hashed at
/// submission time; no user row exists until approval.
#[derive(Debug, Clone, FromRow)]
pub struct SignupRequest {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub requested_role: UserRole,
    pub approved_role: Option<UserRole>,
    pub status: ApprovalStatus,
    pub school_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Signup request fields safe to return to clients.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SignupRequestView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub requested_role: UserRole,
    pub approved_role: Option<UserRole>,
    pub status: ApprovalStatus,
    pub school_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSignupRequestDto {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub requested_role: UserRole,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApproveSignupDto {
    /// Approve as a different role than requested (e.g. downgrade a
    /// teacher applicant to student). Defaults to the requested role.
    pub role: Option<UserRole>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct SignupRequestFilterParams {
    pub status: Option<ApprovalStatus>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSignupRequestsResponse {
    pub data: Vec<SignupRequestView>,
    pub meta: crate::utils::pagination::PaginationMeta,
}
