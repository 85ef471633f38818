use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A tenant school. Subscription fields bound what the school may use:
/// the teacher cap is enforced when teachers are created or approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub subscription_start: chrono::DateTime<chrono::Utc>,
    pub subscription_end: chrono::DateTime<chrono::Utc>,
    pub max_teachers: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// School row with a summary of its principal, for listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SchoolWithPrincipal {
    pub id: Uuid,
    pub name: String,
    pub subscription_start: chrono::DateTime<chrono::Utc>,
    pub subscription_end: chrono::DateTime<chrono::Utc>,
    pub max_teachers: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub principal_name: Option<String>,
    pub principal_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub subscription_end: chrono::DateTime<chrono::Utc>,
    #[validate(range(min = 1, message = "max_teachers must be at least 1"))]
    pub max_teachers: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub subscription_end: Option<chrono::DateTime<chrono::Utc>>,
    #[validate(range(min = 1, message = "max_teachers must be at least 1"))]
    pub max_teachers: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignPrincipalDto {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct SchoolFilterParams {
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<SchoolWithPrincipal>,
    pub meta: crate::utils::pagination::PaginationMeta,
}
