//! User data models and DTOs.
//!
//! # Core Types
//!
//! - [`User`] - Base user entity from the database
//! - [`UserRole`] - The four-tier role hierarchy
//!
//! # Role Hierarchy
//!
//! ```text
//! Super Admin (CLI-created, no school scope)
//!     ↓ approves principals
//! Principal (school-scoped)
//!     ↓ approves teachers
//! Teacher (school-scoped)
//!     ↓ approves students
//! Student (school-scoped)
//! ```

use crate::utils::serde::{deserialize_optional_bool, deserialize_optional_uuid};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// System role of a user. Stored in Postgres as the `user_role` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Principal,
    Teacher,
    Student,
}

impl UserRole {
    /// The role tier responsible for approving this role's requests
    /// (password changes, signups). Super admins have no approver.
    pub fn approver(&self) -> Option<UserRole> {
        match self {
            UserRole::SuperAdmin => None,
            UserRole::Principal => Some(UserRole::SuperAdmin),
            UserRole::Teacher => Some(UserRole::Principal),
            UserRole::Student => Some(UserRole::Teacher),
        }
    }

    /// Whether a user with this base role may mint tokens acting as
    /// `target`. Switches are downward-only; switching back to the base
    /// role is always allowed and handled by the caller.
    pub fn can_switch_to(&self, target: UserRole) -> bool {
        match self {
            UserRole::SuperAdmin => matches!(
                target,
                UserRole::Principal | UserRole::Teacher | UserRole::Student
            ),
            UserRole::Principal => matches!(target, UserRole::Teacher | UserRole::Student),
            UserRole::Teacher => matches!(target, UserRole::Student),
            UserRole::Student => false,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Principal => "principal",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        };
        write!(f, "{}", s)
    }
}

/// A user in the system.
///
/// Users belong to exactly one school, except super admins which have no
/// school scope. Soft-deleted users are excluded from authentication and
/// from listings unless explicitly requested.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub school_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// User fields safe to return to clients.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub school_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
    /// Required for all roles except super_admin. Principals may omit it;
    /// their own school is used.
    pub school_id: Option<Uuid>,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    /// Include soft-deleted users in the listing.
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub include_deleted: Option<bool>,
    /// School ID - required for super admins to scope the query
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: crate::utils::pagination::PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<UserView>,
    pub meta: crate::utils::pagination::PaginationMeta,
}
