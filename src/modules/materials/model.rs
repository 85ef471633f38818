use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Kind discriminator for learning materials. Stored as the Postgres
/// `material_kind` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "material_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Notes,
    Assignment,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "assignment_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    Mcq,
    Long,
}

/// A learning material with its kind-specific detail columns joined in.
/// Notes rows carry `content_url`; assignment rows carry the grading
/// fields.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MaterialDetail {
    pub id: Uuid,
    pub course_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub kind: MaterialKind,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub content_url: Option<String>,
    pub assignment_kind: Option<AssignmentKind>,
    pub total_marks: Option<f64>,
    pub due_date: Option<chrono::NaiveDate>,
    pub max_attempts: Option<i32>,
    pub description: Option<String>,
}

/// Material listing row for students: detail columns plus the student's
/// own submission state.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StudentMaterialView {
    pub id: Uuid,
    pub course_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub kind: MaterialKind,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub content_url: Option<String>,
    pub assignment_kind: Option<AssignmentKind>,
    pub total_marks: Option<f64>,
    pub due_date: Option<chrono::NaiveDate>,
    pub max_attempts: Option<i32>,
    pub description: Option<String>,
    pub attempts_used: i64,
    pub submitted: bool,
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNotesDto {
    pub course_id: Uuid,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[validate(url(message = "content_url must be a valid URL"))]
    pub content_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    pub course_id: Uuid,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub assignment_kind: AssignmentKind,
    #[validate(range(min = 0.0, message = "total_marks must not be negative"))]
    pub total_marks: f64,
    pub due_date: chrono::NaiveDate,
    #[validate(range(min = 1, message = "max_attempts must be at least 1"))]
    pub max_attempts: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateMaterialDto {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    /// Notes only.
    #[validate(url(message = "content_url must be a valid URL"))]
    pub content_url: Option<String>,
    /// Assignments only.
    pub due_date: Option<chrono::NaiveDate>,
    #[validate(range(min = 0.0, message = "total_marks must not be negative"))]
    pub total_marks: Option<f64>,
    #[validate(range(min = 1, message = "max_attempts must be at least 1"))]
    pub max_attempts: Option<i32>,
    pub description: Option<String>,
}
