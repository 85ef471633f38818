use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub file_url: String,
    pub object_key: Option<String>,
    pub comments: Option<String>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Submission row with the student joined in, for teacher listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SubmissionWithStudent {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub file_url: String,
    pub object_key: Option<String>,
    pub comments: Option<String>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSubmissionDto {
    pub assignment_id: Uuid,
    #[validate(url(message = "file_url must be a valid URL"))]
    pub file_url: String,
    /// Storage key when the file went through the upload endpoint; used
    /// to refresh download URLs on listing.
    pub object_key: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GradeSubmissionDto {
    #[validate(range(min = 0.0, message = "grade must not be negative"))]
    pub grade: f64,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSubmissionsResponse {
    pub data: Vec<Submission>,
    pub meta: crate::utils::pagination::PaginationMeta,
}
