use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollStudentDto {
    pub student_id: Uuid,
    pub course_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignTeacherDto {
    pub teacher_id: Uuid,
    pub course_id: Uuid,
}

/// One teacher-to-course assignment, joined for listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TeacherAssignmentView {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub teacher_email: String,
    pub course_id: Uuid,
    pub course_name: String,
    pub school_id: Uuid,
}
