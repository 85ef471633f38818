use serde::Serialize;
use utoipa::ToSchema;

/// Dashboard counts for admin tiers, scoped to one school (or all
/// schools for super admins).
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub principals: i64,
    pub teachers: i64,
    pub students: i64,
    pub courses: i64,
    pub submissions: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherStats {
    pub courses_taught: i64,
    pub materials: i64,
    pub ungraded_submissions: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentStats {
    pub enrollments: i64,
    pub submissions: i64,
    pub graded: i64,
}
