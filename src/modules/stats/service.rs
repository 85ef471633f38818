use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;

use super::model::{AdminStats, StudentStats, TeacherStats};

pub struct StatsService;

impl StatsService {
    #[instrument]
    pub async fn admin_stats(
        db: &PgPool,
        school_id: Option<Uuid>,
    ) -> Result<AdminStats, AppError> {
        // One roundtrip; every count respects the optional school scope.
        let row = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            r#"SELECT
                (SELECT COUNT(*) FROM users
                 WHERE role = 'principal' AND is_deleted = FALSE
                   AND ($1::uuid IS NULL OR school_id = $1)),
                (SELECT COUNT(*) FROM users
                 WHERE role = 'teacher' AND is_deleted = FALSE
                   AND ($1::uuid IS NULL OR school_id = $1)),
                (SELECT COUNT(*) FROM users
                 WHERE role = 'student' AND is_deleted = FALSE
                   AND ($1::uuid IS NULL OR school_id = $1)),
                (SELECT COUNT(*) FROM courses
                 WHERE is_deleted = FALSE
                   AND ($1::uuid IS NULL OR school_id = $1)),
                (SELECT COUNT(*) FROM submissions s
                 JOIN learning_materials m ON m.id = s.assignment_id
                 JOIN courses c ON c.id = m.course_id
                 WHERE $1::uuid IS NULL OR c.school_id = $1)"#,
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        Ok(AdminStats {
            principals: row.0,
            teachers: row.1,
            students: row.2,
            courses: row.3,
            submissions: row.4,
        })
    }

    #[instrument]
    pub async fn teacher_stats(db: &PgPool, teacher_id: Uuid) -> Result<TeacherStats, AppError> {
        let row = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"SELECT
                (SELECT COUNT(*) FROM course_teachers WHERE teacher_id = $1),
                (SELECT COUNT(*) FROM learning_materials
                 WHERE created_by = $1 AND is_deleted = FALSE),
                (SELECT COUNT(*) FROM submissions s
                 JOIN learning_materials m ON m.id = s.assignment_id
                 JOIN course_teachers ct ON ct.course_id = m.course_id
                 WHERE ct.teacher_id = $1 AND s.graded_at IS NULL)"#,
        )
        .bind(teacher_id)
        .fetch_one(db)
        .await?;

        Ok(TeacherStats {
            courses_taught: row.0,
            materials: row.1,
            ungraded_submissions: row.2,
        })
    }

    #[instrument]
    pub async fn student_stats(db: &PgPool, student_id: Uuid) -> Result<StudentStats, AppError> {
        let row = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"SELECT
                (SELECT COUNT(*) FROM course_students WHERE student_id = $1),
                (SELECT COUNT(*) FROM submissions WHERE student_id = $1),
                (SELECT COUNT(*) FROM submissions
                 WHERE student_id = $1 AND graded_at IS NOT NULL)"#,
        )
        .bind(student_id)
        .fetch_one(db)
        .await?;

        Ok(StudentStats {
            enrollments: row.0,
            submissions: row.1,
            graded: row.2,
        })
    }
}
