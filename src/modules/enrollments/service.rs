use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::courses::service::CourseService;
use crate::modules::notifications::service::NotificationService;
use crate::modules::users::model::{UserRole, UserView};
use crate::utils::errors::AppError;

use super::model::{AssignTeacherDto, EnrollStudentDto, TeacherAssignmentView};

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enroll a student in a course of the same school.
    #[instrument]
    pub async fn enroll_student(
        db: &PgPool,
        school_id: Option<Uuid>,
        dto: EnrollStudentDto,
    ) -> Result<(), AppError> {
        let course = CourseService::get_course_by_id(db, dto.course_id, school_id).await?;
        let student = Self::get_school_member(db, dto.student_id, UserRole::Student).await?;

        if student.school_id != Some(course.school_id) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Student belongs to a different school than the course"
            )));
        }

        let result = sqlx::query(
            r#"INSERT INTO course_students (student_id, course_id, school_id)
               VALUES ($1, $2, $3)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(dto.student_id)
        .bind(dto.course_id)
        .bind(course.school_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Student is already enrolled in this course"
            )));
        }

        NotificationService::notify(
            db,
            student.id,
            "enrollment",
            &format!("You have been enrolled in {}.", course.name),
        )
        .await;

        ActivityLogService::record(
            db,
            Some(student.id),
            Some(course.school_id),
            "enroll_student",
            Some("course"),
            Some(course.id),
            None,
        )
        .await;

        Ok(())
    }

    /// Assign a teacher to a course of the same school.
    #[instrument]
    pub async fn assign_teacher(
        db: &PgPool,
        school_id: Option<Uuid>,
        dto: AssignTeacherDto,
    ) -> Result<(), AppError> {
        let course = CourseService::get_course_by_id(db, dto.course_id, school_id).await?;
        let teacher = Self::get_school_member(db, dto.teacher_id, UserRole::Teacher).await?;

        if teacher.school_id != Some(course.school_id) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Teacher belongs to a different school than the course"
            )));
        }

        let result = sqlx::query(
            r#"INSERT INTO course_teachers (teacher_id, course_id, school_id)
               VALUES ($1, $2, $3)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(dto.teacher_id)
        .bind(dto.course_id)
        .bind(course.school_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Teacher is already assigned to this course"
            )));
        }

        NotificationService::notify(
            db,
            teacher.id,
            "course_assignment",
            &format!("You have been assigned to teach {}.", course.name),
        )
        .await;

        ActivityLogService::record(
            db,
            Some(teacher.id),
            Some(course.school_id),
            "assign_teacher",
            Some("course"),
            Some(course.id),
            None,
        )
        .await;

        Ok(())
    }

    /// Teacher assignments, school-scoped for principals.
    #[instrument]
    pub async fn get_teacher_assignments(
        db: &PgPool,
        school_id: Option<Uuid>,
    ) -> Result<Vec<TeacherAssignmentView>, AppError> {
        let mut query = String::from(
            r#"SELECT ct.teacher_id, u.name AS teacher_name, u.email AS teacher_email,
                      ct.course_id, c.name AS course_name, ct.school_id
               FROM course_teachers ct
               JOIN users u ON u.id = ct.teacher_id
               JOIN courses c ON c.id = ct.course_id
               WHERE c.is_deleted = FALSE"#,
        );
        if school_id.is_some() {
            query.push_str(" AND ct.school_id = $1");
        }
        query.push_str(" ORDER BY c.name, u.name");

        let mut sql = sqlx::query_as::<_, TeacherAssignmentView>(&query);
        if let Some(school_id) = school_id {
            sql = sql.bind(school_id);
        }

        Ok(sql.fetch_all(db).await?)
    }

    async fn get_school_member(
        db: &PgPool,
        user_id: Uuid,
        expected_role: UserRole,
    ) -> Result<UserView, AppError> {
        let user = sqlx::query_as::<_, UserView>(
            r#"SELECT id, name, email, role, school_id, is_deleted, created_at, updated_at
               FROM users WHERE id = $1 AND is_deleted = FALSE"#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if user.role != expected_role {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "User {} is a {}, expected a {}",
                user.email,
                user.role,
                expected_role
            )));
        }

        Ok(user)
    }
}
