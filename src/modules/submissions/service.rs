use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::courses::service::CourseService;
use crate::modules::notifications::service::NotificationService;
use crate::utils::errors::AppError;
use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::storage::FileStorage;

use super::model::{
    CreateSubmissionDto, GradeSubmissionDto, PaginatedSubmissionsResponse, Submission,
    SubmissionWithStudent,
};

/// The assignment columns submission checks need, joined with the course.
#[derive(Debug, sqlx::FromRow)]
struct AssignmentTarget {
    course_id: Uuid,
    total_marks: f64,
    due_date: chrono::NaiveDate,
    max_attempts: i32,
}

pub struct SubmissionService;

impl SubmissionService {
    /// Submit work for an assignment. Enforces enrollment, the deadline,
    /// and the assignment's attempt cap.
    #[instrument(skip(dto))]
    pub async fn create_submission(
        db: &PgPool,
        student_id: Uuid,
        dto: CreateSubmissionDto,
    ) -> Result<Submission, AppError> {
        let assignment = Self::get_assignment_target(db, dto.assignment_id).await?;

        let enrolled =
            CourseService::is_student_enrolled(db, student_id, assignment.course_id).await?;
        if !enrolled {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "You are not enrolled in this course"
            )));
        }

        if Utc::now().date_naive() > assignment.due_date {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Submission deadline has passed."
            )));
        }

        let attempts_used = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE assignment_id = $1 AND student_id = $2",
        )
        .bind(dto.assignment_id)
        .bind(student_id)
        .fetch_one(db)
        .await?;

        if attempts_used >= assignment.max_attempts as i64 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You have used all {} attempts for this assignment.",
                assignment.max_attempts
            )));
        }

        let submission = sqlx::query_as::<_, Submission>(
            r#"INSERT INTO submissions (assignment_id, student_id, file_url, object_key, comments)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, assignment_id, student_id, file_url, object_key, comments,
                         grade, feedback, submitted_at, graded_at"#,
        )
        .bind(dto.assignment_id)
        .bind(student_id)
        .bind(&dto.file_url)
        .bind(&dto.object_key)
        .bind(&dto.comments)
        .fetch_one(db)
        .await?;

        ActivityLogService::record(
            db,
            Some(student_id),
            None,
            "submit_assignment",
            Some("submission"),
            Some(submission.id),
            Some(&format!("Submitted to assignment {}", dto.assignment_id)),
        )
        .await;

        Ok(submission)
    }

    /// A student's own submissions, newest first. Download URLs are
    /// regenerated from the storage client for rows that carry a key.
    #[instrument(skip(storage))]
    pub async fn get_student_submissions(
        db: &PgPool,
        storage: &dyn FileStorage,
        student_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedSubmissionsResponse, AppError> {
        let limit = pagination.limit();
        let offset = pagination.offset();

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_one(db)
        .await?;

        let mut submissions = sqlx::query_as::<_, Submission>(
            r#"SELECT * FROM submissions WHERE student_id = $1
               ORDER BY submitted_at DESC LIMIT $2 OFFSET $3"#,
        )
        .bind(student_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        for submission in &mut submissions {
            if let Some(key) = &submission.object_key
                && let Ok(url) = storage.get_url(key)
            {
                submission.file_url = url;
            }
        }

        Ok(PaginatedSubmissionsResponse {
            data: submissions,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: None,
                has_more: offset + limit < total,
            },
        })
    }

    /// Submissions to one assignment, for a teacher of its course.
    #[instrument]
    pub async fn get_assignment_submissions(
        db: &PgPool,
        teacher_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Vec<SubmissionWithStudent>, AppError> {
        let assignment = Self::get_assignment_target(db, assignment_id).await?;
        Self::check_teacher_of_course(db, teacher_id, assignment.course_id).await?;

        let submissions = sqlx::query_as::<_, SubmissionWithStudent>(
            r#"SELECT s.id, s.assignment_id, s.student_id,
                      u.name AS student_name, u.email AS student_email,
                      s.file_url, s.object_key, s.comments, s.grade, s.feedback,
                      s.submitted_at, s.graded_at
               FROM submissions s
               JOIN users u ON u.id = s.student_id
               WHERE s.assignment_id = $1
               ORDER BY s.submitted_at DESC"#,
        )
        .bind(assignment_id)
        .fetch_all(db)
        .await?;

        Ok(submissions)
    }

    /// Grade a submission. The grade is capped by the assignment's total
    /// marks; the student is notified.
    #[instrument(skip(dto))]
    pub async fn grade_submission(
        db: &PgPool,
        teacher_id: Uuid,
        submission_id: Uuid,
        dto: GradeSubmissionDto,
    ) -> Result<Submission, AppError> {
        let submission = sqlx::query_as::<_, Submission>(
            "SELECT * FROM submissions WHERE id = $1",
        )
        .bind(submission_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Submission not found")))?;

        let assignment = Self::get_assignment_target(db, submission.assignment_id).await?;
        Self::check_teacher_of_course(db, teacher_id, assignment.course_id).await?;

        if dto.grade > assignment.total_marks {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Grade {} exceeds the assignment's total marks of {}",
                dto.grade,
                assignment.total_marks
            )));
        }

        let graded = sqlx::query_as::<_, Submission>(
            r#"UPDATE submissions SET grade = $1, feedback = $2, graded_at = NOW()
               WHERE id = $3
               RETURNING id, assignment_id, student_id, file_url, object_key, comments,
                         grade, feedback, submitted_at, graded_at"#,
        )
        .bind(dto.grade)
        .bind(&dto.feedback)
        .bind(submission_id)
        .fetch_one(db)
        .await?;

        NotificationService::notify(
            db,
            graded.student_id,
            "submission_graded",
            &format!(
                "Your submission was graded: {}/{}.",
                dto.grade, assignment.total_marks
            ),
        )
        .await;

        ActivityLogService::record(
            db,
            Some(teacher_id),
            None,
            "grade_submission",
            Some("submission"),
            Some(graded.id),
            None,
        )
        .await;

        Ok(graded)
    }

    async fn get_assignment_target(
        db: &PgPool,
        assignment_id: Uuid,
    ) -> Result<AssignmentTarget, AppError> {
        sqlx::query_as::<_, AssignmentTarget>(
            r#"SELECT m.course_id, a.total_marks, a.due_date, a.max_attempts
               FROM assignments a
               JOIN learning_materials m ON m.id = a.material_id
               WHERE a.material_id = $1 AND m.is_deleted = FALSE"#,
        )
        .bind(assignment_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Assignment not found")))
    }

    async fn check_teacher_of_course(
        db: &PgPool,
        teacher_id: Uuid,
        course_id: Uuid,
    ) -> Result<(), AppError> {
        let assigned = CourseService::is_teacher_of_course(db, teacher_id, course_id).await?;
        if !assigned {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "You are not assigned to this course"
            )));
        }

        Ok(())
    }
}
