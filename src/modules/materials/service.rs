use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::courses::service::CourseService;
use crate::modules::notifications::service::NotificationService;
use crate::utils::errors::AppError;

use super::model::{
    CreateAssignmentDto, CreateNotesDto, MaterialDetail, StudentMaterialView, UpdateMaterialDto,
};

const MATERIAL_DETAIL_QUERY: &str = r#"
    SELECT m.id, m.course_id, m.created_by, m.title, m.kind, m.is_deleted,
           m.created_at, m.updated_at,
           n.content_url,
           a.assignment_kind, a.total_marks, a.due_date, a.max_attempts, a.description
    FROM learning_materials m
    LEFT JOIN notes n ON n.material_id = m.id
    LEFT JOIN assignments a ON a.material_id = m.id
"#;

pub struct MaterialService;

impl MaterialService {
    /// Create a notes material. The teacher must be assigned to the
    /// course; enrolled students are notified.
    #[instrument(skip(dto))]
    pub async fn create_notes(
        db: &PgPool,
        teacher_id: Uuid,
        dto: CreateNotesDto,
    ) -> Result<MaterialDetail, AppError> {
        Self::check_teacher_of_course(db, teacher_id, dto.course_id).await?;

        let mut tx = db.begin().await?;

        let material_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO learning_materials (course_id, created_by, title, kind)
               VALUES ($1, $2, $3, 'notes')
               RETURNING id"#,
        )
        .bind(dto.course_id)
        .bind(teacher_id)
        .bind(&dto.title)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO notes (material_id, content_url) VALUES ($1, $2)")
            .bind(material_id)
            .bind(&dto.content_url)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::notify_enrolled_students(
            db,
            dto.course_id,
            &format!("New notes published: {}", dto.title),
        )
        .await?;

        ActivityLogService::record(
            db,
            Some(teacher_id),
            None,
            "create_notes",
            Some("learning_material"),
            Some(material_id),
            None,
        )
        .await;

        Self::get_material_by_id(db, material_id).await
    }

    /// Create an assignment material with its grading parameters.
    #[instrument(skip(dto))]
    pub async fn create_assignment(
        db: &PgPool,
        teacher_id: Uuid,
        dto: CreateAssignmentDto,
    ) -> Result<MaterialDetail, AppError> {
        Self::check_teacher_of_course(db, teacher_id, dto.course_id).await?;

        let mut tx = db.begin().await?;

        let material_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO learning_materials (course_id, created_by, title, kind)
               VALUES ($1, $2, $3, 'assignment')
               RETURNING id"#,
        )
        .bind(dto.course_id)
        .bind(teacher_id)
        .bind(&dto.title)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO assignments (material_id, assignment_kind, total_marks, due_date, max_attempts, description)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(material_id)
        .bind(dto.assignment_kind)
        .bind(dto.total_marks)
        .bind(dto.due_date)
        .bind(dto.max_attempts.unwrap_or(1))
        .bind(&dto.description)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::notify_enrolled_students(
            db,
            dto.course_id,
            &format!("New assignment published: {} (due {})", dto.title, dto.due_date),
        )
        .await?;

        ActivityLogService::record(
            db,
            Some(teacher_id),
            None,
            "create_assignment",
            Some("learning_material"),
            Some(material_id),
            None,
        )
        .await;

        Self::get_material_by_id(db, material_id).await
    }

    #[instrument]
    pub async fn get_material_by_id(
        db: &PgPool,
        material_id: Uuid,
    ) -> Result<MaterialDetail, AppError> {
        let query = format!("{} WHERE m.id = $1", MATERIAL_DETAIL_QUERY);

        sqlx::query_as::<_, MaterialDetail>(&query)
            .bind(material_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Material not found")))
    }

    /// Materials of a course as seen by teachers and admin tiers.
    #[instrument]
    pub async fn get_course_materials(
        db: &PgPool,
        course_id: Uuid,
    ) -> Result<Vec<MaterialDetail>, AppError> {
        let query = format!(
            "{} WHERE m.course_id = $1 AND m.is_deleted = FALSE ORDER BY m.created_at DESC",
            MATERIAL_DETAIL_QUERY
        );

        let materials = sqlx::query_as::<_, MaterialDetail>(&query)
            .bind(course_id)
            .fetch_all(db)
            .await?;

        Ok(materials)
    }

    /// Materials of a course as seen by an enrolled student, including
    /// their own submission state for each assignment.
    #[instrument]
    pub async fn get_course_materials_for_student(
        db: &PgPool,
        course_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<StudentMaterialView>, AppError> {
        let enrolled = CourseService::is_student_enrolled(db, student_id, course_id).await?;
        if !enrolled {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "You are not enrolled in this course"
            )));
        }

        let materials = sqlx::query_as::<_, StudentMaterialView>(
            r#"SELECT m.id, m.course_id, m.created_by, m.title, m.kind,
                      m.created_at, m.updated_at,
                      n.content_url,
                      a.assignment_kind, a.total_marks, a.due_date, a.max_attempts, a.description,
                      COALESCE(sub.attempts_used, 0) AS attempts_used,
                      COALESCE(sub.attempts_used, 0) > 0 AS submitted,
                      sub.grade
               FROM learning_materials m
               LEFT JOIN notes n ON n.material_id = m.id
               LEFT JOIN assignments a ON a.material_id = m.id
               LEFT JOIN LATERAL (
                   SELECT COUNT(*) AS attempts_used,
                          (SELECT s2.grade FROM submissions s2
                           WHERE s2.assignment_id = m.id AND s2.student_id = $2
                           ORDER BY s2.submitted_at DESC LIMIT 1) AS grade
                   FROM submissions s
                   WHERE s.assignment_id = m.id AND s.student_id = $2
               ) sub ON m.kind = 'assignment'
               WHERE m.course_id = $1 AND m.is_deleted = FALSE
               ORDER BY m.created_at DESC"#,
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(materials)
    }

    /// Everything a teacher has published, across their courses.
    #[instrument]
    pub async fn get_teacher_materials(
        db: &PgPool,
        teacher_id: Uuid,
    ) -> Result<Vec<MaterialDetail>, AppError> {
        let query = format!(
            "{} WHERE m.created_by = $1 AND m.is_deleted = FALSE ORDER BY m.created_at DESC",
            MATERIAL_DETAIL_QUERY
        );

        let materials = sqlx::query_as::<_, MaterialDetail>(&query)
            .bind(teacher_id)
            .fetch_all(db)
            .await?;

        Ok(materials)
    }

    /// Update the shared and kind-specific fields. Only the creating
    /// teacher may touch their material here; admin edits go through the
    /// same check in the controller with the creator's id.
    #[instrument(skip(dto))]
    pub async fn update_material(
        db: &PgPool,
        material_id: Uuid,
        teacher_id: Uuid,
        dto: UpdateMaterialDto,
    ) -> Result<MaterialDetail, AppError> {
        let existing = Self::get_material_by_id(db, material_id).await?;

        if existing.created_by != teacher_id {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Only the creating teacher can modify this material"
            )));
        }

        let mut tx = db.begin().await?;

        if let Some(title) = &dto.title {
            sqlx::query(
                "UPDATE learning_materials SET title = $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(title)
            .bind(material_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("UPDATE learning_materials SET updated_at = NOW() WHERE id = $1")
                .bind(material_id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(content_url) = &dto.content_url {
            sqlx::query("UPDATE notes SET content_url = $1 WHERE material_id = $2")
                .bind(content_url)
                .bind(material_id)
                .execute(&mut *tx)
                .await?;
        }

        if dto.due_date.is_some()
            || dto.total_marks.is_some()
            || dto.max_attempts.is_some()
            || dto.description.is_some()
        {
            sqlx::query(
                r#"UPDATE assignments
                   SET due_date = COALESCE($1, due_date),
                       total_marks = COALESCE($2, total_marks),
                       max_attempts = COALESCE($3, max_attempts),
                       description = COALESCE($4, description)
                   WHERE material_id = $5"#,
            )
            .bind(dto.due_date)
            .bind(dto.total_marks)
            .bind(dto.max_attempts)
            .bind(&dto.description)
            .bind(material_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Self::get_material_by_id(db, material_id).await
    }

    #[instrument]
    pub async fn delete_material(
        db: &PgPool,
        material_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<(), AppError> {
        let existing = Self::get_material_by_id(db, material_id).await?;

        if existing.created_by != teacher_id {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Only the creating teacher can delete this material"
            )));
        }

        sqlx::query(
            "UPDATE learning_materials SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(material_id)
        .execute(db)
        .await?;

        Ok(())
    }

    #[instrument]
    pub async fn restore_material(
        db: &PgPool,
        material_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<MaterialDetail, AppError> {
        let existing = Self::get_material_by_id(db, material_id).await?;

        if existing.created_by != teacher_id {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Only the creating teacher can restore this material"
            )));
        }

        sqlx::query(
            "UPDATE learning_materials SET is_deleted = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(material_id)
        .execute(db)
        .await?;

        Self::get_material_by_id(db, material_id).await
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

    async fn notify_enrolled_students(
        db: &PgPool,
        course_id: Uuid,
        message: &str,
    ) -> Result<(), AppError> {
        let student_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT student_id FROM course_students WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        for student_id in student_ids {
            NotificationService::notify(db, student_id, "new_material", message).await;
        }

        Ok(())
    }
}
