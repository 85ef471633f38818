use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    Course, CourseFilterParams, CreateCourseDto, PaginatedCoursesResponse, UpdateCourseDto,
};

pub struct CourseService;

impl CourseService {
    #[instrument(skip(dto))]
    pub async fn create_course(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"INSERT INTO courses (school_id, name, description)
               VALUES ($1, $2, $3)
               RETURNING id, school_id, name, description, is_deleted, created_at, updated_at"#,
        )
        .bind(school_id)
        .bind(&dto.name)
        .bind(&dto.description)
        .fetch_one(db)
        .await?;

        Ok(course)
    }

    /// Listing for admin tiers: every course in the school, optionally
    /// including soft-deleted rows.
    #[instrument]
    pub async fn get_courses_by_school(
        db: &PgPool,
        school_id: Option<Uuid>,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let include_deleted = filters.include_deleted.unwrap_or(false);

        let mut where_clause = String::from("WHERE 1 = 1");
        let mut idx = 0;
        if school_id.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND school_id = ${}", idx));
        }
        if filters.name.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND name ILIKE ${}", idx));
        }
        if !include_deleted {
            where_clause.push_str(" AND is_deleted = FALSE");
        }

        let count_query = format!("SELECT COUNT(*) FROM courses {}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(school_id) = school_id {
            count_sql = count_sql.bind(school_id);
        }
        if let Some(name) = &filters.name {
            count_sql = count_sql.bind(format!("%{}%", name));
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT * FROM courses {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, Course>(&data_query);
        if let Some(school_id) = school_id {
            data_sql = data_sql.bind(school_id);
        }
        if let Some(name) = &filters.name {
            data_sql = data_sql.bind(format!("%{}%", name));
        }
        let courses = data_sql.fetch_all(db).await?;

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: None,
                has_more: offset + limit < total,
            },
        })
    }

    /// Courses a teacher is assigned to.
    #[instrument]
    pub async fn get_courses_for_teacher(
        db: &PgPool,
        teacher_id: Uuid,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"SELECT c.* FROM courses c
               JOIN course_teachers ct ON ct.course_id = c.id
               WHERE ct.teacher_id = $1 AND c.is_deleted = FALSE
               ORDER BY c.created_at DESC"#,
        )
        .bind(teacher_id)
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    /// Courses a student is enrolled in.
    #[instrument]
    pub async fn get_courses_for_student(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"SELECT c.* FROM courses c
               JOIN course_students cs ON cs.course_id = c.id
               WHERE cs.student_id = $1 AND c.is_deleted = FALSE
               ORDER BY c.created_at DESC"#,
        )
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    #[instrument]
    pub async fn get_course_by_id(
        db: &PgPool,
        course_id: Uuid,
        school_id: Option<Uuid>,
    ) -> Result<Course, AppError> {
        let mut query = String::from("SELECT * FROM courses WHERE id = $1 AND is_deleted = FALSE");
        if school_id.is_some() {
            query.push_str(" AND school_id = $2");
        }

        let mut sql = sqlx::query_as::<_, Course>(&query).bind(course_id);
        if let Some(school_id) = school_id {
            sql = sql.bind(school_id);
        }

        sql.fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    #[instrument(skip(dto))]
    pub async fn update_course(
        db: &PgPool,
        course_id: Uuid,
        school_id: Option<Uuid>,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let existing = Self::get_course_by_id(db, course_id, school_id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let description = dto.description.unwrap_or(existing.description);

        let course = sqlx::query_as::<_, Course>(
            r#"UPDATE courses SET name = $1, description = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING id, school_id, name, description, is_deleted, created_at, updated_at"#,
        )
        .bind(&name)
        .bind(&description)
        .bind(course_id)
        .fetch_one(db)
        .await?;

        Ok(course)
    }

    #[instrument]
    pub async fn delete_course(
        db: &PgPool,
        course_id: Uuid,
        school_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let _ = Self::get_course_by_id(db, course_id, school_id).await?;

        sqlx::query("UPDATE courses SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(course_id)
            .execute(db)
            .await?;

        Ok(())
    }

    #[instrument]
    pub async fn restore_course(
        db: &PgPool,
        course_id: Uuid,
        school_id: Option<Uuid>,
    ) -> Result<Course, AppError> {
        let mut query =
            String::from("SELECT * FROM courses WHERE id = $1 AND is_deleted = TRUE");
        if school_id.is_some() {
            query.push_str(" AND school_id = $2");
        }
        let mut sql = sqlx::query_as::<_, Course>(&query).bind(course_id);
        if let Some(school_id) = school_id {
            sql = sql.bind(school_id);
        }
        let _ = sql
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;

        let course = sqlx::query_as::<_, Course>(
            r#"UPDATE courses SET is_deleted = FALSE, updated_at = NOW()
               WHERE id = $1
               RETURNING id, school_id, name, description, is_deleted, created_at, updated_at"#,
        )
        .bind(course_id)
        .fetch_one(db)
        .await?;

        Ok(course)
    }

    /// Whether the teacher is assigned to the course. Used by materials
    /// and grading guards.
    pub async fn is_teacher_of_course(
        db: &PgPool,
        teacher_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM course_teachers WHERE teacher_id = $1 AND course_id = $2",
        )
        .bind(teacher_id)
        .bind(course_id)
        .fetch_one(db)
        .await?;

        Ok(count > 0)
    }

    /// Whether the student is enrolled in the course.
    pub async fn is_student_enrolled(
        db: &PgPool,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM course_students WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(db)
        .await?;

        Ok(count > 0)
    }
}
