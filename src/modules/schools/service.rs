use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::notifications::service::NotificationService;
use crate::modules::users::model::{User, UserRole};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{
    AssignPrincipalDto, CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams,
    SchoolWithPrincipal, UpdateSchoolDto,
};

const DEFAULT_MAX_TEACHERS: i32 = 10;

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(dto))]
    pub async fn create_school(db: &PgPool, dto: CreateSchoolDto) -> Result<School, AppError> {
        if dto.subscription_end <= Utc::now() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "subscription_end must be in the future"
            )));
        }

        let school = sqlx::query_as::<_, School>(
            r#"INSERT INTO schools (name, subscription_end, max_teachers)
               VALUES ($1, $2, $3)
               RETURNING id, name, subscription_start, subscription_end, max_teachers, created_at, updated_at"#,
        )
        .bind(&dto.name)
        .bind(dto.subscription_end)
        .bind(dto.max_teachers.unwrap_or(DEFAULT_MAX_TEACHERS))
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A school with this name already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(school)
    }

    #[instrument]
    pub async fn get_schools(
        db: &PgPool,
        filters: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::new();
        if filters.name.is_some() {
            where_clause.push_str(" WHERE s.name ILIKE $1");
        }

        let count_query = format!("SELECT COUNT(*) FROM schools s{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(name) = &filters.name {
            count_sql = count_sql.bind(format!("%{}%", name));
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            r#"SELECT
                s.id, s.name, s.subscription_start, s.subscription_end, s.max_teachers,
                s.created_at, s.updated_at,
                p.name AS principal_name,
                p.email AS principal_email
               FROM schools s
               LEFT JOIN users p
                 ON p.school_id = s.id AND p.role = 'principal' AND p.is_deleted = FALSE
               {}
               ORDER BY s.created_at DESC
               LIMIT {} OFFSET {}"#,
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, SchoolWithPrincipal>(&data_query);
        if let Some(name) = &filters.name {
            data_sql = data_sql.bind(format!("%{}%", name));
        }
        let schools = data_sql.fetch_all(db).await?;

        Ok(PaginatedSchoolsResponse {
            data: schools,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: None,
                has_more: offset + limit < total,
            },
        })
    }

    #[instrument]
    pub async fn get_school_by_id(db: &PgPool, school_id: Uuid) -> Result<School, AppError> {
        sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = $1")
            .bind(school_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))
    }

    #[instrument(skip(dto))]
    pub async fn update_school(
        db: &PgPool,
        school_id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        let existing = Self::get_school_by_id(db, school_id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let subscription_end = dto.subscription_end.unwrap_or(existing.subscription_end);
        let max_teachers = dto.max_teachers.unwrap_or(existing.max_teachers);

        if subscription_end <= existing.subscription_start {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "subscription_end must be after subscription_start"
            )));
        }

        let school = sqlx::query_as::<_, School>(
            r#"UPDATE schools
               SET name = $1, subscription_end = $2, max_teachers = $3, updated_at = NOW()
               WHERE id = $4
               RETURNING id, name, subscription_start, subscription_end, max_teachers, created_at, updated_at"#,
        )
        .bind(&name)
        .bind(subscription_end)
        .bind(max_teachers)
        .bind(school_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A school with this name already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(school)
    }

    /// Make an existing user the principal of a school. The user is moved
    /// into the school and promoted; a school keeps at most one active
    /// principal, so any current principal is demoted to teacher first.
    #[instrument]
    pub async fn assign_principal(
        db: &PgPool,
        school_id: Uuid,
        dto: AssignPrincipalDto,
    ) -> Result<(), AppError> {
        let school = Self::get_school_by_id(db, school_id).await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(dto.user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if user.role == UserRole::SuperAdmin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Super admins cannot be assigned to a school"
            )));
        }

        sqlx::query(
            r#"UPDATE users SET role = 'teacher', updated_at = NOW()
               WHERE school_id = $1 AND role = 'principal' AND is_deleted = FALSE AND id <> $2"#,
        )
        .bind(school_id)
        .bind(user.id)
        .execute(db)
        .await?;

        sqlx::query(
            "UPDATE users SET role = 'principal', school_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(school_id)
        .bind(user.id)
        .execute(db)
        .await?;

        NotificationService::notify(
            db,
            user.id,
            "school_assignment",
            &format!("You are now the principal of {}.", school.name),
        )
        .await;

        Ok(())
    }
}
