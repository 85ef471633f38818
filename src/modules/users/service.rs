use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, User, UserFilterParams, UserRole,
    UserView,
};
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;
use crate::utils::password::hash_password;

pub struct UserService;

const USER_VIEW_COLUMNS: &str =
    "id, name, email, role, school_id, is_deleted, created_at, updated_at";

impl UserService {
    /// Create a user within a school. Super admins cannot be created here;
    /// they only come from the CLI.
    #[instrument(skip(dto))]
    pub async fn create_user(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateUserDto,
    ) -> Result<UserView, AppError> {
        if dto.role == UserRole::SuperAdmin {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Super admins cannot be created through the API"
            )));
        }

        if dto.role == UserRole::Teacher {
            Self::check_teacher_limit(db, school_id).await?;
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, UserView>(&format!(
            r#"INSERT INTO users (name, email, password_hash, role, school_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {USER_VIEW_COLUMNS}"#
        ))
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(&password_hash)
        .bind(dto.role)
        .bind(school_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A user with this email already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    #[instrument]
    pub async fn get_users(
        db: &PgPool,
        school_id: Option<Uuid>,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let include_deleted = filters.include_deleted.unwrap_or(false);

        let mut where_clause = String::from("WHERE 1 = 1");
        let mut idx = 0;
        if school_id.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND school_id = ${}", idx));
        }
        if filters.role.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND role = ${}", idx));
        }
        if !include_deleted {
            where_clause.push_str(" AND is_deleted = FALSE");
        }

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(school_id) = school_id {
            count_sql = count_sql.bind(school_id);
        }
        if let Some(role) = filters.role {
            count_sql = count_sql.bind(role);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {USER_VIEW_COLUMNS} FROM users {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, UserView>(&data_query);
        if let Some(school_id) = school_id {
            data_sql = data_sql.bind(school_id);
        }
        if let Some(role) = filters.role {
            data_sql = data_sql.bind(role);
        }
        let users = data_sql.fetch_all(db).await?;

        Ok(PaginatedUsersResponse {
            data: users,
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
    pub async fn get_user_by_id(
        db: &PgPool,
        user_id: Uuid,
        school_id: Option<Uuid>,
    ) -> Result<UserView, AppError> {
        let mut query = format!("SELECT {USER_VIEW_COLUMNS} FROM users WHERE id = $1");
        if school_id.is_some() {
            query.push_str(" AND school_id = $2");
        }

        let mut sql = sqlx::query_as::<_, UserView>(&query).bind(user_id);
        if let Some(school_id) = school_id {
            sql = sql.bind(school_id);
        }

        sql.fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(dto))]
    pub async fn update_user(
        db: &PgPool,
        user_id: Uuid,
        school_id: Option<Uuid>,
        dto: UpdateUserDto,
    ) -> Result<UserView, AppError> {
        let existing = Self::get_user_by_id(db, user_id, school_id).await?;

        let name = dto.name.unwrap_or(existing.name);
        let email = dto.email.unwrap_or(existing.email);

        let user = sqlx::query_as::<_, UserView>(&format!(
            r#"UPDATE users SET name = $1, email = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING {USER_VIEW_COLUMNS}"#
        ))
        .bind(&name)
        .bind(&email)
        .bind(user_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "A user with this email already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    /// Soft-delete a user. Their refresh tokens stay in place; the next
    /// refresh attempt fails with "User not found" and wipes them.
    #[instrument]
    pub async fn delete_user(
        db: &PgPool,
        user_id: Uuid,
        school_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let user = Self::get_user_by_id(db, user_id, school_id).await?;

        if user.role == UserRole::SuperAdmin {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Super admins cannot be deleted through the API"
            )));
        }

        sqlx::query("UPDATE users SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }

    #[instrument]
    pub async fn restore_user(
        db: &PgPool,
        user_id: Uuid,
        school_id: Option<Uuid>,
    ) -> Result<UserView, AppError> {
        // Restoring only makes sense for a deleted row, so look it up
        // without the is_deleted filter.
        let _ = Self::get_user_by_id(db, user_id, school_id).await?;

        let user = sqlx::query_as::<_, UserView>(&format!(
            r#"UPDATE users SET is_deleted = FALSE, updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_VIEW_COLUMNS}"#
        ))
        .bind(user_id)
        .fetch_one(db)
        .await?;

        Ok(user)
    }

    /// Enforce the per-school teacher cap from the school's subscription.
    pub async fn check_teacher_limit(db: &PgPool, school_id: Uuid) -> Result<(), AppError> {
        let row = sqlx::query_as::<_, (i32, i64)>(
            r#"SELECT s.max_teachers,
                      (SELECT COUNT(*) FROM users u
                       WHERE u.school_id = s.id AND u.role = 'teacher' AND u.is_deleted = FALSE)
               FROM schools s WHERE s.id = $1"#,
        )
        .bind(school_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))?;

        let (max_teachers, current) = row;
        if current >= max_teachers as i64 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "School has reached its teacher limit of {}",
                max_teachers
            )));
        }

        Ok(())
    }
}
