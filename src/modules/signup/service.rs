use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::auth::model::ApprovalStatus;
use crate::modules::notifications::service::NotificationService;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;
use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;
use crate::utils::password::hash_password;

use super::model::{
    ApproveSignupDto, CreateSignupRequestDto, PaginatedSignupRequestsResponse, SignupRequest,
    SignupRequestFilterParams, SignupRequestView,
};

const SIGNUP_VIEW_COLUMNS: &str = "id, name, email, requested_role, approved_role, status, school_id, created_at, resolved_at";

pub struct SignupService;

impl SignupService {
    /// Stage a public signup request. Re-applying after a rejection
    /// resets the existing row instead of inserting a duplicate.
    #[instrument(skip(dto))]
    pub async fn create_signup_request(
        db: &PgPool,
        dto: CreateSignupRequestDto,
    ) -> Result<SignupRequestView, AppError> {
        if dto.requested_role == UserRole::SuperAdmin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Super admin accounts cannot be requested"
            )));
        }

        if dto.school_id.is_none() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "A school must be selected to sign up"
            )));
        }

        let existing_user = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE email = $1 AND is_deleted = FALSE",
        )
        .bind(&dto.email)
        .fetch_one(db)
        .await?;

        if existing_user > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "An account with this email already exists. Please log in."
            )));
        }

        let existing_request = sqlx::query_as::<_, SignupRequest>(
            "SELECT * FROM signup_requests WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?;

        let password_hash = hash_password(&dto.password)?;

        let request = match existing_request {
            Some(request) if request.status == ApprovalStatus::Pending => {
                return Err(AppError::conflict(anyhow::anyhow!(
                    "A signup request with this email is already pending review."
                )));
            }
            Some(request) if request.status == ApprovalStatus::Approved => {
                return Err(AppError::conflict(anyhow::anyhow!(
                    "This email has already been approved. Please log in."
                )));
            }
            Some(request) => {
                // Rejected earlier; reset the row for re-application.
                sqlx::query_as::<_, SignupRequestView>(&format!(
                    r#"UPDATE signup_requests
                       SET name = $1, password_hash = $2, requested_role = $3, school_id = $4,
                           status = 'pending', approved_role = NULL, resolved_at = NULL,
                           created_at = NOW()
                       WHERE id = $5
                       RETURNING {SIGNUP_VIEW_COLUMNS}"#
                ))
                .bind(&dto.name)
                .bind(&password_hash)
                .bind(dto.requested_role)
                .bind(dto.school_id)
                .bind(request.id)
                .fetch_one(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, SignupRequestView>(&format!(
                    r#"INSERT INTO signup_requests (name, email, password_hash, requested_role, school_id)
                       VALUES ($1, $2, $3, $4, $5)
                       RETURNING {SIGNUP_VIEW_COLUMNS}"#
                ))
                .bind(&dto.name)
                .bind(&dto.email)
                .bind(&password_hash)
                .bind(dto.requested_role)
                .bind(dto.school_id)
                .fetch_one(db)
                .await?
            }
        };

        Self::notify_approvers(db, &request).await?;

        Ok(request)
    }

    /// Signup requests visible to the caller's approval tier, mirroring
    /// password change request scoping.
    #[instrument]
    pub async fn get_signup_requests(
        db: &PgPool,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        filters: SignupRequestFilterParams,
    ) -> Result<PaginatedSignupRequestsResponse, AppError> {
        let target_role = Self::approvable_role(approver_role)?;

        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from("WHERE requested_role = $1");
        if approver_role != UserRole::SuperAdmin {
            where_clause.push_str(" AND school_id = $2");
        }
        if filters.status.is_some() {
            let idx = if approver_role == UserRole::SuperAdmin { 2 } else { 3 };
            where_clause.push_str(&format!(" AND status = ${}", idx));
        }

        let count_query = format!("SELECT COUNT(*) FROM signup_requests {}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query).bind(target_role);
        if approver_role != UserRole::SuperAdmin {
            count_sql = count_sql.bind(approver_school_id);
        }
        if let Some(status) = filters.status {
            count_sql = count_sql.bind(status);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {SIGNUP_VIEW_COLUMNS} FROM signup_requests {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, SignupRequestView>(&data_query).bind(target_role);
        if approver_role != UserRole::SuperAdmin {
            data_sql = data_sql.bind(approver_school_id);
        }
        if let Some(status) = filters.status {
            data_sql = data_sql.bind(status);
        }
        let requests = data_sql.fetch_all(db).await?;

        Ok(PaginatedSignupRequestsResponse {
            data: requests,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: None,
                has_more: offset + limit < total,
            },
        })
    }

    /// Approve a signup: create the user from the staged hash and mark
    /// the request resolved. Approving a teacher checks the school's
    /// teacher cap first.
    #[instrument(skip(dto))]
    pub async fn approve_signup_request(
        db: &PgPool,
        approver_id: Uuid,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        request_id: Uuid,
        dto: ApproveSignupDto,
    ) -> Result<SignupRequestView, AppError> {
        let request =
            Self::load_request_for_resolution(db, approver_role, approver_school_id, request_id)
                .await?;

        let approved_role = dto.role.unwrap_or(request.requested_role);
        if approved_role == UserRole::SuperAdmin {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Signups cannot be approved as super admin"
            )));
        }

        let school_id = request.school_id.ok_or_else(|| {
            AppError::unprocessable(anyhow::anyhow!("Signup request has no school"))
        })?;

        if approved_role == UserRole::Teacher {
            UserService::check_teacher_limit(db, school_id).await?;
        }

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (name, email, password_hash, role, school_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(approved_role)
        .bind(school_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::conflict(anyhow::anyhow!(
                    "An account with this email already exists"
                ));
            }
            AppError::from(e)
        })?;

        let resolved = sqlx::query_as::<_, SignupRequestView>(&format!(
            r#"UPDATE signup_requests
               SET status = 'approved', approved_role = $1, resolved_at = NOW()
               WHERE id = $2
               RETURNING {SIGNUP_VIEW_COLUMNS}"#
        ))
        .bind(approved_role)
        .bind(request.id)
        .fetch_one(db)
        .await?;

        NotificationService::notify(
            db,
            user_id,
            "signup",
            "Your signup request was approved. Welcome aboard!",
        )
        .await;

        ActivityLogService::record(
            db,
            Some(approver_id),
            Some(school_id),
            "signup_approved",
            Some("signup_request"),
            Some(request.id),
            Some(&format!("Approved {} as {}", request.email, approved_role)),
        )
        .await;

        Ok(resolved)
    }

    #[instrument]
    pub async fn reject_signup_request(
        db: &PgPool,
        approver_id: Uuid,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        request_id: Uuid,
    ) -> Result<SignupRequestView, AppError> {
        let request =
            Self::load_request_for_resolution(db, approver_role, approver_school_id, request_id)
                .await?;

        let resolved = sqlx::query_as::<_, SignupRequestView>(&format!(
            r#"UPDATE signup_requests
               SET status = 'rejected', resolved_at = NOW()
               WHERE id = $1
               RETURNING {SIGNUP_VIEW_COLUMNS}"#
        ))
        .bind(request.id)
        .fetch_one(db)
        .await?;

        ActivityLogService::record(
            db,
            Some(approver_id),
            request.school_id,
            "signup_rejected",
            Some("signup_request"),
            Some(request.id),
            Some(&format!("Rejected signup from {}", request.email)),
        )
        .await;

        Ok(resolved)
    }

    // ---------- Internal helpers ----------

    fn approvable_role(approver_role: UserRole) -> Result<UserRole, AppError> {
        match approver_role {
            UserRole::SuperAdmin => Ok(UserRole::Principal),
            UserRole::Principal => Ok(UserRole::Teacher),
            UserRole::Teacher => Ok(UserRole::Student),
            UserRole::Student => Err(AppError::forbidden(anyhow::anyhow!(
                "Students cannot resolve signup requests"
            ))),
        }
    }

    async fn load_request_for_resolution(
        db: &PgPool,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        request_id: Uuid,
    ) -> Result<SignupRequest, AppError> {
        let request = sqlx::query_as::<_, SignupRequest>(
            "SELECT * FROM signup_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Signup request not found")))?;

        if request.requested_role.approver() != Some(approver_role) {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "A {} cannot resolve a signup request for role {}",
                approver_role,
                request.requested_role
            )));
        }

        if approver_role != UserRole::SuperAdmin && request.school_id != approver_school_id {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Signup request belongs to another school"
            )));
        }

        if request.status != ApprovalStatus::Pending {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Signup request already {}",
                request.status
            )));
        }

        Ok(request)
    }

    async fn notify_approvers(
        db: &PgPool,
        request: &SignupRequestView,
    ) -> Result<(), AppError> {
        let approver_role = match request.requested_role.approver() {
            Some(role) => role,
            None => return Ok(()),
        };

        let approver_ids = if approver_role == UserRole::SuperAdmin {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM users WHERE role = $1 AND is_deleted = FALSE",
            )
            .bind(approver_role)
            .fetch_all(db)
            .await?
        } else {
            sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM users WHERE role = $1 AND school_id = $2 AND is_deleted = FALSE",
            )
            .bind(approver_role)
            .bind(request.school_id)
            .fetch_all(db)
            .await?
        };

        for approver_id in approver_ids {
            NotificationService::notify(
                db,
                approver_id,
                "signup_request",
                &format!(
                    "New signup request from {} ({}) as {}.",
                    request.name, request.email, request.requested_role
                ),
            )
            .await;
        }

        Ok(())
    }
}
