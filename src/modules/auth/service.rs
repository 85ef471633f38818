use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::activity_logs::service::ActivityLogService;
use crate::modules::notifications::service::NotificationService;
use crate::modules::users::model::{User, UserRole};
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::pagination::PaginationMeta;
use crate::utils::password::{
    generate_opaque_token, hash_password, hash_token, verify_password, verify_token_hash,
};

use super::model::{
    ApprovalStatus, ChangePasswordRequestDto, LoginRequest, PaginatedPasswordRequestsResponse,
    PasswordChangeRequest, PasswordChangeRequestView, PasswordRequestFilterParams, RefreshRequest,
    RefreshToken, TokenResponse,
};

pub struct AuthService;

impl AuthService {
    /// Authenticate a user and issue a new access/refresh token pair.
    ///
    /// Wrong email and wrong password produce the identical error so the
    /// response never leaks whether an account exists.
    #[instrument(skip(dto))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 AND is_deleted = FALSE",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid email or password")))?;

        let is_valid = verify_password(&dto.password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Invalid email or password"
            )));
        }

        let access_token = create_access_token(
            user.id,
            &user.name,
            user.role,
            user.role,
            user.school_id,
            jwt_config,
        )?;

        let raw_refresh_token = generate_opaque_token();
        Self::create_refresh_token(db, user.id, &raw_refresh_token, None, jwt_config).await?;

        ActivityLogService::record(
            db,
            Some(user.id),
            user.school_id,
            "login",
            Some("user"),
            Some(user.id),
            None,
        )
        .await;

        Ok(TokenResponse {
            access_token,
            refresh_token: raw_refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Validate a refresh token, check for reuse, check expiry, and rotate.
    ///
    /// A refresh token is single-use. Presenting an already-revoked token
    /// is treated as evidence of theft (or a duplicate-request race) and
    /// revokes every session of the owner; that revocation is a committed
    /// side effect of the error path.
    #[instrument(skip(dto))]
    pub async fn refresh(
        db: &PgPool,
        dto: RefreshRequest,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        let (token, reused) = match Self::find_refresh_token(db, &dto.refresh_token).await? {
            Some(found) => found,
            None => {
                return Err(AppError::unauthorized(anyhow::anyhow!(
                    "Invalid refresh token"
                )));
            }
        };

        if reused {
            Self::revoke_all_user_tokens(db, token.user_id).await?;
            ActivityLogService::record(
                db,
                Some(token.user_id),
                None,
                "refresh_token_reuse_detected",
                Some("refresh_token"),
                Some(token.id),
                Some("All sessions revoked"),
            )
            .await;
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Refresh token reuse detected. All sessions revoked."
            )));
        }

        if token.expires_at < Utc::now() {
            Self::revoke_token(db, token.id).await?;
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Refresh token expired"
            )));
        }

        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(token.user_id)
        .fetch_optional(db)
        .await?;

        let user = match user {
            Some(user) => user,
            None => {
                // Owner deleted mid-session; nothing left to rotate for.
                Self::revoke_all_user_tokens(db, token.user_id).await?;
                return Err(AppError::unauthorized(anyhow::anyhow!("User not found")));
            }
        };

        let new_raw_refresh = generate_opaque_token();
        Self::rotate_refresh_token(db, &token, &new_raw_refresh, jwt_config).await?;

        let access_token = create_access_token(
            user.id,
            &user.name,
            user.role,
            user.role,
            user.school_id,
            jwt_config,
        )?;

        Ok(TokenResponse {
            access_token,
            refresh_token: new_raw_refresh,
            token_type: "bearer".to_string(),
        })
    }

    /// Revoke one refresh token. Idempotent: an unknown, revoked, or
    /// expired token is treated as already logged out.
    #[instrument(skip(raw_token))]
    pub async fn logout(db: &PgPool, raw_token: &str) -> Result<(), AppError> {
        let token = Self::get_valid_refresh_token(db, raw_token).await?;

        if let Some(token) = token {
            Self::revoke_token(db, token.id).await?;
            ActivityLogService::record(
                db,
                Some(token.user_id),
                None,
                "logout",
                Some("refresh_token"),
                Some(token.id),
                None,
            )
            .await;
        }

        Ok(())
    }

    /// Revoke every non-revoked refresh token owned by the user.
    #[instrument]
    pub async fn logout_all(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        Self::revoke_all_user_tokens(db, user_id).await?;

        ActivityLogService::record(
            db,
            Some(user_id),
            None,
            "logout_all",
            Some("user"),
            Some(user_id),
            None,
        )
        .await;

        Ok(())
    }

    /// Change the caller's password.
    ///
    /// Super admins have no approver tier: their change applies
    /// immediately and revokes all sessions. Everyone else stages a
    /// [`PasswordChangeRequest`] holding the pre-hashed new password; the
    /// existing credential stays valid until the approver tier resolves
    /// the request.
    #[instrument(skip(dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordRequestDto,
    ) -> Result<String, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("User not found")))?;

        let is_valid = verify_password(&dto.current_password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Current password is incorrect"
            )));
        }

        let new_password_hash = hash_password(&dto.new_password)?;

        if user.role == UserRole::SuperAdmin {
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(&new_password_hash)
                .bind(user.id)
                .execute(db)
                .await?;

            Self::revoke_all_user_tokens(db, user.id).await?;

            ActivityLogService::record(
                db,
                Some(user.id),
                None,
                "password_changed",
                Some("user"),
                Some(user.id),
                None,
            )
            .await;

            return Ok("Password changed successfully. Logged out from all sessions.".to_string());
        }

        let pending_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM password_change_requests WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(user.id)
        .fetch_one(db)
        .await?;

        if pending_exists > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "A password change request is already pending"
            )));
        }

        let request = sqlx::query_as::<_, PasswordChangeRequest>(
            r#"INSERT INTO password_change_requests (user_id, new_password_hash, school_id)
               VALUES ($1, $2, $3)
               RETURNING id, user_id, new_password_hash, status, school_id, created_at, resolved_at"#,
        )
        .bind(user.id)
        .bind(&new_password_hash)
        .bind(user.school_id)
        .fetch_one(db)
        .await?;

        Self::notify_approvers(db, &user, request.id).await?;

        ActivityLogService::record(
            db,
            Some(user.id),
            user.school_id,
            "password_change_requested",
            Some("password_change_request"),
            Some(request.id),
            None,
        )
        .await;

        Ok("Password change request submitted for approval.".to_string())
    }

    /// List password change requests visible to the caller's approval
    /// tier: super admins see principal requests across schools,
    /// principals see teacher requests in their school, teachers see
    /// student requests in their school.
    #[instrument]
    pub async fn list_password_requests(
        db: &PgPool,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        filters: PasswordRequestFilterParams,
    ) -> Result<PaginatedPasswordRequestsResponse, AppError> {
        let target_role = Self::approvable_role(approver_role)?;

        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause =
            String::from("WHERE u.role = $1 AND (u.is_deleted = FALSE OR pcr.status <> 'pending')");
        if approver_role != UserRole::SuperAdmin {
            where_clause.push_str(" AND pcr.school_id = $2");
        }
        if filters.status.is_some() {
            let idx = if approver_role == UserRole::SuperAdmin { 2 } else { 3 };
            where_clause.push_str(&format!(" AND pcr.status = ${}", idx));
        }

        let count_query = format!(
            "SELECT COUNT(*) FROM password_change_requests pcr JOIN users u ON u.id = pcr.user_id {}",
            where_clause
        );
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query).bind(target_role);
        if approver_role != UserRole::SuperAdmin {
            count_sql = count_sql.bind(approver_school_id);
        }
        if let Some(status) = filters.status {
            count_sql = count_sql.bind(status);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            r#"SELECT
                pcr.id,
                pcr.user_id,
                u.name AS user_name,
                u.email AS user_email,
                u.role AS user_role,
                pcr.status,
                pcr.school_id,
                pcr.created_at,
                pcr.resolved_at
               FROM password_change_requests pcr
               JOIN users u ON u.id = pcr.user_id
               {}
               ORDER BY pcr.created_at DESC
               LIMIT {} OFFSET {}"#,
            where_clause, limit, offset
        );
        let mut data_sql =
            sqlx::query_as::<_, PasswordChangeRequestView>(&data_query).bind(target_role);
        if approver_role != UserRole::SuperAdmin {
            data_sql = data_sql.bind(approver_school_id);
        }
        if let Some(status) = filters.status {
            data_sql = data_sql.bind(status);
        }
        let requests = data_sql.fetch_all(db).await?;

        Ok(PaginatedPasswordRequestsResponse {
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

    /// Apply a staged password change: write the pre-computed hash to the
    /// user record, mark the request approved, revoke every session of
    /// the user, and notify them.
    #[instrument]
    pub async fn approve_password_request(
        db: &PgPool,
        approver_id: Uuid,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        request_id: Uuid,
    ) -> Result<String, AppError> {
        let (request, user) =
            Self::load_request_for_resolution(db, approver_role, approver_school_id, request_id)
                .await?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&request.new_password_hash)
            .bind(user.id)
            .execute(db)
            .await?;

        sqlx::query(
            "UPDATE password_change_requests SET status = 'approved', resolved_at = NOW() WHERE id = $1",
        )
        .bind(request.id)
        .execute(db)
        .await?;

        Self::revoke_all_user_tokens(db, user.id).await?;

        NotificationService::notify(
            db,
            user.id,
            "password_change",
            "Your password change request was approved. Please log in with your new password.",
        )
        .await;

        ActivityLogService::record(
            db,
            Some(approver_id),
            request.school_id,
            "password_change_approved",
            Some("password_change_request"),
            Some(request.id),
            Some(&format!("Approved password change for {}", user.email)),
        )
        .await;

        Ok("Password change request approved.".to_string())
    }

    /// Reject a staged password change. The user's password is left
    /// unchanged and their sessions stay valid.
    #[instrument]
    pub async fn reject_password_request(
        db: &PgPool,
        approver_id: Uuid,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        request_id: Uuid,
    ) -> Result<String, AppError> {
        let (request, user) =
            Self::load_request_for_resolution(db, approver_role, approver_school_id, request_id)
                .await?;

        sqlx::query(
            "UPDATE password_change_requests SET status = 'rejected', resolved_at = NOW() WHERE id = $1",
        )
        .bind(request.id)
        .execute(db)
        .await?;

        NotificationService::notify(
            db,
            user.id,
            "password_change",
            "Your password change request was rejected. Your password is unchanged.",
        )
        .await;

        ActivityLogService::record(
            db,
            Some(approver_id),
            request.school_id,
            "password_change_rejected",
            Some("password_change_request"),
            Some(request.id),
            Some(&format!("Rejected password change for {}", user.email)),
        )
        .await;

        Ok("Password change request rejected.".to_string())
    }

    /// Mint a token pair whose access token acts as a lower role while
    /// `base_role` keeps the authentic role for audit. Switching back to
    /// the base role is always allowed.
    #[instrument]
    pub async fn switch_role(
        db: &PgPool,
        user_id: Uuid,
        target_role: UserRole,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("User not found")))?;

        if target_role != user.role && !user.role.can_switch_to(target_role) {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Cannot switch from role {} to {}",
                user.role,
                target_role
            )));
        }

        let access_token = create_access_token(
            user.id,
            &user.name,
            target_role,
            user.role,
            user.school_id,
            jwt_config,
        )?;

        let raw_refresh_token = generate_opaque_token();
        Self::create_refresh_token(db, user.id, &raw_refresh_token, None, jwt_config).await?;

        ActivityLogService::record(
            db,
            Some(user.id),
            user.school_id,
            "switch_role",
            Some("user"),
            Some(user.id),
            Some(&format!("Switched view from {} to {}", user.role, target_role)),
        )
        .await;

        Ok(TokenResponse {
            access_token,
            refresh_token: raw_refresh_token,
            token_type: "bearer".to_string(),
        })
    }

    // ---------- Internal helpers ----------

    /// The role whose requests this role is allowed to resolve.
    fn approvable_role(approver_role: UserRole) -> Result<UserRole, AppError> {
        match approver_role {
            UserRole::SuperAdmin => Ok(UserRole::Principal),
            UserRole::Principal => Ok(UserRole::Teacher),
            UserRole::Teacher => Ok(UserRole::Student),
            UserRole::Student => Err(AppError::forbidden(anyhow::anyhow!(
                "Students cannot resolve password change requests"
            ))),
        }
    }

    /// Fetch a request plus its user and run the tier, scope, and status
    /// guards shared by approve and reject.
    async fn load_request_for_resolution(
        db: &PgPool,
        approver_role: UserRole,
        approver_school_id: Option<Uuid>,
        request_id: Uuid,
    ) -> Result<(PasswordChangeRequest, User), AppError> {
        let request = sqlx::query_as::<_, PasswordChangeRequest>(
            "SELECT * FROM password_change_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Password change request not found")))?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(request.user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))?;

        if user.role.approver() != Some(approver_role) {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "A {} cannot resolve a {}'s password change request",
                approver_role,
                user.role
            )));
        }

        if approver_role != UserRole::SuperAdmin && request.school_id != approver_school_id {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "Password change request belongs to another school"
            )));
        }

        if request.status != ApprovalStatus::Pending {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Password change request already {}",
                request.status
            )));
        }

        Ok((request, user))
    }

    /// Notify every user in the approver tier for `user`'s role.
    async fn notify_approvers(db: &PgPool, user: &User, request_id: Uuid) -> Result<(), AppError> {
        let approver_role = match user.role.approver() {
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
            .bind(user.school_id)
            .fetch_all(db)
            .await?
        };

        for approver_id in approver_ids {
            NotificationService::notify(
                db,
                approver_id,
                "password_change_request",
                &format!(
                    "{} ({}) requested a password change. Request {} awaits your review.",
                    user.name, user.email, request_id
                ),
            )
            .await;
        }

        Ok(())
    }

    async fn create_refresh_token(
        db: &PgPool,
        user_id: Uuid,
        raw_token: &str,
        replaces: Option<Uuid>,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshToken, AppError> {
        let token_hash = hash_token(raw_token)?;
        let expires_at = Utc::now() + Duration::days(jwt_config.refresh_token_days);

        let token = sqlx::query_as::<_, RefreshToken>(
            r#"INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
               VALUES ($1, $2, $3)
               RETURNING id, user_id, token_hash, expires_at, revoked, replaced_by, created_at"#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .fetch_one(db)
        .await?;

        if let Some(old_id) = replaces {
            sqlx::query(
                "UPDATE refresh_tokens SET revoked = TRUE, replaced_by = $1 WHERE id = $2",
            )
            .bind(token.id)
            .bind(old_id)
            .execute(db)
            .await?;
        }

        Ok(token)
    }

    /// Revoke the old token and insert its successor, linked through
    /// `replaced_by` on the superseded row.
    async fn rotate_refresh_token(
        db: &PgPool,
        old_token: &RefreshToken,
        new_raw_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshToken, AppError> {
        Self::create_refresh_token(db, old_token.user_id, new_raw_token, Some(old_token.id), jwt_config)
            .await
    }

    /// Locate a stored token matching the raw value. Salted hashes cannot
    /// be looked up by equality, so this scans candidates and verifies
    /// each one; newest first, since the match is usually recent. The
    /// second element reports whether the matched token was already
    /// revoked (the reuse signal).
    async fn find_refresh_token(
        db: &PgPool,
        raw_token: &str,
    ) -> Result<Option<(RefreshToken, bool)>, AppError> {
        let tokens = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens ORDER BY created_at DESC",
        )
        .fetch_all(db)
        .await?;

        for token in tokens {
            if verify_token_hash(raw_token, &token.token_hash)? {
                let reused = token.revoked;
                return Ok(Some((token, reused)));
            }
        }

        Ok(None)
    }

    /// Like [`Self::find_refresh_token`] but only considers tokens that
    /// are still active. Used by logout, where dead tokens mean "already
    /// logged out".
    async fn get_valid_refresh_token(
        db: &PgPool,
        raw_token: &str,
    ) -> Result<Option<RefreshToken>, AppError> {
        let tokens = sqlx::query_as::<_, RefreshToken>(
            "SELECT * FROM refresh_tokens WHERE revoked = FALSE AND expires_at > NOW() ORDER BY created_at DESC",
        )
        .fetch_all(db)
        .await?;

        for token in tokens {
            if verify_token_hash(raw_token, &token.token_hash)? {
                return Ok(Some(token));
            }
        }

        Ok(None)
    }

    async fn revoke_token(db: &PgPool, token_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(token_id)
            .execute(db)
            .await?;

        Ok(())
    }

    async fn revoke_all_user_tokens(db: &PgPool, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }
}
