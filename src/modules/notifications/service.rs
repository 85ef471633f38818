use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{Notification, NotificationFilterParams, PaginatedNotificationsResponse};

pub struct NotificationService;

impl NotificationService {
    /// Fire-and-forget notification insert. Notifications are advisory;
    /// a failure here must never abort the operation that triggered it,
    /// so errors are logged and swallowed.
    pub async fn notify(db: &PgPool, user_id: Uuid, kind: &str, message: &str) {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, message) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .execute(db)
        .await;

        if let Err(e) = result {
            warn!(user_id = %user_id, kind = %kind, error = %e, "Failed to insert notification");
        }
    }

    #[instrument]
    pub async fn get_user_notifications(
        db: &PgPool,
        user_id: Uuid,
        filters: NotificationFilterParams,
    ) -> Result<PaginatedNotificationsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let unread_only = filters.unread_only.unwrap_or(false);

        let mut where_clause = String::from("WHERE user_id = $1");
        if unread_only {
            where_clause.push_str(" AND is_read = FALSE");
        }

        let count_query = format!("SELECT COUNT(*) FROM notifications {}", where_clause);
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(user_id)
            .fetch_one(db)
            .await?;

        let data_query = format!(
            "SELECT * FROM notifications {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let notifications = sqlx::query_as::<_, Notification>(&data_query)
            .bind(user_id)
            .fetch_all(db)
            .await?;

        Ok(PaginatedNotificationsResponse {
            data: notifications,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: None,
                has_more: offset + limit < total,
            },
        })
    }

    /// Mark one notification read. Scoped to the owner so users cannot
    /// touch each other's notifications.
    #[instrument]
    pub async fn mark_read(
        db: &PgPool,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(
            r#"UPDATE notifications SET is_read = TRUE
               WHERE id = $1 AND user_id = $2
               RETURNING id, user_id, kind, message, is_read, created_at"#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notification not found")))
    }

    #[instrument]
    pub async fn mark_all_read(db: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }
}
