use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::utils::errors::AppError;
use crate::utils::pagination::PaginationMeta;

use super::model::{ActivityLog, ActivityLogFilterParams, PaginatedActivityLogsResponse};

pub struct ActivityLogService;

impl ActivityLogService {
    /// Fire-and-forget audit record. Security-relevant events call this
    /// from their success and error paths alike; a failed insert is
    /// logged and swallowed so it can never abort the recorded
    /// operation.
    pub async fn record(
        db: &PgPool,
        user_id: Option<Uuid>,
        school_id: Option<Uuid>,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<Uuid>,
        details: Option<&str>,
    ) {
        let result = sqlx::query(
            r#"INSERT INTO activity_logs (user_id, school_id, action, entity_type, entity_id, details)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(user_id)
        .bind(school_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(details)
        .execute(db)
        .await;

        if let Err(e) = result {
            warn!(action = %action, error = %e, "Failed to record activity log");
        }
    }

    /// Paginated listing with user/action filters. `school_id` scopes the
    /// result for principals; super admins pass `None` and see all
    /// schools.
    #[instrument]
    pub async fn get_activity_logs(
        db: &PgPool,
        school_id: Option<Uuid>,
        filters: ActivityLogFilterParams,
    ) -> Result<PaginatedActivityLogsResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut where_clause = String::from("WHERE 1 = 1");
        let mut idx = 0;
        if school_id.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND school_id = ${}", idx));
        }
        if filters.user_id.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND user_id = ${}", idx));
        }
        if filters.action.is_some() {
            idx += 1;
            where_clause.push_str(&format!(" AND action = ${}", idx));
        }

        let count_query = format!("SELECT COUNT(*) FROM activity_logs {}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(school_id) = school_id {
            count_sql = count_sql.bind(school_id);
        }
        if let Some(user_id) = filters.user_id {
            count_sql = count_sql.bind(user_id);
        }
        if let Some(action) = &filters.action {
            count_sql = count_sql.bind(action);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT * FROM activity_logs {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            where_clause, limit, offset
        );
        let mut data_sql = sqlx::query_as::<_, ActivityLog>(&data_query);
        if let Some(school_id) = school_id {
            data_sql = data_sql.bind(school_id);
        }
        if let Some(user_id) = filters.user_id {
            data_sql = data_sql.bind(user_id);
        }
        if let Some(action) = &filters.action {
            data_sql = data_sql.bind(action);
        }
        let logs = data_sql.fetch_all(db).await?;

        Ok(PaginatedActivityLogsResponse {
            data: logs,
            meta: PaginationMeta {
                total,
                limit,
                offset: Some(offset),
                page: None,
                has_more: offset + limit < total,
            },
        })
    }
}
