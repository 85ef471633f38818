use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

use super::model::{Notification, NotificationFilterParams, PaginatedNotificationsResponse};
use super::service::NotificationService;

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationFilterParams),
    responses(
        (status = 200, description = "The caller's notifications, newest first", body = PaginatedNotificationsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<NotificationFilterParams>,
) -> Result<Json<PaginatedNotificationsResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let notifications =
        NotificationService::get_user_notifications(&state.db, user_id, filters).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Notification not found")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let user_id = auth_user.user_id()?;
    let notification = NotificationService::mark_read(&state.db, id, user_id).await?;
    Ok(Json(notification))
}

#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked read"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let user_id = auth_user.user_id()?;
    let updated = NotificationService::mark_all_read(&state.db, user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}
