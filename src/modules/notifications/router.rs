use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{get_notifications, mark_all_notifications_read, mark_notification_read};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/read-all", patch(mark_all_notifications_read))
        .route("/{id}/read", patch(mark_notification_read))
}
