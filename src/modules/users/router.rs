use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    create_user, delete_user, get_user_by_id, get_users, restore_user, update_user,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route(
            "/{id}",
            get(get_user_by_id).patch(update_user).delete(delete_user),
        )
        .route("/{id}/restore", patch(restore_user))
}
