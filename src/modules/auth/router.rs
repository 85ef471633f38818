use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    approve_password_request, change_password, list_password_requests, login, logout, logout_all,
    refresh, reject_password_request, switch_role,
};

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/change-password", post(change_password))
        .route("/switch-role", post(switch_role))
        .route("/password-requests", get(list_password_requests))
        .route("/password-requests/{id}/approve", patch(approve_password_request))
        .route("/password-requests/{id}/reject", patch(reject_password_request))
}
