use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    approve_signup_request, create_signup_request, get_signup_requests, reject_signup_request,
};

/// Public endpoint: anyone may submit a signup request.
pub fn init_signup_router() -> Router<AppState> {
    Router::new().route("/", post(create_signup_request))
}

/// Authenticated review endpoints for the approver tiers.
pub fn init_signup_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_signup_requests))
        .route("/{id}/approve", patch(approve_signup_request))
        .route("/{id}/reject", patch(reject_signup_request))
}
