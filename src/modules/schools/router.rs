use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    assign_principal, create_school, get_school_by_id, get_schools, update_school,
};

pub fn init_schools_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_schools).post(create_school))
        .route("/{id}", get(get_school_by_id).patch(update_school))
        .route("/{id}/assign-principal", patch(assign_principal))
}
