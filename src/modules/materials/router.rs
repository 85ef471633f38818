use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_assignment, create_notes, delete_material, get_my_materials, restore_material,
    update_material,
};

pub fn init_materials_router() -> Router<AppState> {
    Router::new()
        .route("/notes", post(create_notes))
        .route("/assignments", post(create_assignment))
        .route("/mine", get(get_my_materials))
        .route("/{id}", patch(update_material).delete(delete_material))
        .route("/{id}/restore", patch(restore_material))
}
