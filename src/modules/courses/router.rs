use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    create_course, delete_course, get_course_by_id, get_courses, restore_course, update_course,
};
use crate::modules::materials::controller::get_course_materials;

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_courses).post(create_course))
        .route(
            "/{id}",
            get(get_course_by_id)
                .patch(update_course)
                .delete(delete_course),
        )
        .route("/{id}/restore", patch(restore_course))
        .route("/{id}/materials", get(get_course_materials))
}
