use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{admin_stats, student_stats, teacher_stats};

pub fn init_stats_router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_stats))
        .route("/teacher", get(teacher_stats))
        .route("/student", get(student_stats))
}
