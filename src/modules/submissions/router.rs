use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    create_submission, get_assignment_submissions, get_student_submissions, grade_submission,
};

pub fn init_submissions_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_submission))
        .route("/student/{id}", get(get_student_submissions))
        .route("/assignment/{id}", get(get_assignment_submissions))
        .route("/{id}/grade", patch(grade_submission))
}
