use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{assign_teacher, enroll_student, get_teacher_assignments};

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/students", post(enroll_student))
        .route("/teachers", post(assign_teacher).get(get_teacher_assignments))
}
