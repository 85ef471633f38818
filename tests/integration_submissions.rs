mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{
    create_test_school, create_test_user, generate_unique_email, generate_unique_school_name,
    get_json, login, patch_json, post_json, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

struct Classroom {
    teacher_access: String,
    student_access: String,
    student_id: Uuid,
    course_id: String,
}

/// School with one course, an assigned teacher, and an enrolled student.
async fn setup_classroom(pool: &PgPool, app: &Router) -> Classroom {
    let school = create_test_school(pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let teacher_email = generate_unique_email();
    let teacher =
        create_test_user(pool, &teacher_email, "teacher12", "teacher", Some(school.id)).await;
    let student_email = generate_unique_email();
    let student =
        create_test_user(pool, &student_email, "student12", "student", Some(school.id)).await;

    let (principal_access, _) = login(app, &principal_email, "principal1").await;
    let (_, body) = post_json(
        app,
        "/api/courses",
        Some(&principal_access),
        json!({ "name": "Physics", "description": "Mechanics and waves" }),
    )
    .await;
    let course_id = body["id"].as_str().unwrap().to_string();

    post_json(
        app,
        "/api/enrollments/teachers",
        Some(&principal_access),
        json!({ "teacher_id": teacher.id, "course_id": course_id }),
    )
    .await;
    post_json(
        app,
        "/api/enrollments/students",
        Some(&principal_access),
        json!({ "student_id": student.id, "course_id": course_id }),
    )
    .await;

    let (teacher_access, _) = login(app, &teacher_email, "teacher12").await;
    let (student_access, _) = login(app, &student_email, "student12").await;

    Classroom {
        teacher_access,
        student_access,
        student_id: student.id,
        course_id,
    }
}

async fn create_assignment(
    app: &Router,
    teacher_access: &str,
    course_id: &str,
    due_date: &str,
    max_attempts: i32,
) -> String {
    let (status, body) = post_json(
        app,
        "/api/materials/assignments",
        Some(teacher_access),
        json!({
            "course_id": course_id,
            "title": "Problem set",
            "assignment_kind": "long",
            "total_marks": 100.0,
            "due_date": due_date,
            "max_attempts": max_attempts,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "assignment creation failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_and_attempt_cap(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2099-01-01", 1).await;

    let dto = json!({
        "assignment_id": assignment_id,
        "file_url": "http://example.com/solution.pdf",
        "comments": "First attempt",
    });

    let (status, body) = post_json(&app, "/api/submissions", Some(&class.student_access), dto.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["grade"].is_null());

    // max_attempts = 1, so the second submission is rejected.
    let (status, body) = post_json(&app, "/api/submissions", Some(&class.student_access), dto).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have used all 1 attempts for this assignment.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_multiple_attempts_until_cap(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2099-01-01", 3).await;

    let dto = json!({
        "assignment_id": assignment_id,
        "file_url": "http://example.com/solution.pdf",
    });

    for _ in 0..3 {
        let (status, _) =
            post_json(&app, "/api/submissions", Some(&class.student_access), dto.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = post_json(&app, "/api/submissions", Some(&class.student_access), dto).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deadline_is_enforced(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2020-01-01", 1).await;

    let (status, body) = post_json(
        &app,
        "/api/submissions",
        Some(&class.student_access),
        json!({
            "assignment_id": assignment_id,
            "file_url": "http://example.com/late.pdf",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Submission deadline has passed.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_non_enrolled_student_cannot_submit(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2099-01-01", 1).await;

    // A student from the same school but not enrolled in the course.
    let outsider_email = generate_unique_email();
    let school_id = sqlx::query_scalar::<_, Uuid>("SELECT school_id FROM courses WHERE id = $1")
        .bind(Uuid::parse_str(&class.course_id).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    create_test_user(&pool, &outsider_email, "student12", "student", Some(school_id)).await;
    let (outsider_access, _) = login(&app, &outsider_email, "student12").await;

    let (status, _) = post_json(
        &app,
        "/api/submissions",
        Some(&outsider_access),
        json!({
            "assignment_id": assignment_id,
            "file_url": "http://example.com/sneaky.pdf",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_grading_flow(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2099-01-01", 1).await;

    let (_, body) = post_json(
        &app,
        "/api/submissions",
        Some(&class.student_access),
        json!({
            "assignment_id": assignment_id,
            "file_url": "http://example.com/solution.pdf",
        }),
    )
    .await;
    let submission_id = body["id"].as_str().unwrap().to_string();

    // A grade above total_marks is rejected.
    let (status, _) = patch_json(
        &app,
        &format!("/api/submissions/{}/grade", submission_id),
        Some(&class.teacher_access),
        Some(json!({ "grade": 150.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = patch_json(
        &app,
        &format!("/api/submissions/{}/grade", submission_id),
        Some(&class.teacher_access),
        Some(json!({ "grade": 87.5, "feedback": "Good work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade"], 87.5);
    assert!(body["graded_at"].as_str().is_some());

    // The student was notified of the grade.
    let notified = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND kind = 'submission_graded'",
    )
    .bind(class.student_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(notified, 1);

    // Teacher can list submissions for the assignment with the grade.
    let (status, body) = get_json(
        &app,
        &format!("/api/submissions/assignment/{}", assignment_id),
        Some(&class.teacher_access),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["grade"], 87.5);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_teacher_of_other_course_cannot_grade(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2099-01-01", 1).await;

    let (_, body) = post_json(
        &app,
        "/api/submissions",
        Some(&class.student_access),
        json!({
            "assignment_id": assignment_id,
            "file_url": "http://example.com/solution.pdf",
        }),
    )
    .await;
    let submission_id = body["id"].as_str().unwrap().to_string();

    // A teacher in the same school with no assignment to this course.
    let other_teacher_email = generate_unique_email();
    let school_id = sqlx::query_scalar::<_, Uuid>("SELECT school_id FROM courses WHERE id = $1")
        .bind(Uuid::parse_str(&class.course_id).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    create_test_user(&pool, &other_teacher_email, "teacher12", "teacher", Some(school_id)).await;
    let (other_access, _) = login(&app, &other_teacher_email, "teacher12").await;

    let (status, _) = patch_json(
        &app,
        &format!("/api/submissions/{}/grade", submission_id),
        Some(&other_access),
        Some(json!({ "grade": 50.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_sees_submission_state_in_course_materials(pool: PgPool) {
    let app = setup_test_app(pool.clone());
    let class = setup_classroom(&pool, &app).await;

    let assignment_id =
        create_assignment(&app, &class.teacher_access, &class.course_id, "2099-01-01", 2).await;

    let (_, body) = get_json(
        &app,
        &format!("/api/courses/{}/materials", class.course_id),
        Some(&class.student_access),
    )
    .await;
    assert_eq!(body[0]["id"].as_str().unwrap(), assignment_id);
    assert_eq!(body[0]["submitted"], false);
    assert_eq!(body[0]["attempts_used"], 0);

    post_json(
        &app,
        "/api/submissions",
        Some(&class.student_access),
        json!({
            "assignment_id": assignment_id,
            "file_url": "http://example.com/solution.pdf",
        }),
    )
    .await;

    let (_, body) = get_json(
        &app,
        &format!("/api/courses/{}/materials", class.course_id),
        Some(&class.student_access),
    )
    .await;
    assert_eq!(body[0]["submitted"], true);
    assert_eq!(body[0]["attempts_used"], 1);
}
