mod common;

use axum::http::StatusCode;
use common::{
    create_test_school, create_test_user, generate_unique_email, generate_unique_school_name,
    get_json, login, patch_json, post_json, request_json, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_principal_creates_course_students_cannot(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let student_email = generate_unique_email();
    create_test_user(&pool, &student_email, "student12", "student", Some(school.id)).await;

    let app = setup_test_app(pool.clone());

    let (principal_access, _) = login(&app, &principal_email, "principal1").await;
    let (status, body) = post_json(
        &app,
        "/api/courses",
        Some(&principal_access),
        json!({ "name": "Algebra I", "description": "Introductory algebra" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Algebra I");
    assert_eq!(body["school_id"].as_str().unwrap(), school.id.to_string());

    let (student_access, _) = login(&app, &student_email, "student12").await;
    let (status, _) = post_json(
        &app,
        "/api/courses",
        Some(&student_access),
        json!({ "name": "Nope", "description": "Students cannot create courses" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_listing_is_role_aware(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let teacher_email = generate_unique_email();
    let teacher =
        create_test_user(&pool, &teacher_email, "teacher12", "teacher", Some(school.id)).await;
    let student_email = generate_unique_email();
    let student =
        create_test_user(&pool, &student_email, "student12", "student", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    let mut course_ids = Vec::new();
    for name in ["Algebra I", "Biology", "Chemistry"] {
        let (_, body) = post_json(
            &app,
            "/api/courses",
            Some(&principal_access),
            json!({ "name": name, "description": "A course" }),
        )
        .await;
        course_ids.push(body["id"].as_str().unwrap().to_string());
    }

    // Teacher is assigned to the first course, student enrolled in the
    // first two.
    post_json(
        &app,
        "/api/enrollments/teachers",
        Some(&principal_access),
        json!({ "teacher_id": teacher.id, "course_id": course_ids[0] }),
    )
    .await;
    for course_id in &course_ids[..2] {
        post_json(
            &app,
            "/api/enrollments/students",
            Some(&principal_access),
            json!({ "student_id": student.id, "course_id": course_id }),
        )
        .await;
    }

    // Principal sees the whole catalog.
    let (_, body) = get_json(&app, "/api/courses", Some(&principal_access)).await;
    assert_eq!(body["meta"]["total"], 3);

    // Teacher sees only assignments.
    let (teacher_access, _) = login(&app, &teacher_email, "teacher12").await;
    let (_, body) = get_json(&app, "/api/courses", Some(&teacher_access)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Algebra I");

    // Student sees only enrollments.
    let (student_access, _) = login(&app, &student_email, "student12").await;
    let (_, body) = get_json(&app, "/api/courses", Some(&student_access)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_soft_delete_and_restore(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    let (_, body) = post_json(
        &app,
        "/api/courses",
        Some(&principal_access),
        json!({ "name": "Ephemeral", "description": "Soon to be deleted" }),
    )
    .await;
    let course_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = request_json(
        &app,
        "DELETE",
        &format!("/api/courses/{}", course_id),
        Some(&principal_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Gone from the default listing and from direct fetches.
    let (_, body) = get_json(&app, "/api/courses", Some(&principal_access)).await;
    assert_eq!(body["meta"]["total"], 0);
    let (status, _) = get_json(
        &app,
        &format!("/api/courses/{}", course_id),
        Some(&principal_access),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // But visible when deleted rows are requested.
    let (_, body) = get_json(
        &app,
        "/api/courses?include_deleted=true",
        Some(&principal_access),
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);

    let (status, body) = patch_json(
        &app,
        &format!("/api/courses/{}/restore", course_id),
        Some(&principal_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_deleted"], false);

    let (_, body) = get_json(&app, "/api/courses", Some(&principal_access)).await;
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_principal_scope_does_not_leak_across_schools(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let other_school = create_test_school(&pool, &generate_unique_school_name()).await;

    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let other_principal_email = generate_unique_email();
    create_test_user(
        &pool,
        &other_principal_email,
        "principal1",
        "principal",
        Some(other_school.id),
    )
    .await;

    let app = setup_test_app(pool.clone());

    let (other_access, _) = login(&app, &other_principal_email, "principal1").await;
    let (_, body) = post_json(
        &app,
        "/api/courses",
        Some(&other_access),
        json!({ "name": "Foreign Course", "description": "Another school's course" }),
    )
    .await;
    let foreign_course_id = body["id"].as_str().unwrap().to_string();

    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    let (_, body) = get_json(&app, "/api/courses", Some(&principal_access)).await;
    assert_eq!(body["meta"]["total"], 0);

    let (status, _) = get_json(
        &app,
        &format!("/api/courses/{}", foreign_course_id),
        Some(&principal_access),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
