mod common;

use axum::http::StatusCode;
use common::{
    create_test_school, create_test_user, generate_unique_email, generate_unique_school_name,
    get_json, login, post_json, request_json, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_users_routes_require_admin_tier(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let student_email = generate_unique_email();
    create_test_user(&pool, &student_email, "student12", "student", Some(school.id)).await;

    let app = setup_test_app(pool.clone());

    // Unauthenticated.
    let (status, _) = get_json(&app, "/api/users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Students are below the admin tier.
    let (student_access, _) = login(&app, &student_email, "student12").await;
    let (status, _) = get_json(&app, "/api/users", Some(&student_access)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_principal_creates_teacher_in_own_school(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    let teacher_email = generate_unique_email();
    let (status, body) = post_json(
        &app,
        "/api/users",
        Some(&principal_access),
        json!({
            "name": "New Teacher",
            "email": teacher_email,
            "password": "password123",
            "role": "teacher",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "teacher");
    assert_eq!(body["school_id"].as_str().unwrap(), school.id.to_string());
    assert!(body.get("password_hash").is_none());

    // The new account can log in immediately.
    login(&app, &teacher_email, "password123").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn test_principal_cannot_create_principal_or_super_admin(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    for role in ["principal", "super_admin"] {
        let (status, _) = post_json(
            &app,
            "/api/users",
            Some(&principal_access),
            json!({
                "name": "Nope",
                "email": generate_unique_email(),
                "password": "password123",
                "role": role,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "role {} should be rejected", role);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_soft_delete_excludes_from_listing_and_restore_brings_back(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let student_email = generate_unique_email();
    let student =
        create_test_user(&pool, &student_email, "student12", "student", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    let (status, _) = request_json(
        &app,
        "DELETE",
        &format!("/api/users/{}", student.id),
        Some(&principal_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Deleted users cannot authenticate.
    let (status, _) = post_json(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": student_email, "password": "student12" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Hidden by default, visible with the flag.
    let (_, body) = get_json(&app, "/api/users?role=student", Some(&principal_access)).await;
    assert_eq!(body["meta"]["total"], 0);
    let (_, body) = get_json(
        &app,
        "/api/users?role=student&include_deleted=true",
        Some(&principal_access),
    )
    .await;
    assert_eq!(body["meta"]["total"], 1);

    let (status, _) = request_json(
        &app,
        "PATCH",
        &format!("/api/users/{}/restore", student.id),
        Some(&principal_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    login(&app, &student_email, "student12").await;
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schools_are_super_admin_only(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let admin_email = generate_unique_email();
    create_test_user(&pool, &admin_email, "superadmin1", "super_admin", None).await;

    let app = setup_test_app(pool.clone());

    let (principal_access, _) = login(&app, &principal_email, "principal1").await;
    let (status, _) = get_json(&app, "/api/schools", Some(&principal_access)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (admin_access, _) = login(&app, &admin_email, "superadmin1").await;
    let (status, body) = post_json(
        &app,
        "/api/schools",
        Some(&admin_access),
        json!({
            "name": generate_unique_school_name(),
            "subscription_end": "2099-01-01T00:00:00Z",
            "max_teachers": 25,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["max_teachers"], 25);

    // The listing includes the principal summary for seeded schools.
    let (status, body) = get_json(&app, "/api/schools", Some(&admin_access)).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"].as_str().unwrap() == school.id.to_string())
        .unwrap();
    assert_eq!(listed["principal_email"], principal_email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_school_subscription_window_is_validated(pool: PgPool) {
    let admin_email = generate_unique_email();
    create_test_user(&pool, &admin_email, "superadmin1", "super_admin", None).await;

    let app = setup_test_app(pool.clone());
    let (admin_access, _) = login(&app, &admin_email, "superadmin1").await;

    let (status, _) = post_json(
        &app,
        "/api/schools",
        Some(&admin_access),
        json!({
            "name": generate_unique_school_name(),
            "subscription_end": "2001-01-01T00:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
