mod common;

use axum::http::StatusCode;
use common::{
    create_test_school, create_test_user, generate_unique_email, generate_unique_school_name,
    get_json, login, patch_json, post_json, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_wrong_current_stages_nothing(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "oldpass123", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "oldpass123").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/change-password",
        Some(&access),
        json!({ "current_password": "not-the-password", "new_password": "newpass456" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM password_change_requests WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_change_password_stages_request_and_keeps_old_credential(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    let principal =
        create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "oldpass123", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "oldpass123").await;

    let (status, _) = post_json(
        &app,
        "/api/auth/change-password",
        Some(&access),
        json!({ "current_password": "oldpass123", "new_password": "newpass456" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Staged, not applied: the old password still logs in, the new one
    // does not.
    login(&app, &email, "oldpass123").await;
    let (status, _) = post_json(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": email, "password": "newpass456" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status_str = sqlx::query_scalar::<_, String>(
        "SELECT status::text FROM password_change_requests WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(status_str, "pending");

    // The approver tier was notified.
    let notified = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND kind = 'password_change_request'",
    )
    .bind(principal.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(notified, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_second_pending_request_conflicts(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    create_test_user(&pool, &email, "oldpass123", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "oldpass123").await;

    let body = json!({ "current_password": "oldpass123", "new_password": "newpass456" });
    let (status, _) = post_json(&app, "/api/auth/change-password", Some(&access), body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(&app, "/api/auth/change-password", Some(&access), body).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_approve_applies_hash_and_revokes_sessions(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "oldpass123", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, refresh) = login(&app, &email, "oldpass123").await;

    post_json(
        &app,
        "/api/auth/change-password",
        Some(&access),
        json!({ "current_password": "oldpass123", "new_password": "newpass456" }),
    )
    .await;

    let request_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM password_change_requests WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let (principal_access, _) = login(&app, &principal_email, "principal1").await;
    let (status, _) = patch_json(
        &app,
        &format!("/api/auth/password-requests/{}/approve", request_id),
        Some(&principal_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // New credential applied.
    login(&app, &email, "newpass456").await;
    let (status, _) = post_json(
        &app,
        "/api/auth/login",
        None,
        json!({ "email": email, "password": "oldpass123" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // All prior sessions forced out.
    let (status, _) = post_json(
        &app,
        "/api/auth/refresh",
        None,
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The user was told.
    let notified = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND kind = 'password_change'",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(notified, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolving_twice_conflicts_naming_status(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "oldpass123", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "oldpass123").await;

    post_json(
        &app,
        "/api/auth/change-password",
        Some(&access),
        json!({ "current_password": "oldpass123", "new_password": "newpass456" }),
    )
    .await;

    let request_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM password_change_requests WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let (principal_access, _) = login(&app, &principal_email, "principal1").await;

    let approve_uri = format!("/api/auth/password-requests/{}/approve", request_id);
    let reject_uri = format!("/api/auth/password-requests/{}/reject", request_id);

    let (status, _) = patch_json(&app, &approve_uri, Some(&principal_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // Approving again conflicts, naming the current status.
    let (status, body) = patch_json(&app, &approve_uri, Some(&principal_access), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Password change request already approved");

    // Rejecting an approved request conflicts the same way.
    let (status, body) = patch_json(&app, &reject_uri, Some(&principal_access), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Password change request already approved");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reject_leaves_password_and_sessions_intact(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "oldpass123", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, refresh) = login(&app, &email, "oldpass123").await;

    post_json(
        &app,
        "/api/auth/change-password",
        Some(&access),
        json!({ "current_password": "oldpass123", "new_password": "newpass456" }),
    )
    .await;

    let request_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM password_change_requests WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let (principal_access, _) = login(&app, &principal_email, "principal1").await;
    let (status, _) = patch_json(
        &app,
        &format!("/api/auth/password-requests/{}/reject", request_id),
        Some(&principal_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password still valid, session still alive.
    login(&app, &email, "oldpass123").await;
    let (status, _) = post_json(
        &app,
        "/api/auth/refresh",
        None,
        json!({ "refresh_token": refresh }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_tier_mismatch_rejected_even_in_same_school(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let principal_email = generate_unique_email();
    let principal =
        create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;
    let teacher_email = generate_unique_email();
    create_test_user(&pool, &teacher_email, "teacher12", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());

    // The principal stages a password change; only a super admin may
    // resolve it.
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;
    post_json(
        &app,
        "/api/auth/change-password",
        Some(&principal_access),
        json!({ "current_password": "principal1", "new_password": "newpass456" }),
    )
    .await;

    let request_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM password_change_requests WHERE user_id = $1",
    )
    .bind(principal.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let (teacher_access, _) = login(&app, &teacher_email, "teacher12").await;
    let (status, _) = patch_json(
        &app,
        &format!("/api/auth/password-requests/{}/approve", request_id),
        Some(&teacher_access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_super_admin_password_change_is_immediate(pool: PgPool) {
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "oldpass123", "super_admin", None).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "oldpass123").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/change-password",
        Some(&access),
        json!({ "current_password": "oldpass123", "new_password": "newpass456" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Password changed successfully. Logged out from all sessions."
    );

    login(&app, &email, "newpass456").await;

    // No request row was staged.
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM password_change_requests WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_password_requests_is_tier_scoped(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let other_school = create_test_school(&pool, &generate_unique_school_name()).await;

    let principal_email = generate_unique_email();
    create_test_user(&pool, &principal_email, "principal1", "principal", Some(school.id)).await;

    // One teacher in each school stages a request.
    let teacher_email = generate_unique_email();
    create_test_user(&pool, &teacher_email, "teacher12", "teacher", Some(school.id)).await;
    let other_teacher_email = generate_unique_email();
    create_test_user(
        &pool,
        &other_teacher_email,
        "teacher12",
        "teacher",
        Some(other_school.id),
    )
    .await;

    let app = setup_test_app(pool.clone());

    for email in [&teacher_email, &other_teacher_email] {
        let (access, _) = login(&app, email, "teacher12").await;
        let (status, _) = post_json(
            &app,
            "/api/auth/change-password",
            Some(&access),
            json!({ "current_password": "teacher12", "new_password": "newpass456" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // The principal only sees the request from their own school.
    let (principal_access, _) = login(&app, &principal_email, "principal1").await;
    let (status, body) = get_json(
        &app,
        "/api/auth/password-requests?status=pending",
        Some(&principal_access),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["user_email"], teacher_email);
    assert_eq!(body["data"][0]["user_role"], "teacher");
}
