mod common;

use axum::http::StatusCode;
use common::{
    create_test_school, create_test_user, generate_unique_email, generate_unique_school_name,
    get_json, login, post_json, setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_principal_can_view_as_teacher(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "principal1", "principal", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "principal1").await;

    let (status, body) = post_json(
        &app,
        "/api/auth/switch-role",
        Some(&access),
        json!({ "role": "teacher" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The switched token acts as a teacher.
    let switched_access = body["access_token"].as_str().unwrap();
    let (status, _) = get_json(&app, "/api/stats/teacher", Some(switched_access)).await;
    assert_eq!(status, StatusCode::OK);

    // And is rejected where the base role would have been accepted.
    let (status, _) = get_json(&app, "/api/stats/admin", Some(switched_access)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The switch shows up in the audit trail.
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM activity_logs WHERE user_id = $1 AND action = 'switch_role'",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_switch_mints_fresh_refresh_token(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "principal1", "principal", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "principal1").await;

    let (status, _) = post_json(
        &app,
        "/api/auth/switch-role",
        Some(&access),
        json!({ "role": "student" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let tokens = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1 AND revoked = FALSE",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    // One from login, one minted by the switch.
    assert_eq!(tokens, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_upward_switch_is_forbidden(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    create_test_user(&pool, &email, "teacher12", "teacher", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "teacher12").await;

    let (status, _) = post_json(
        &app,
        "/api/auth/switch-role",
        Some(&access),
        json!({ "role": "principal" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_switching_back_to_base_role_is_always_allowed(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    create_test_user(&pool, &email, "principal1", "principal", Some(school.id)).await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "principal1").await;

    let (_, body) = post_json(
        &app,
        "/api/auth/switch-role",
        Some(&access),
        json!({ "role": "teacher" }),
    )
    .await;
    let switched_access = body["access_token"].as_str().unwrap();

    // The switched token's base_role is still principal, so switching
    // back to principal succeeds.
    let (status, body) = post_json(
        &app,
        "/api/auth/switch-role",
        Some(switched_access),
        json!({ "role": "principal" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let restored_access = body["access_token"].as_str().unwrap();
    let (status, _) = get_json(&app, "/api/stats/admin", Some(restored_access)).await;
    assert_eq!(status, StatusCode::OK);
}
