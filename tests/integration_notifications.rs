mod common;

use axum::http::StatusCode;
use common::{
    create_test_school, create_test_user, generate_unique_email, generate_unique_school_name,
    get_json, login, patch_json, setup_test_app,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn insert_notification(pool: &PgPool, user_id: Uuid, kind: &str, message: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO notifications (user_id, kind, message) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(kind)
    .bind(message)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_own_notifications_newest_first(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "student12", "student", Some(school.id)).await;

    insert_notification(&pool, user.id, "enrollment", "First").await;
    insert_notification(&pool, user.id, "enrollment", "Second").await;

    // Someone else's notification must not show up.
    let other = create_test_user(&pool, &generate_unique_email(), "student12", "student", Some(school.id)).await;
    insert_notification(&pool, other.id, "enrollment", "Not yours").await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "student12").await;

    let (status, body) = get_json(&app, "/api/notifications", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    let messages: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["message"].as_str().unwrap())
        .collect();
    assert!(!messages.contains(&"Not yours"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_read_is_owner_scoped(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "student12", "student", Some(school.id)).await;
    let other_email = generate_unique_email();
    let other =
        create_test_user(&pool, &other_email, "student12", "student", Some(school.id)).await;

    let own = insert_notification(&pool, user.id, "enrollment", "Yours").await;
    let foreign = insert_notification(&pool, other.id, "enrollment", "Theirs").await;

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "student12").await;

    let (status, body) = patch_json(
        &app,
        &format!("/api/notifications/{}/read", own),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_read"], true);

    // Another user's notification reads as not found, not forbidden.
    let (status, _) = patch_json(
        &app,
        &format!("/api/notifications/{}/read", foreign),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_read_all_and_unread_filter(pool: PgPool) {
    let school = create_test_school(&pool, &generate_unique_school_name()).await;
    let email = generate_unique_email();
    let user = create_test_user(&pool, &email, "student12", "student", Some(school.id)).await;

    for i in 0..3 {
        insert_notification(&pool, user.id, "enrollment", &format!("Message {}", i)).await;
    }

    let app = setup_test_app(pool.clone());
    let (access, _) = login(&app, &email, "student12").await;

    let (_, body) = get_json(&app, "/api/notifications?unread_only=true", Some(&access)).await;
    assert_eq!(body["meta"]["total"], 3);

    let (status, body) = patch_json(&app, "/api/notifications/read-all", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 3);

    let (_, body) = get_json(&app, "/api/notifications?unread_only=true", Some(&access)).await;
    assert_eq!(body["meta"]["total"], 0);
}
