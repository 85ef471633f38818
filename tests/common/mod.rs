use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use brightboard::config::cors::CorsConfig;
use brightboard::config::jwt::JwtConfig;
use brightboard::router::init_router;
use brightboard::state::AppState;
use brightboard::utils::password::hash_password;
use brightboard::utils::storage::LocalFileStorage;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub school_id: Option<Uuid>,
}

#[allow(dead_code)]
pub struct TestSchool {
    pub id: Uuid,
    pub name: String,
}

pub fn setup_test_app(pool: PgPool) -> Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        storage: Arc::new(LocalFileStorage::new(
            std::env::temp_dir().join("brightboard-test-storage"),
            "http://localhost:3000/files".to_string(),
        )),
    };
    init_router(state)
}

/// Create a test user with the given role.
/// `role` should be one of: "super_admin", "principal", "teacher", "student"
pub async fn create_test_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    role: &str,
    school_id: Option<Uuid>,
) -> TestUser {
    let hashed = hash_password(password).unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO users (name, email, password_hash, role, school_id)
           VALUES ($1, $2, $3, $4::user_role, $5)
           RETURNING id"#,
    )
    .bind("Test User")
    .bind(email)
    .bind(&hashed)
    .bind(role)
    .bind(school_id)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
        school_id,
    }
}

#[allow(dead_code)]
pub async fn create_test_school(pool: &PgPool, name: &str) -> TestSchool {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO schools (name, subscription_end, max_teachers)
           VALUES ($1, NOW() + INTERVAL '1 year', 10)
           RETURNING id"#,
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();

    TestSchool {
        id,
        name: name.to_string(),
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub fn generate_unique_school_name() -> String {
    format!("Test School {}", Uuid::new_v4())
}

/// POST a JSON body, optionally with a bearer token.
pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    request_json(app, "POST", uri, token, Some(body)).await
}

#[allow(dead_code)]
pub async fn patch_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    request_json(app, "PATCH", uri, token, body).await
}

#[allow(dead_code)]
pub async fn get_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    request_json(app, "GET", uri, token, None).await
}

pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

/// Login and return `(access_token, refresh_token)`.
pub async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = post_json(
        app,
        "/api/auth/login",
        None,
        serde_json::json!({ "email": email, "password": password }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}
