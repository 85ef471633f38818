use dotenvy::dotenv;

use brightboard::logging::init_tracing;
use brightboard::router::init_router;
use brightboard::state::init_app_state;
use brightboard::tasks::spawn_cleanup_task;

#[tokio::main]
async fn main() {
    dotenv().ok();

    init_tracing();

    let state = init_app_state().await;
    spawn_cleanup_task(state.clone());

    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("🚀 Server running on http://localhost:3000");
    println!("📚 Swagger UI available at http://localhost:3000/swagger-ui");
    println!("📖 Scalar UI available at http://localhost:3000/scalar");
    axum::serve(listener, app).await.unwrap();
}
