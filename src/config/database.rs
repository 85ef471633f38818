//! PostgreSQL connection pool initialization.
//!
//! Reads `DATABASE_URL` and creates the pool once at startup; the pool is
//! cheaply cloneable and shared through `AppState`.
//!
//! # Panics
//!
//! Panics if `DATABASE_URL` is unset or the connection fails — there is no
//! meaningful way to serve requests without a database.

use sqlx::PgPool;
use std::env;

pub async fn init_db_pool() -> PgPool {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}
