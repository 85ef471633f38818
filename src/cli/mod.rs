use sqlx::PgPool;

use crate::utils::password::hash_password;

pub mod seeder;

/// Create a super admin account. Super admins can only be created here,
/// never through the API.
pub async fn create_super_admin(
    db: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let hashed_password = hash_password(password)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, role, school_id)
         VALUES ($1, $2, $3, 'super_admin', NULL)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(name)
    .bind(email)
    .bind(hashed_password)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err("User with this email already exists".into());
    }

    Ok(())
}
