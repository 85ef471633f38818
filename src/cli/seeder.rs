//! Database seeder for local development.
//!
//! Creates fake schools with a principal, teachers, students, and
//! courses each, wires up enrollments and teacher assignments, and can
//! clear everything again while keeping super admins.

use bcrypt::hash;
use chrono::{Duration, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

/// All seeded accounts share this password.
pub const SEED_PASSWORD: &str = "password123";

pub struct UsersPerSchool {
    pub teachers: usize,
    pub students: usize,
    pub courses: usize,
}

impl Default for UsersPerSchool {
    fn default() -> Self {
        Self {
            teachers: 5,
            students: 20,
            courses: 4,
        }
    }
}

pub async fn seed_database(
    db: &PgPool,
    num_schools: usize,
    per_school: UsersPerSchool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    println!("🌱 Starting database seeding...");
    println!("   - Schools: {}", num_schools);
    println!(
        "   - Per school: 1 principal, {} teachers, {} students, {} courses",
        per_school.teachers, per_school.students, per_school.courses
    );

    // One cheap hash shared by every seeded account; per-user hashing at
    // the default cost would dominate the runtime.
    let password_hash = hash(SEED_PASSWORD, 4)?;

    for school_index in 0..num_schools {
        let school_name: String = format!("{} Academy", CompanyName().fake::<String>());
        let school_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO schools (name, subscription_end, max_teachers)
               VALUES ($1, $2, $3)
               RETURNING id"#,
        )
        .bind(&school_name)
        .bind(Utc::now() + Duration::days(365))
        .bind((per_school.teachers as i32).max(10))
        .fetch_one(db)
        .await?;

        seed_user(
            db,
            &password_hash,
            "principal",
            &format!("principal.s{}@seed.brightboard.dev", school_index),
            school_id,
        )
        .await?;

        let mut teacher_ids = Vec::with_capacity(per_school.teachers);
        for i in 0..per_school.teachers {
            let id = seed_user(
                db,
                &password_hash,
                "teacher",
                &format!("teacher{}.s{}@seed.brightboard.dev", i, school_index),
                school_id,
            )
            .await?;
            teacher_ids.push(id);
        }

        let mut student_ids = Vec::with_capacity(per_school.students);
        for i in 0..per_school.students {
            let id = seed_user(
                db,
                &password_hash,
                "student",
                &format!("student{}.s{}@seed.brightboard.dev", i, school_index),
                school_id,
            )
            .await?;
            student_ids.push(id);
        }

        for i in 0..per_school.courses {
            let course_id = sqlx::query_scalar::<_, Uuid>(
                r#"INSERT INTO courses (school_id, name, description)
                   VALUES ($1, $2, $3)
                   RETURNING id"#,
            )
            .bind(school_id)
            .bind(format!("Course {} at {}", i + 1, school_name))
            .bind("Seeded course for local development")
            .fetch_one(db)
            .await?;

            if let Some(teacher_id) = teacher_ids.get(i % teacher_ids.len().max(1)) {
                sqlx::query(
                    r#"INSERT INTO course_teachers (teacher_id, course_id, school_id)
                       VALUES ($1, $2, $3) ON CONFLICT DO NOTHING"#,
                )
                .bind(teacher_id)
                .bind(course_id)
                .bind(school_id)
                .execute(db)
                .await?;
            }

            for student_id in &student_ids {
                sqlx::query(
                    r#"INSERT INTO course_students (student_id, course_id, school_id)
                       VALUES ($1, $2, $3) ON CONFLICT DO NOTHING"#,
                )
                .bind(student_id)
                .bind(course_id)
                .bind(school_id)
                .execute(db)
                .await?;
            }
        }

        println!("   ✓ Seeded {}", school_name);
    }

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    println!("   All accounts use the password: {}", SEED_PASSWORD);

    Ok(())
}

async fn seed_user(
    db: &PgPool,
    password_hash: &str,
    role: &str,
    email: &str,
    school_id: Uuid,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    let name: String = Name().fake();

    let id = sqlx::query_scalar::<_, Uuid>(
        &format!(
            r#"INSERT INTO users (name, email, password_hash, role, school_id)
               VALUES ($1, $2, $3, '{}', $4)
               ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
               RETURNING id"#,
            role
        ),
    )
    .bind(&name)
    .bind(email)
    .bind(password_hash)
    .bind(school_id)
    .fetch_one(db)
    .await?;

    Ok(id)
}

/// Delete all seeded data. Super admins survive; everything else goes in
/// FK dependency order.
pub async fn clear_seeded_data(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧹 Clearing seeded data (super admins are kept)...");

    for table in [
        "submissions",
        "notifications",
        "activity_logs",
        "course_students",
        "course_teachers",
        "notes",
        "assignments",
        "learning_materials",
        "courses",
        "password_change_requests",
        "signup_requests",
        "refresh_tokens",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(db)
            .await?;
    }

    sqlx::query("DELETE FROM users WHERE role <> 'super_admin'")
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM schools").execute(db).await?;

    println!("✅ Seeded data cleared");

    Ok(())
}
