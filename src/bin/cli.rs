use brightboard::cli::create_super_admin;
use brightboard::cli::seeder::{UsersPerSchool, clear_seeded_data, seed_database};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "brightboard-cli")]
#[command(about = "Brightboard CLI - Administrative tools for Brightboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new super administrator account
    CreateSuperadmin {
        /// Full name of the super admin
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake schools and users
    Seed {
        /// Number of schools to create
        #[arg(short = 's', long, default_value = "3")]
        schools: usize,

        /// Number of teachers per school
        #[arg(long, default_value = "5")]
        teachers: usize,

        /// Number of students per school
        #[arg(long, default_value = "20")]
        students: usize,

        /// Number of courses per school
        #[arg(long, default_value = "4")]
        courses: usize,
    },
    /// Clear all seeded data (keeps super admins)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateSuperadmin {
            name,
            email,
            password,
        } => handle_create_superadmin(&pool, name, email, password).await,
        Commands::Seed {
            schools,
            teachers,
            students,
            courses,
        } => {
            let per_school = UsersPerSchool {
                teachers,
                students,
                courses,
            };
            if let Err(e) = seed_database(&pool, schools, per_school).await {
                eprintln!("❌ Seeding failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::ClearSeed => {
            if let Err(e) = clear_seeded_data(&pool).await {
                eprintln!("❌ Clearing seeded data failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn handle_create_superadmin(
    pool: &sqlx::PgPool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let name = name.unwrap_or_else(|| {
        Input::new()
            .with_prompt("Full name")
            .interact_text()
            .expect("Failed to read name")
    });

    let email = email.unwrap_or_else(|| {
        Input::new()
            .with_prompt("Email")
            .interact_text()
            .expect("Failed to read email")
    });

    let password = password.unwrap_or_else(|| {
        Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .expect("Failed to read password")
    });

    match create_super_admin(pool, &name, &email, &password).await {
        Ok(_) => {
            println!("✅ Super admin created successfully!");
            println!("   Email: {}", email);
            println!("   Name: {}", name);
        }
        Err(e) => {
            eprintln!("❌ Error creating super admin: {}", e);
            std::process::exit(1);
        }
    }
}
