//! Test harness for database repository testing
//!
//! Every test gets a fresh in-memory SQLite database with the real migrations
//! applied, wrapped in a [`DbPool`] so tests exercise the same repository
//! handles the server uses. Concurrency tests use a temporary database file
//! instead, since an in-memory database lives on a single connection.

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    config::{DatabaseConfig, SqliteConfig},
    db::DbPool,
    models::{Account, Company, CreateCompany, CreateExperience, JobType, NewAccount, Role},
};

/// Create an in-memory SQLite pool for testing
pub async fn create_sqlite_pool() -> SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool")
}

/// Run SQLite migrations on the pool
///
/// Uses the actual migration files to ensure tests match production schema
pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations_sqlx/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

/// Fresh migrated database behind a `DbPool`.
pub async fn create_test_db() -> DbPool {
    let pool = create_sqlite_pool().await;
    run_sqlite_migrations(&pool).await;
    DbPool::from_sqlite(pool)
}

/// Migrated database file inside `dir`, opened the way the server opens it
/// (WAL, busy timeout) with room for concurrent connections.
pub async fn create_file_test_db(dir: &tempfile::TempDir, max_connections: u32) -> DbPool {
    let config = DatabaseConfig::Sqlite(SqliteConfig {
        path: dir.path().join("portal.db").to_string_lossy().into_owned(),
        create_if_missing: true,
        run_migrations: true,
        wal_mode: true,
        busy_timeout_ms: 5000,
        max_connections,
    });
    let db = DbPool::from_config(&config)
        .await
        .expect("Failed to open file-backed SQLite database");
    db.run_migrations()
        .await
        .expect("Failed to run SQLite migrations");
    db
}

/// Shared state handed to every repository test function.
pub struct RepoTestContext {
    pub db: Arc<DbPool>,
}

impl RepoTestContext {
    pub async fn new() -> Self {
        Self {
            db: Arc::new(create_test_db().await),
        }
    }

    pub async fn account(&self, role: Role) -> Account {
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        self.db
            .accounts()
            .create(NewAccount {
                email: format!("{suffix}@college.edu"),
                name: format!("Test {suffix}"),
                roll_number: format!("R{suffix}"),
                department: "Computer Science".to_string(),
                programme: "BTech".to_string(),
                role,
            })
            .await
            .expect("Failed to create test account")
    }

    pub async fn company(&self, name: &str) -> Company {
        self.db
            .companies()
            .create(
                CreateCompany {
                    name: name.to_string(),
                    logo_path: String::new(),
                    description: String::new(),
                    website: None,
                },
                &crate::models::slugify(name),
            )
            .await
            .expect("Failed to create test company")
    }
}

pub fn experience_input(company_id: Uuid, title: &str) -> CreateExperience {
    CreateExperience {
        title: title.to_string(),
        role: "SDE Intern".to_string(),
        short_description: "Two technical rounds and an HR round".to_string(),
        content: Some(serde_json::json!({"blocks": [{"type": "paragraph", "text": "Prepare DSA"}]})),
        tips: Some("Practice graphs".to_string()),
        compensation: None,
        experience_date: NaiveDate::from_ymd_opt(2024, 7, 15).expect("valid date"),
        job_type: JobType::Internship,
        company_id,
        tags: Vec::new(),
        visibility: true,
    }
}
