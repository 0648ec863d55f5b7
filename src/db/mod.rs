mod error;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, feature = "database-sqlite"))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    accounts: Arc<dyn AccountRepo>,
    companies: Arc<dyn CompanyRepo>,
    tag_types: Arc<dyn TagTypeRepo>,
    tags: Arc<dyn TagRepo>,
    experiences: Arc<dyn ExperienceRepo>,
    opportunities: Arc<dyn OpportunityRepo>,
    mentorships: Arc<dyn MentorshipRepo>,
    notifications: Arc<dyn NotificationRepo>,
    analytics: Arc<dyn AnalyticsRepo>,
}

#[cfg(feature = "database-sqlite")]
impl CachedRepos {
    fn sqlite(pool: &sqlx::SqlitePool) -> Self {
        Self {
            accounts: Arc::new(sqlite::SqliteAccountRepo::new(pool.clone())),
            companies: Arc::new(sqlite::SqliteCompanyRepo::new(pool.clone())),
            tag_types: Arc::new(sqlite::SqliteTagTypeRepo::new(pool.clone())),
            tags: Arc::new(sqlite::SqliteTagRepo::new(pool.clone())),
            experiences: Arc::new(sqlite::SqliteExperienceRepo::new(pool.clone())),
            opportunities: Arc::new(sqlite::SqliteOpportunityRepo::new(pool.clone())),
            mentorships: Arc::new(sqlite::SqliteMentorshipRepo::new(pool.clone())),
            notifications: Arc::new(sqlite::SqliteNotificationRepo::new(pool.clone())),
            analytics: Arc::new(sqlite::SqliteAnalyticsRepo::new(pool.clone())),
        }
    }
}

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(not(feature = "database-sqlite"))]
    _None(std::convert::Infallible),
}

/// Database pool plus the repositories built on it.
///
/// Repositories are cached at construction time to avoid allocation on each access.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        DbPool {
            repos: CachedRepos::sqlite(&pool),
            inner: PoolStorage::Sqlite(pool),
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .foreign_keys(true)
                            .journal_mode(if cfg.wal_mode {
                                sqlx::sqlite::SqliteJournalMode::Wal
                            } else {
                                sqlx::sqlite::SqliteJournalMode::Delete
                            })
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                Ok(Self::from_sqlite(pool))
            }
        }
    }

    /// Run database migrations using sqlx's migration runner
    /// This automatically creates and manages a _sqlx_migrations table
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    pub fn accounts(&self) -> Arc<dyn AccountRepo> {
        Arc::clone(&self.repos.accounts)
    }

    pub fn companies(&self) -> Arc<dyn CompanyRepo> {
        Arc::clone(&self.repos.companies)
    }

    pub fn tag_types(&self) -> Arc<dyn TagTypeRepo> {
        Arc::clone(&self.repos.tag_types)
    }

    pub fn tags(&self) -> Arc<dyn TagRepo> {
        Arc::clone(&self.repos.tags)
    }

    pub fn experiences(&self) -> Arc<dyn ExperienceRepo> {
        Arc::clone(&self.repos.experiences)
    }

    pub fn opportunities(&self) -> Arc<dyn OpportunityRepo> {
        Arc::clone(&self.repos.opportunities)
    }

    pub fn mentorships(&self) -> Arc<dyn MentorshipRepo> {
        Arc::clone(&self.repos.mentorships)
    }

    pub fn notifications(&self) -> Arc<dyn NotificationRepo> {
        Arc::clone(&self.repos.notifications)
    }

    /// Read-only aggregate queries
    pub fn analytics(&self) -> Arc<dyn AnalyticsRepo> {
        Arc::clone(&self.repos.analytics)
    }

    /// Health check for database connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }
}
