use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{AccountRepo, truncate_to_millis},
    },
    models::{Account, NewAccount, Role},
};

const ACCOUNT_COLUMNS: &str = "id, email, backup_email, name, roll_number, department, programme, \
     role, is_active, created_at, updated_at";

pub struct SqliteAccountRepo {
    pool: SqlitePool,
}

impl SqliteAccountRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_account(row: &sqlx::sqlite::SqliteRow) -> DbResult<Account> {
        let role: String = row.get("role");

        Ok(Account {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            email: row.get("email"),
            backup_email: row.get("backup_email"),
            name: row.get("name"),
            roll_number: row.get("roll_number"),
            department: row.get("department"),
            programme: row.get("programme"),
            role: parse_enum(&role, "role", Role::from_str)?,
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> DbResult<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {clause}");
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_account).transpose()
    }
}

#[async_trait]
impl AccountRepo for SqliteAccountRepo {
    async fn create(&self, input: NewAccount) -> DbResult<Account> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, name, roll_number, department, programme, role,
                is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.roll_number)
        .bind(&input.department)
        .bind(&input.programme)
        .bind(input.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::Conflict(
                format!(
                    "An account with email '{}' or roll number '{}' already exists",
                    input.email, input.roll_number
                ),
            ),
            _ => DbError::from(e),
        })?;

        Ok(Account {
            id,
            email: input.email,
            backup_email: None,
            name: input.name,
            roll_number: input.roll_number,
            department: input.department,
            programme: input.programme,
            role: input.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>> {
        self.fetch_one_where("id = ?", &id.to_string()).await
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        // email column is COLLATE NOCASE
        self.fetch_one_where("email = ?", email).await
    }

    async fn get_by_backup_email(&self, email: &str) -> DbResult<Option<Account>> {
        self.fetch_one_where("backup_email = ? ORDER BY created_at LIMIT 1", email)
            .await
    }

    async fn set_backup_email(&self, id: Uuid, backup_email: &str) -> DbResult<Account> {
        let result = sqlx::query("UPDATE accounts SET backup_email = ?, updated_at = ? WHERE id = ?")
            .bind(backup_email)
            .bind(truncate_to_millis(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, "Backup email is already in use", "account"))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> DbResult<Account> {
        let result = sqlx::query("UPDATE accounts SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(truncate_to_millis(Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn list_active_except(&self, exclude: Uuid) -> DbResult<Vec<Account>> {
        let query = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE is_active = 1 AND id <> ? ORDER BY name, id"
        );
        let rows = sqlx::query(&query)
            .bind(exclude.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_account).collect()
    }
}
