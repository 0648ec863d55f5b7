use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{CompanyRepo, ListParams, ListResult, cursor_from_row, truncate_to_millis},
    },
    models::{Company, CreateCompany, UpdateCompany},
};

const COMPANY_COLUMNS: &str =
    "id, name, slug, logo_path, description, website, created_at, updated_at";

pub struct SqliteCompanyRepo {
    pool: SqlitePool,
}

impl SqliteCompanyRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_company(row: &sqlx::sqlite::SqliteRow) -> DbResult<Company> {
        Ok(Company {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            name: row.get("name"),
            slug: row.get("slug"),
            logo_path: row.get("logo_path"),
            description: row.get("description"),
            website: row.get("website"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn map_unique(err: sqlx::Error, name: &str) -> DbError {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(format!("Company '{}' already exists", name))
            }
            _ => DbError::from(err),
        }
    }
}

#[async_trait]
impl CompanyRepo for SqliteCompanyRepo {
    async fn create(&self, input: CreateCompany, slug: &str) -> DbResult<Company> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO companies (id, name, slug, logo_path, description, website, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.name)
        .bind(slug)
        .bind(&input.logo_path)
        .bind(&input.description)
        .bind(&input.website)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique(e, &input.name))?;

        Ok(Company {
            id,
            name: input.name,
            slug: slug.to_string(),
            logo_path: input.logo_path,
            description: input.description,
            website: input.website,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Company>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_company).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Company>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_company).transpose()
    }

    async fn list(&self, params: ListParams) -> DbResult<ListResult<Company>> {
        let limit = params.effective_limit();
        let (comparison, order) = params.direction.keyset_sql();

        let cursor_clause = if params.cursor.is_some() {
            format!("WHERE (created_at, id) {comparison} (?, ?)")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT {COMPANY_COLUMNS} FROM companies {cursor_clause} ORDER BY created_at {order}, id {order} LIMIT ?"
        );

        let mut query_builder = sqlx::query(&query);
        if let Some(cursor) = &params.cursor {
            query_builder = query_builder
                .bind(cursor.created_at)
                .bind(cursor.id.to_string());
        }
        let rows = query_builder
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(Self::parse_company)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(ListResult::from_lookahead(items, &params, |c| {
            cursor_from_row(c.created_at, c.id)
        }))
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateCompany,
        slug: Option<String>,
    ) -> DbResult<Company> {
        let Some(mut company) = self.get_by_id(id).await? else {
            return Err(DbError::NotFound);
        };
        if input.is_empty() {
            return Ok(company);
        }

        if let Some(name) = input.name {
            company.name = name;
        }
        if let Some(slug) = slug {
            company.slug = slug;
        }
        if let Some(logo_path) = input.logo_path {
            company.logo_path = logo_path;
        }
        if let Some(description) = input.description {
            company.description = description;
        }
        if let Some(website) = input.website {
            company.website = website;
        }
        company.updated_at = truncate_to_millis(Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = ?, slug = ?, logo_path = ?, description = ?, website = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.logo_path)
        .bind(&company.description)
        .bind(&company.website)
        .bind(company.updated_at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_unique(e, &company.name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(company)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
