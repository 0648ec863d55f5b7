use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{EXPERIENCE_TAGS, normalize_tags, parse_enum, parse_uuid, placeholders};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            ExperienceFilter, ExperienceRepo, ListParams, ListResult, VisibilityScope,
            WriteGuard, cursor_from_row, truncate_to_millis,
        },
    },
    models::{CreateExperience, Experience, JobType, SaveState, UpdateExperience},
};

const EXPERIENCE_COLUMNS: &str = "e.id, e.title, e.role, e.short_description, e.content, e.tips, \
     e.compensation, e.experience_date, e.job_type, e.visibility, e.verified, e.author_id, \
     e.company_id, e.published_at, e.updated_at, e.version";

pub struct SqliteExperienceRepo {
    pool: SqlitePool,
}

impl SqliteExperienceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_experience(row: &sqlx::sqlite::SqliteRow, tags: Vec<Uuid>) -> DbResult<Experience> {
        let job_type: String = row.get("job_type");
        let content = row
            .get::<Option<String>, _>("content")
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;

        Ok(Experience {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            title: row.get("title"),
            role: row.get("role"),
            short_description: row.get("short_description"),
            content,
            tips: row.get("tips"),
            compensation: row.get("compensation"),
            experience_date: row.get("experience_date"),
            job_type: parse_enum(&job_type, "job_type", JobType::from_str)?,
            visibility: row.get("visibility"),
            verified: row.get("verified"),
            author_id: parse_uuid(&row.get::<String, _>("author_id"))?,
            company_id: parse_uuid(&row.get::<String, _>("company_id"))?,
            tags,
            published_at: row.get("published_at"),
            updated_at: row.get("updated_at"),
            version: row.get("version"),
        })
    }

    fn parse_rows(
        rows: &[sqlx::sqlite::SqliteRow],
        mut tags: HashMap<Uuid, Vec<Uuid>>,
    ) -> DbResult<Vec<Experience>> {
        rows.iter()
            .map(|row| {
                let id = parse_uuid(&row.get::<String, _>("id"))?;
                Self::parse_experience(row, tags.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    fn row_ids(rows: &[sqlx::sqlite::SqliteRow]) -> DbResult<Vec<Uuid>> {
        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("id")))
            .collect()
    }
}

#[async_trait]
impl ExperienceRepo for SqliteExperienceRepo {
    async fn create(&self, author_id: Uuid, input: CreateExperience) -> DbResult<Experience> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());
        let tags = normalize_tags(input.tags);
        let content = input
            .content
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO experiences (
                id, title, role, short_description, content, tips, compensation,
                experience_date, job_type, visibility, verified, author_id, company_id,
                published_at, updated_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, 1)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.role)
        .bind(&input.short_description)
        .bind(&content)
        .bind(&input.tips)
        .bind(&input.compensation)
        .bind(input.experience_date)
        .bind(input.job_type.as_str())
        .bind(input.visibility)
        .bind(author_id.to_string())
        .bind(input.company_id.to_string())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            DbError::from_write(
                e,
                "Experience already exists",
                &format!("Company {} does not exist", input.company_id),
            )
        })?;

        EXPERIENCE_TAGS.replace(&mut *tx, id, &tags).await?;

        tx.commit().await?;

        Ok(Experience {
            id,
            title: input.title,
            role: input.role,
            short_description: input.short_description,
            content: input.content,
            tips: input.tips,
            compensation: input.compensation,
            experience_date: input.experience_date,
            job_type: input.job_type,
            visibility: input.visibility,
            verified: false,
            author_id,
            company_id: input.company_id,
            tags,
            published_at: now,
            updated_at: now,
            version: 1,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Experience>> {
        let row = sqlx::query(&format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experiences e WHERE e.id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut tags = EXPERIENCE_TAGS.load(&self.pool, &[id]).await?;
        Ok(Some(Self::parse_experience(
            &row,
            tags.remove(&id).unwrap_or_default(),
        )?))
    }

    async fn list(
        &self,
        filter: &ExperienceFilter,
        params: ListParams,
    ) -> DbResult<ListResult<Experience>> {
        let limit = params.effective_limit();
        let (comparison, order) = params.direction.keyset_sql();

        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let VisibilityScope::PublicOr(reader) = filter.scope {
            conditions.push("((e.visibility = 1 AND e.verified = 1) OR e.author_id = ?)".into());
            binds.push(reader.to_string());
        }
        if let Some(author_id) = filter.author_id {
            conditions.push("e.author_id = ?".into());
            binds.push(author_id.to_string());
        }
        if let Some(saved_by) = filter.saved_by {
            conditions.push(
                "EXISTS (SELECT 1 FROM experience_saves s WHERE s.experience_id = e.id AND s.account_id = ?)"
                    .into(),
            );
            binds.push(saved_by.to_string());
        }
        if let Some(verified) = filter.verified {
            conditions.push(format!("e.verified = {}", i32::from(verified)));
        }
        if let Some(company_id) = filter.company_id {
            conditions.push("e.company_id = ?".into());
            binds.push(company_id.to_string());
        }
        if !filter.tag_ids.is_empty() {
            // EXISTS keeps one row per experience regardless of matching tag count
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM experience_tags et WHERE et.experience_id = e.id AND et.tag_id IN ({}))",
                placeholders(filter.tag_ids.len())
            ));
            binds.extend(filter.tag_ids.iter().map(Uuid::to_string));
        }
        if params.cursor.is_some() {
            conditions.push(format!("(e.published_at, e.id) {comparison} (?, ?)"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experiences e {where_clause} \
             ORDER BY e.published_at {order}, e.id {order} LIMIT ?"
        );

        let mut query_builder = sqlx::query(&query);
        for value in &binds {
            query_builder = query_builder.bind(value);
        }
        if let Some(cursor) = &params.cursor {
            query_builder = query_builder
                .bind(cursor.created_at)
                .bind(cursor.id.to_string());
        }
        let rows = query_builder
            .bind(limit + 1)
            .fetch_all(&self.pool)
            .await?;

        let ids = Self::row_ids(&rows)?;
        let tags = EXPERIENCE_TAGS.load(&self.pool, &ids).await?;
        let items = Self::parse_rows(&rows, tags)?;

        Ok(ListResult::from_lookahead(items, &params, |e| {
            cursor_from_row(e.published_at, e.id)
        }))
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateExperience,
        guard: WriteGuard,
    ) -> DbResult<Experience> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {EXPERIENCE_COLUMNS} FROM experiences e WHERE e.id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(DbError::NotFound);
        };
        let mut tags = EXPERIENCE_TAGS.load(&mut *tx, &[id]).await?;
        let mut experience = Self::parse_experience(&row, tags.remove(&id).unwrap_or_default())?;

        if experience.version != guard.expected_version {
            return Err(DbError::Conflict(
                "Experience was modified concurrently. Please refresh and try again.".into(),
            ));
        }

        if let Some(title) = input.title {
            experience.title = title;
        }
        if let Some(role) = input.role {
            experience.role = role;
        }
        if let Some(short_description) = input.short_description {
            experience.short_description = short_description;
        }
        if let Some(content) = input.content {
            experience.content = content;
        }
        if let Some(tips) = input.tips {
            experience.tips = tips;
        }
        if let Some(compensation) = input.compensation {
            experience.compensation = compensation;
        }
        if let Some(experience_date) = input.experience_date {
            experience.experience_date = experience_date;
        }
        if let Some(job_type) = input.job_type {
            experience.job_type = job_type;
        }
        if let Some(company_id) = input.company_id {
            experience.company_id = company_id;
        }
        if let Some(visibility) = input.visibility {
            experience.visibility = visibility;
        }
        if let Some(verified) = input.verified {
            experience.verified = verified;
        }

        let original_version = experience.version;
        experience.version += 1;
        experience.updated_at = truncate_to_millis(Utc::now());
        let content = experience
            .content
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE experiences
            SET title = ?, role = ?, short_description = ?, content = ?, tips = ?,
                compensation = ?, experience_date = ?, job_type = ?, company_id = ?,
                visibility = ?, verified = ?, version = ?, updated_at = ?
            WHERE id = ? AND version = ?
              AND EXISTS (
                  SELECT 1 FROM accounts a
                  WHERE a.id = ? AND a.role = ? AND a.is_active = 1
              )
            "#,
        )
        .bind(&experience.title)
        .bind(&experience.role)
        .bind(&experience.short_description)
        .bind(&content)
        .bind(&experience.tips)
        .bind(&experience.compensation)
        .bind(experience.experience_date)
        .bind(experience.job_type.as_str())
        .bind(experience.company_id.to_string())
        .bind(experience.visibility)
        .bind(experience.verified)
        .bind(experience.version)
        .bind(experience.updated_at)
        .bind(id.to_string())
        .bind(original_version)
        .bind(guard.actor_id.to_string())
        .bind(guard.actor_role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            DbError::from_write(
                e,
                "Experience update conflicts with an existing record",
                &format!("Company {} does not exist", experience.company_id),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(
                "Experience was modified concurrently or the acting account's role changed. \
                 Please refresh and try again."
                    .into(),
            ));
        }

        if let Some(new_tags) = input.tags {
            experience.tags = normalize_tags(new_tags);
            EXPERIENCE_TAGS
                .replace(&mut *tx, id, &experience.tags)
                .await?;
        }

        tx.commit().await?;

        Ok(experience)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM experiences WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn toggle_save(&self, id: Uuid, account_id: Uuid) -> DbResult<SaveState> {
        let mut tx = self.pool.begin().await?;

        // The DELETE takes the write lock, so concurrent toggles serialize here
        let removed = sqlx::query(
            "DELETE FROM experience_saves WHERE experience_id = ? AND account_id = ?",
        )
        .bind(id.to_string())
        .bind(account_id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let state = if removed > 0 {
            SaveState::Unsaved
        } else {
            sqlx::query(
                "INSERT INTO experience_saves (experience_id, account_id, saved_at) VALUES (?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(account_id.to_string())
            .bind(truncate_to_millis(Utc::now()))
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    DbError::NotFound
                }
                _ => DbError::from(e),
            })?;
            SaveState::Saved
        };

        tx.commit().await?;
        Ok(state)
    }
}
