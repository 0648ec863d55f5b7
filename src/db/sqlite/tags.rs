use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_opt_uuid, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{TagRepo, TagTypeRepo, truncate_to_millis},
    },
    models::{CreateTag, Tag, TagType, UpdateTag},
};

pub struct SqliteTagTypeRepo {
    pool: SqlitePool,
}

impl SqliteTagTypeRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_tag_type(row: &sqlx::sqlite::SqliteRow) -> DbResult<TagType> {
        Ok(TagType {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            name: row.get("name"),
            created_at: row.get("created_at"),
        })
    }

    fn map_unique(err: sqlx::Error, name: &str) -> DbError {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(format!("Tag type '{name}' already exists"))
            }
            _ => DbError::from(err),
        }
    }
}

#[async_trait]
impl TagTypeRepo for SqliteTagTypeRepo {
    async fn create(&self, name: &str) -> DbResult<TagType> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        sqlx::query("INSERT INTO tag_types (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_unique(e, name))?;

        Ok(TagType {
            id,
            name: name.to_string(),
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<TagType>> {
        let row = sqlx::query("SELECT id, name, created_at FROM tag_types WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_tag_type).transpose()
    }

    async fn list(&self) -> DbResult<Vec<TagType>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM tag_types ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_tag_type).collect()
    }

    async fn rename(&self, id: Uuid, name: &str) -> DbResult<TagType> {
        let result = sqlx::query("UPDATE tag_types SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_unique(e, name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        // tags.type_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM tag_types WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

pub struct SqliteTagRepo {
    pool: SqlitePool,
}

impl SqliteTagRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_tag(row: &sqlx::sqlite::SqliteRow) -> DbResult<Tag> {
        Ok(Tag {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            title: row.get("title"),
            type_id: parse_opt_uuid(row.get("type_id"))?,
            created_at: row.get("created_at"),
        })
    }

    fn map_write(err: sqlx::Error, title: &str) -> DbError {
        DbError::from_write(
            err,
            &format!("Tag '{title}' already exists"),
            "Referenced tag type does not exist",
        )
    }
}

#[async_trait]
impl TagRepo for SqliteTagRepo {
    async fn create(&self, input: CreateTag) -> DbResult<Tag> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        sqlx::query("INSERT INTO tags (id, title, type_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(&input.title)
            .bind(input.type_id.map(|t| t.to_string()))
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write(e, &input.title))?;

        Ok(Tag {
            id,
            title: input.title,
            type_id: input.type_id,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Tag>> {
        let row = sqlx::query("SELECT id, title, type_id, created_at FROM tags WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_tag).transpose()
    }

    async fn list(&self) -> DbResult<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, title, type_id, created_at FROM tags ORDER BY title, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::parse_tag).collect()
    }

    async fn list_by_type(&self, type_id: Uuid) -> DbResult<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, title, type_id, created_at FROM tags WHERE type_id = ? ORDER BY title, id",
        )
        .bind(type_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_tag).collect()
    }

    async fn update(&self, id: Uuid, input: UpdateTag) -> DbResult<Tag> {
        let Some(mut tag) = self.get_by_id(id).await? else {
            return Err(DbError::NotFound);
        };
        if input.title.is_none() && input.type_id.is_none() {
            return Ok(tag);
        }

        if let Some(title) = input.title {
            tag.title = title;
        }
        if let Some(type_id) = input.type_id {
            tag.type_id = type_id;
        }

        let result = sqlx::query("UPDATE tags SET title = ?, type_id = ? WHERE id = ?")
            .bind(&tag.title)
            .bind(tag.type_id.map(|t| t.to_string()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_write(e, &tag.title))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(tag)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        // Link rows cascade
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
