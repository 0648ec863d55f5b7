use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_enum, parse_opt_uuid, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{ListParams, ListResult, NotificationRepo, cursor_from_row, truncate_to_millis},
    },
    models::{CreateNotification, Notification, NotificationType},
};

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, notification_type, is_read, \
     related_opportunity_id, related_experience_id, related_mentorship_id, created_at";

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_notification(row: &sqlx::sqlite::SqliteRow) -> DbResult<Notification> {
        let notification_type: String = row.get("notification_type");

        Ok(Notification {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
            title: row.get("title"),
            message: row.get("message"),
            notification_type: parse_enum(
                &notification_type,
                "notification_type",
                NotificationType::from_str,
            )?,
            is_read: row.get("is_read"),
            related_opportunity_id: parse_opt_uuid(row.get("related_opportunity_id"))?,
            related_experience_id: parse_opt_uuid(row.get("related_experience_id"))?,
            related_mentorship_id: parse_opt_uuid(row.get("related_mentorship_id"))?,
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl NotificationRepo for SqliteNotificationRepo {
    async fn create(&self, input: CreateNotification) -> DbResult<Notification> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, user_id, title, message, notification_type, is_read,
                related_opportunity_id, related_experience_id, related_mentorship_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(input.user_id.to_string())
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.notification_type.as_str())
        .bind(input.related_opportunity_id.map(|i| i.to_string()))
        .bind(input.related_experience_id.map(|i| i.to_string()))
        .bind(input.related_mentorship_id.map(|i| i.to_string()))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_write(
                e,
                "Notification already exists",
                "Recipient or related record does not exist",
            )
        })?;

        Ok(Notification {
            id,
            user_id: input.user_id,
            title: input.title,
            message: input.message,
            notification_type: input.notification_type,
            is_read: false,
            related_opportunity_id: input.related_opportunity_id,
            related_experience_id: input.related_experience_id,
            related_mentorship_id: input.related_mentorship_id,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Notification>> {
        let row = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_notification).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<Notification>> {
        let limit = params.effective_limit();
        let (comparison, order) = params.direction.keyset_sql();

        let cursor_clause = if params.cursor.is_some() {
            format!("AND (created_at, id) {comparison} (?, ?)")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ? {cursor_clause} \
             ORDER BY created_at {order}, id {order} LIMIT ?"
        );

        let mut query_builder = sqlx::query(&query).bind(user_id.to_string());
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
            .map(Self::parse_notification)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(ListResult::from_lookahead(items, &params, |n| {
            cursor_from_row(n.created_at, n.id)
        }))
    }

    async fn mark_read(&self, id: Uuid) -> DbResult<Notification> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
