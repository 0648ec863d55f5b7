use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{ListParams, ListResult, MentorshipRepo, cursor_from_row, truncate_to_millis},
    },
    models::{
        CreateMentorship, Mentorship, MentorshipStatus, MentorshipType, UpdateMentorship,
        check_window,
    },
};

const MENTORSHIP_COLUMNS: &str = "id, title, description, mentorship_type, status, mentor_id, \
     mentee_id, start_date, end_date, meeting_link, meeting_notes, created_at, updated_at";

pub struct SqliteMentorshipRepo {
    pool: SqlitePool,
}

impl SqliteMentorshipRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_mentorship(row: &sqlx::sqlite::SqliteRow) -> DbResult<Mentorship> {
        let mentorship_type: String = row.get("mentorship_type");
        let status: String = row.get("status");

        Ok(Mentorship {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            title: row.get("title"),
            description: row.get("description"),
            mentorship_type: parse_enum(
                &mentorship_type,
                "mentorship_type",
                MentorshipType::from_str,
            )?,
            status: parse_enum(&status, "status", MentorshipStatus::from_str)?,
            mentor_id: parse_uuid(&row.get::<String, _>("mentor_id"))?,
            mentee_id: parse_uuid(&row.get::<String, _>("mentee_id"))?,
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            meeting_link: row.get("meeting_link"),
            meeting_notes: row.get("meeting_notes"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl MentorshipRepo for SqliteMentorshipRepo {
    async fn create(&self, mentee_id: Uuid, input: CreateMentorship) -> DbResult<Mentorship> {
        if input.mentor_id == mentee_id {
            return Err(DbError::Validation(
                "Mentor and mentee must be different accounts".into(),
            ));
        }

        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO mentorships (
                id, title, description, mentorship_type, status, mentor_id, mentee_id,
                start_date, end_date, meeting_link, meeting_notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.mentorship_type.as_str())
        .bind(MentorshipStatus::Pending.as_str())
        .bind(input.mentor_id.to_string())
        .bind(mentee_id.to_string())
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.meeting_link)
        .bind(&input.meeting_notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_write(
                e,
                "Mentorship already exists",
                &format!("Mentor {} does not exist", input.mentor_id),
            )
        })?;

        Ok(Mentorship {
            id,
            title: input.title,
            description: input.description,
            mentorship_type: input.mentorship_type,
            status: MentorshipStatus::Pending,
            mentor_id: input.mentor_id,
            mentee_id,
            start_date: input.start_date,
            end_date: input.end_date,
            meeting_link: input.meeting_link,
            meeting_notes: input.meeting_notes,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Mentorship>> {
        let row = sqlx::query(&format!(
            "SELECT {MENTORSHIP_COLUMNS} FROM mentorships WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_mentorship).transpose()
    }

    async fn list_for_participant(
        &self,
        account_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<Mentorship>> {
        let limit = params.effective_limit();
        let (comparison, order) = params.direction.keyset_sql();

        let cursor_clause = if params.cursor.is_some() {
            format!("AND (created_at, id) {comparison} (?, ?)")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT {MENTORSHIP_COLUMNS} FROM mentorships \
             WHERE (mentor_id = ? OR mentee_id = ?) {cursor_clause} \
             ORDER BY created_at {order}, id {order} LIMIT ?"
        );

        let mut query_builder = sqlx::query(&query)
            .bind(account_id.to_string())
            .bind(account_id.to_string());
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
            .map(Self::parse_mentorship)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(ListResult::from_lookahead(items, &params, |m| {
            cursor_from_row(m.created_at, m.id)
        }))
    }

    async fn update(&self, id: Uuid, input: UpdateMentorship) -> DbResult<Mentorship> {
        let Some(mut mentorship) = self.get_by_id(id).await? else {
            return Err(DbError::NotFound);
        };

        if let Some(title) = input.title {
            mentorship.title = title;
        }
        if let Some(description) = input.description {
            mentorship.description = description;
        }
        if let Some(mentorship_type) = input.mentorship_type {
            mentorship.mentorship_type = mentorship_type;
        }
        if let Some(status) = input.status {
            mentorship.status = status;
        }
        if let Some(start_date) = input.start_date {
            mentorship.start_date = start_date;
        }
        if let Some(end_date) = input.end_date {
            mentorship.end_date = end_date;
        }
        if let Some(meeting_link) = input.meeting_link {
            mentorship.meeting_link = meeting_link;
        }
        if let Some(meeting_notes) = input.meeting_notes {
            mentorship.meeting_notes = meeting_notes;
        }

        // The merged window is only known after applying the patch
        check_window(Some(mentorship.start_date), mentorship.end_date).map_err(|e| {
            DbError::Validation(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            )
        })?;

        mentorship.updated_at = truncate_to_millis(Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE mentorships
            SET title = ?, description = ?, mentorship_type = ?, status = ?, start_date = ?,
                end_date = ?, meeting_link = ?, meeting_notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&mentorship.title)
        .bind(&mentorship.description)
        .bind(mentorship.mentorship_type.as_str())
        .bind(mentorship.status.as_str())
        .bind(mentorship.start_date)
        .bind(mentorship.end_date)
        .bind(&mentorship.meeting_link)
        .bind(&mentorship.meeting_notes)
        .bind(mentorship.updated_at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(mentorship)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM mentorships WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
