use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{
    OPPORTUNITY_TAGS, normalize_tags, parse_enum, parse_opt_uuid, parse_uuid, placeholders,
};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{
            ListParams, ListResult, OpportunityFilter, OpportunityRepo, VisibilityScope,
            WriteGuard, cursor_from_row, truncate_to_millis,
        },
    },
    models::{CreateOpportunity, Opportunity, OpportunityType, SaveState, UpdateOpportunity},
};

const OPPORTUNITY_COLUMNS: &str = "o.id, o.title, o.description, o.opportunity_type, o.company_id, \
     o.application_deadline, o.start_date, o.end_date, o.location, o.is_remote, o.compensation, \
     o.requirements, o.application_link, o.contact_email, o.visibility, o.verified, o.created_by, \
     o.verified_by, o.created_at, o.updated_at, o.published_at, o.version";

pub struct SqliteOpportunityRepo {
    pool: SqlitePool,
}

impl SqliteOpportunityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_opportunity(
        row: &sqlx::sqlite::SqliteRow,
        tags: Vec<Uuid>,
    ) -> DbResult<Opportunity> {
        let opportunity_type: String = row.get("opportunity_type");

        Ok(Opportunity {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            title: row.get("title"),
            description: row.get("description"),
            opportunity_type: parse_enum(
                &opportunity_type,
                "opportunity_type",
                OpportunityType::from_str,
            )?,
            company_id: parse_opt_uuid(row.get("company_id"))?,
            application_deadline: row.get("application_deadline"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            location: row.get("location"),
            is_remote: row.get("is_remote"),
            compensation: row.get("compensation"),
            requirements: row.get("requirements"),
            application_link: row.get("application_link"),
            contact_email: row.get("contact_email"),
            visibility: row.get("visibility"),
            verified: row.get("verified"),
            created_by: parse_uuid(&row.get::<String, _>("created_by"))?,
            verified_by: parse_opt_uuid(row.get("verified_by"))?,
            tags,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            published_at: row.get("published_at"),
            version: row.get("version"),
        })
    }

    fn parse_rows(
        rows: &[sqlx::sqlite::SqliteRow],
        mut tags: HashMap<Uuid, Vec<Uuid>>,
    ) -> DbResult<Vec<Opportunity>> {
        rows.iter()
            .map(|row| {
                let id = parse_uuid(&row.get::<String, _>("id"))?;
                Self::parse_opportunity(row, tags.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    fn map_write(err: sqlx::Error, company_id: Option<Uuid>) -> DbError {
        let missing = match company_id {
            Some(id) => format!("Company {id} does not exist"),
            None => "Referenced record does not exist".to_string(),
        };
        DbError::from_write(err, "Opportunity already exists", &missing)
    }

    async fn set_saved(&self, id: Uuid, account_id: Uuid) -> DbResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO opportunity_saves (opportunity_id, account_id, saved_at) VALUES (?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(account_id.to_string())
        .bind(truncate_to_millis(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DbError::NotFound
            }
            _ => DbError::from(e),
        })?;
        Ok(())
    }
}

#[async_trait]
impl OpportunityRepo for SqliteOpportunityRepo {
    async fn create(&self, created_by: Uuid, input: CreateOpportunity) -> DbResult<Opportunity> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(Utc::now());
        let tags = normalize_tags(input.tags);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO opportunities (
                id, title, description, opportunity_type, company_id, application_deadline,
                start_date, end_date, location, is_remote, compensation, requirements,
                application_link, contact_email, visibility, verified, created_by,
                verified_by, created_at, updated_at, published_at, version
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, NULL, ?, ?, NULL, 1)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.opportunity_type.as_str())
        .bind(input.company_id.map(|c| c.to_string()))
        .bind(input.application_deadline)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.location)
        .bind(input.is_remote)
        .bind(&input.compensation)
        .bind(&input.requirements)
        .bind(&input.application_link)
        .bind(&input.contact_email)
        .bind(input.visibility)
        .bind(created_by.to_string())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_write(e, input.company_id))?;

        OPPORTUNITY_TAGS.replace(&mut *tx, id, &tags).await?;

        tx.commit().await?;

        Ok(Opportunity {
            id,
            title: input.title,
            description: input.description,
            opportunity_type: input.opportunity_type,
            company_id: input.company_id,
            application_deadline: input.application_deadline,
            start_date: input.start_date,
            end_date: input.end_date,
            location: input.location,
            is_remote: input.is_remote,
            compensation: input.compensation,
            requirements: input.requirements,
            application_link: input.application_link,
            contact_email: input.contact_email,
            visibility: input.visibility,
            verified: false,
            created_by,
            verified_by: None,
            tags,
            created_at: now,
            updated_at: now,
            published_at: None,
            version: 1,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Opportunity>> {
        let row = sqlx::query(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities o WHERE o.id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut tags = OPPORTUNITY_TAGS.load(&self.pool, &[id]).await?;
        Ok(Some(Self::parse_opportunity(
            &row,
            tags.remove(&id).unwrap_or_default(),
        )?))
    }

    async fn list(
        &self,
        filter: &OpportunityFilter,
        params: ListParams,
    ) -> DbResult<ListResult<Opportunity>> {
        let limit = params.effective_limit();
        let (comparison, order) = params.direction.keyset_sql();

        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let VisibilityScope::PublicOr(reader) = filter.scope {
            conditions.push("((o.visibility = 1 AND o.verified = 1) OR o.created_by = ?)".into());
            binds.push(reader.to_string());
        }
        if let Some(created_by) = filter.created_by {
            conditions.push("o.created_by = ?".into());
            binds.push(created_by.to_string());
        }
        if let Some(saved_by) = filter.saved_by {
            conditions.push(
                "EXISTS (SELECT 1 FROM opportunity_saves s WHERE s.opportunity_id = o.id AND s.account_id = ?)"
                    .into(),
            );
            binds.push(saved_by.to_string());
        }
        if let Some(verified) = filter.verified {
            conditions.push(format!("o.verified = {}", i32::from(verified)));
        }
        if let Some(opportunity_type) = filter.opportunity_type {
            conditions.push("o.opportunity_type = ?".into());
            binds.push(opportunity_type.as_str().to_string());
        }
        if let Some(slug) = &filter.company_slug {
            conditions.push("o.company_id IN (SELECT id FROM companies WHERE slug = ?)".into());
            binds.push(slug.clone());
        }
        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            conditions.push("(LOWER(o.title) LIKE ? OR LOWER(o.description) LIKE ?)".into());
            let pattern = format!("%{}%", search.to_lowercase());
            binds.push(pattern.clone());
            binds.push(pattern);
        }
        if !filter.tag_ids.is_empty() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM opportunity_tags ot WHERE ot.opportunity_id = o.id AND ot.tag_id IN ({}))",
                placeholders(filter.tag_ids.len())
            ));
            binds.extend(filter.tag_ids.iter().map(Uuid::to_string));
        }
        if params.cursor.is_some() {
            conditions.push(format!("(o.created_at, o.id) {comparison} (?, ?)"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities o {where_clause} \
             ORDER BY o.created_at {order}, o.id {order} LIMIT ?"
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

        let ids = rows
            .iter()
            .map(|row| parse_uuid(&row.get::<String, _>("id")))
            .collect::<DbResult<Vec<_>>>()?;
        let tags = OPPORTUNITY_TAGS.load(&self.pool, &ids).await?;
        let items = Self::parse_rows(&rows, tags)?;

        Ok(ListResult::from_lookahead(items, &params, |o| {
            cursor_from_row(o.created_at, o.id)
        }))
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateOpportunity,
        guard: WriteGuard,
    ) -> DbResult<Opportunity> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {OPPORTUNITY_COLUMNS} FROM opportunities o WHERE o.id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(DbError::NotFound);
        };
        let mut tags = OPPORTUNITY_TAGS.load(&mut *tx, &[id]).await?;
        let mut opportunity =
            Self::parse_opportunity(&row, tags.remove(&id).unwrap_or_default())?;

        if opportunity.version != guard.expected_version {
            return Err(DbError::Conflict(
                "Opportunity was modified concurrently. Please refresh and try again.".into(),
            ));
        }

        let now = truncate_to_millis(Utc::now());

        if let Some(title) = input.title {
            opportunity.title = title;
        }
        if let Some(description) = input.description {
            opportunity.description = description;
        }
        if let Some(opportunity_type) = input.opportunity_type {
            opportunity.opportunity_type = opportunity_type;
        }
        if let Some(company_id) = input.company_id {
            opportunity.company_id = company_id;
        }
        if let Some(application_deadline) = input.application_deadline {
            opportunity.application_deadline = application_deadline;
        }
        if let Some(start_date) = input.start_date {
            opportunity.start_date = start_date;
        }
        if let Some(end_date) = input.end_date {
            opportunity.end_date = end_date;
        }
        if let Some(location) = input.location {
            opportunity.location = location;
        }
        if let Some(is_remote) = input.is_remote {
            opportunity.is_remote = is_remote;
        }
        if let Some(compensation) = input.compensation {
            opportunity.compensation = compensation;
        }
        if let Some(requirements) = input.requirements {
            opportunity.requirements = requirements;
        }
        if let Some(application_link) = input.application_link {
            opportunity.application_link = application_link;
        }
        if let Some(contact_email) = input.contact_email {
            opportunity.contact_email = contact_email;
        }
        if let Some(visibility) = input.visibility {
            opportunity.visibility = visibility;
        }
        if let Some(verified) = input.verified {
            match (opportunity.verified, verified) {
                (false, true) => {
                    opportunity.verified_by = Some(guard.actor_id);
                    opportunity.published_at.get_or_insert(now);
                }
                (true, false) => opportunity.verified_by = None,
                _ => {}
            }
            opportunity.verified = verified;
        }

        let original_version = opportunity.version;
        opportunity.version += 1;
        opportunity.updated_at = now;

        let result = sqlx::query(
            r#"
            UPDATE opportunities
            SET title = ?, description = ?, opportunity_type = ?, company_id = ?,
                application_deadline = ?, start_date = ?, end_date = ?, location = ?,
                is_remote = ?, compensation = ?, requirements = ?, application_link = ?,
                contact_email = ?, visibility = ?, verified = ?, verified_by = ?,
                published_at = ?, version = ?, updated_at = ?
            WHERE id = ? AND version = ?
              AND EXISTS (
                  SELECT 1 FROM accounts a
                  WHERE a.id = ? AND a.role = ? AND a.is_active = 1
              )
            "#,
        )
        .bind(&opportunity.title)
        .bind(&opportunity.description)
        .bind(opportunity.opportunity_type.as_str())
        .bind(opportunity.company_id.map(|c| c.to_string()))
        .bind(opportunity.application_deadline)
        .bind(opportunity.start_date)
        .bind(opportunity.end_date)
        .bind(&opportunity.location)
        .bind(opportunity.is_remote)
        .bind(&opportunity.compensation)
        .bind(&opportunity.requirements)
        .bind(&opportunity.application_link)
        .bind(&opportunity.contact_email)
        .bind(opportunity.visibility)
        .bind(opportunity.verified)
        .bind(opportunity.verified_by.map(|v| v.to_string()))
        .bind(opportunity.published_at)
        .bind(opportunity.version)
        .bind(opportunity.updated_at)
        .bind(id.to_string())
        .bind(original_version)
        .bind(guard.actor_id.to_string())
        .bind(guard.actor_role.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_write(e, opportunity.company_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::Conflict(
                "Opportunity was modified concurrently or the acting account's role changed. \
                 Please refresh and try again."
                    .into(),
            ));
        }

        if let Some(new_tags) = input.tags {
            opportunity.tags = normalize_tags(new_tags);
            OPPORTUNITY_TAGS
                .replace(&mut *tx, id, &opportunity.tags)
                .await?;
        }

        tx.commit().await?;

        Ok(opportunity)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM opportunities WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn save(&self, id: Uuid, account_id: Uuid) -> DbResult<()> {
        self.set_saved(id, account_id).await
    }

    async fn unsave(&self, id: Uuid, account_id: Uuid) -> DbResult<()> {
        sqlx::query("DELETE FROM opportunity_saves WHERE opportunity_id = ? AND account_id = ?")
            .bind(id.to_string())
            .bind(account_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn toggle_save(&self, id: Uuid, account_id: Uuid) -> DbResult<SaveState> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM opportunity_saves WHERE opportunity_id = ? AND account_id = ?",
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
                "INSERT INTO opportunity_saves (opportunity_id, account_id, saved_at) VALUES (?, ?, ?)",
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
