use std::sync::Arc;

use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::{
    authz::Actor,
    db::{DbPool, DbResult, ListParams, ListResult},
    models::{CreateMentorship, Mentorship, UpdateMentorship},
};

/// Mentorships are visible only to their mentor and mentee.
#[derive(Clone)]
pub struct MentorshipService {
    db: Arc<DbPool>,
}

impl MentorshipService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Request a mentorship with the actor as mentee.
    pub async fn create(&self, actor: &Actor, input: CreateMentorship) -> DbResult<Mentorship> {
        self.db.mentorships().create(actor.id, input).await
    }

    pub async fn list(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> DbResult<ListResult<Mentorship>> {
        self.db
            .mentorships()
            .list_for_participant(actor.id, params)
            .await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ServiceResult<Mentorship> {
        self.db
            .mentorships()
            .get_by_id(id)
            .await?
            .filter(|m| m.is_participant(actor.id))
            .ok_or(ServiceError::NotFound("Mentorship"))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateMentorship,
    ) -> ServiceResult<Mentorship> {
        self.get(actor, id).await?;
        Ok(self.db.mentorships().update(id, input).await?)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        self.get(actor, id).await?;
        Ok(self.db.mentorships().delete(id).await?)
    }
}
