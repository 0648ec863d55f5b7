use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::{
    authz::{Actor, MODERATORS, RecordPolicy},
    db::{DbPool, DbResult, ExperienceFilter, ListParams, ListResult, VisibilityScope},
    models::{CreateExperience, Experience, ExperienceAnalytics, SaveState, UpdateExperience},
};

const POLICY: &RecordPolicy = &RecordPolicy::EXPERIENCE;

/// Interview and placement write-ups, gated by the experience policy.
#[derive(Clone)]
pub struct ExperienceService {
    db: Arc<DbPool>,
}

impl ExperienceService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create with the actor as author. The record starts unverified.
    pub async fn create(&self, actor: &Actor, input: CreateExperience) -> DbResult<Experience> {
        self.db.experiences().create(actor.id, input).await
    }

    /// Fetch a record the actor may see.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> ServiceResult<Experience> {
        self.db
            .experiences()
            .get_by_id(id)
            .await?
            .filter(|e| POLICY.can_view(actor, e))
            .ok_or(ServiceError::NotFound("Experience"))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        company_id: Option<Uuid>,
        tag_ids: Vec<Uuid>,
        params: ListParams,
    ) -> DbResult<ListResult<Experience>> {
        let filter = ExperienceFilter {
            company_id,
            tag_ids,
            ..ExperienceFilter::new(POLICY.visibility_scope(actor))
        };
        self.db.experiences().list(&filter, params).await
    }

    /// The actor's own records, whatever their state.
    pub async fn list_own(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> DbResult<ListResult<Experience>> {
        let filter = ExperienceFilter {
            author_id: Some(actor.id),
            ..ExperienceFilter::new(VisibilityScope::PublicOr(actor.id))
        };
        self.db.experiences().list(&filter, params).await
    }

    /// Records the actor saved that are still visible to them.
    pub async fn list_saved(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> DbResult<ListResult<Experience>> {
        let filter = ExperienceFilter {
            saved_by: Some(actor.id),
            ..ExperienceFilter::new(POLICY.visibility_scope(actor))
        };
        self.db.experiences().list(&filter, params).await
    }

    /// Moderation queue.
    pub async fn list_unverified(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> ServiceResult<ListResult<Experience>> {
        POLICY.authorize_verify(actor)?;
        let filter = ExperienceFilter {
            verified: Some(false),
            ..ExperienceFilter::new(VisibilityScope::All)
        };
        Ok(self.db.experiences().list(&filter, params).await?)
    }

    /// Visible records about one company.
    pub async fn list_for_company(
        &self,
        actor: &Actor,
        company_id: Uuid,
        params: ListParams,
    ) -> ServiceResult<ListResult<Experience>> {
        if self.db.companies().get_by_id(company_id).await?.is_none() {
            return Err(ServiceError::NotFound("Company"));
        }
        Ok(self
            .list(actor, Some(company_id), Vec::new(), params)
            .await?)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        mut patch: UpdateExperience,
    ) -> ServiceResult<Experience> {
        let record = self.get(actor, id).await?;
        let guard = POLICY.authorize_update(actor, &record, &mut patch)?;
        Ok(self.db.experiences().update(id, patch, guard).await?)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let record = self.get(actor, id).await?;
        POLICY.authorize_delete(actor, &record)?;
        self.db.experiences().delete(id).await?;
        tracing::info!(experience_id = %id, actor_id = %actor.id, "Experience deleted");
        Ok(())
    }

    pub async fn toggle_save(&self, actor: &Actor, id: Uuid) -> ServiceResult<SaveState> {
        self.get(actor, id).await?;
        Ok(self.db.experiences().toggle_save(id, actor.id).await?)
    }

    /// Mark a record verified. Moderators may address unverified records here.
    pub async fn verify(&self, actor: &Actor, id: Uuid) -> ServiceResult<Experience> {
        POLICY.authorize_verify(actor)?;
        let record = self
            .db
            .experiences()
            .get_by_id(id)
            .await?
            .filter(|e| POLICY.can_address_for_verify(actor, e))
            .ok_or(ServiceError::NotFound("Experience"))?;

        let mut patch = UpdateExperience {
            verified: Some(true),
            ..Default::default()
        };
        let guard = POLICY.authorize_update(actor, &record, &mut patch)?;
        Ok(self.db.experiences().update(id, patch, guard).await?)
    }

    pub async fn analytics(&self, actor: &Actor) -> ServiceResult<ExperienceAnalytics> {
        MODERATORS.require(actor)?;
        Ok(self.db.analytics().experiences(Utc::now()).await?)
    }
}
