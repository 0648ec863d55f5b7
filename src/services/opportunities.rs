use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::{
    authz::{Actor, MODERATORS, RecordPolicy},
    db::{DbPool, DbResult, ListParams, ListResult, OpportunityFilter, VisibilityScope},
    models::{
        CreateOpportunity, Opportunity, OpportunityAnalytics, OpportunityType, SaveState,
        UpdateOpportunity,
    },
};

const POLICY: &RecordPolicy = &RecordPolicy::OPPORTUNITY;

/// Narrowing a caller may apply to the visible opportunity list.
#[derive(Debug, Clone, Default)]
pub struct OpportunitySearch {
    pub opportunity_type: Option<OpportunityType>,
    pub company_slug: Option<String>,
    pub search: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct OpportunityService {
    db: Arc<DbPool>,
}

impl OpportunityService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn create(&self, actor: &Actor, input: CreateOpportunity) -> DbResult<Opportunity> {
        self.db.opportunities().create(actor.id, input).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ServiceResult<Opportunity> {
        self.db
            .opportunities()
            .get_by_id(id)
            .await?
            .filter(|o| POLICY.can_view(actor, o))
            .ok_or(ServiceError::NotFound("Opportunity"))
    }

    /// Visible opportunities, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        search: OpportunitySearch,
        params: ListParams,
    ) -> DbResult<ListResult<Opportunity>> {
        let filter = OpportunityFilter {
            opportunity_type: search.opportunity_type,
            company_slug: search.company_slug,
            search: search.search.filter(|s| !s.trim().is_empty()),
            tag_ids: search.tag_ids,
            ..OpportunityFilter::new(POLICY.visibility_scope(actor))
        };
        self.db.opportunities().list(&filter, params).await
    }

    pub async fn list_saved(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> DbResult<ListResult<Opportunity>> {
        let filter = OpportunityFilter {
            saved_by: Some(actor.id),
            ..OpportunityFilter::new(POLICY.visibility_scope(actor))
        };
        self.db.opportunities().list(&filter, params).await
    }

    pub async fn list_unverified(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> ServiceResult<ListResult<Opportunity>> {
        POLICY.authorize_verify(actor)?;
        let filter = OpportunityFilter {
            verified: Some(false),
            ..OpportunityFilter::new(VisibilityScope::All)
        };
        Ok(self.db.opportunities().list(&filter, params).await?)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        mut patch: UpdateOpportunity,
    ) -> ServiceResult<Opportunity> {
        patch.validate_nested().map_err(ServiceError::Validation)?;
        let record = self.get(actor, id).await?;
        let guard = POLICY.authorize_update(actor, &record, &mut patch)?;
        Ok(self.db.opportunities().update(id, patch, guard).await?)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        let record = self.get(actor, id).await?;
        POLICY.authorize_delete(actor, &record)?;
        self.db.opportunities().delete(id).await?;
        tracing::info!(opportunity_id = %id, actor_id = %actor.id, "Opportunity deleted");
        Ok(())
    }

    /// Verify and record the actor as verifier.
    pub async fn verify(&self, actor: &Actor, id: Uuid) -> ServiceResult<Opportunity> {
        POLICY.authorize_verify(actor)?;
        let record = self
            .db
            .opportunities()
            .get_by_id(id)
            .await?
            .filter(|o| POLICY.can_address_for_verify(actor, o))
            .ok_or(ServiceError::NotFound("Opportunity"))?;

        let mut patch = UpdateOpportunity {
            verified: Some(true),
            ..Default::default()
        };
        let guard = POLICY.authorize_update(actor, &record, &mut patch)?;
        Ok(self.db.opportunities().update(id, patch, guard).await?)
    }

    pub async fn save(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        self.get(actor, id).await?;
        Ok(self.db.opportunities().save(id, actor.id).await?)
    }

    pub async fn unsave(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        self.get(actor, id).await?;
        Ok(self.db.opportunities().unsave(id, actor.id).await?)
    }

    pub async fn toggle_save(&self, actor: &Actor, id: Uuid) -> ServiceResult<SaveState> {
        self.get(actor, id).await?;
        Ok(self.db.opportunities().toggle_save(id, actor.id).await?)
    }

    pub async fn analytics(&self, actor: &Actor) -> ServiceResult<OpportunityAnalytics> {
        MODERATORS.require(actor)?;
        Ok(self.db.analytics().opportunities(Utc::now()).await?)
    }
}
