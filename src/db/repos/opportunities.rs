use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult, VisibilityScope, WriteGuard};
use crate::{
    db::error::DbResult,
    models::{CreateOpportunity, Opportunity, OpportunityType, SaveState, UpdateOpportunity},
};

#[derive(Debug, Clone)]
pub struct OpportunityFilter {
    pub scope: VisibilityScope,
    pub created_by: Option<Uuid>,
    pub saved_by: Option<Uuid>,
    pub verified: Option<bool>,
    pub opportunity_type: Option<OpportunityType>,
    pub company_slug: Option<String>,
    /// Case-insensitive substring of title or description
    pub search: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

impl OpportunityFilter {
    pub fn new(scope: VisibilityScope) -> Self {
        Self {
            scope,
            created_by: None,
            saved_by: None,
            verified: None,
            opportunity_type: None,
            company_slug: None,
            search: None,
            tag_ids: Vec::new(),
        }
    }
}

#[async_trait]
pub trait OpportunityRepo: Send + Sync {
    async fn create(&self, created_by: Uuid, input: CreateOpportunity) -> DbResult<Opportunity>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Opportunity>>;
    async fn list(
        &self,
        filter: &OpportunityFilter,
        params: ListParams,
    ) -> DbResult<ListResult<Opportunity>>;
    /// Guarded update, see [`super::ExperienceRepo::update`]. Verifying
    /// records the guard's actor as verifier and stamps `published_at` the
    /// first time.
    async fn update(
        &self,
        id: Uuid,
        input: UpdateOpportunity,
        guard: WriteGuard,
    ) -> DbResult<Opportunity>;
    async fn delete(&self, id: Uuid) -> DbResult<()>;
    /// Add to saved set; no-op when already saved.
    async fn save(&self, id: Uuid, account_id: Uuid) -> DbResult<()>;
    /// Remove from saved set; no-op when not saved.
    async fn unsave(&self, id: Uuid, account_id: Uuid) -> DbResult<()>;
    async fn toggle_save(&self, id: Uuid, account_id: Uuid) -> DbResult<SaveState>;
}
