use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult, VisibilityScope, WriteGuard};
use crate::{
    db::error::DbResult,
    models::{CreateExperience, Experience, SaveState, UpdateExperience},
};

/// Narrowing applied to an experience listing on top of the visibility scope.
#[derive(Debug, Clone)]
pub struct ExperienceFilter {
    pub scope: VisibilityScope,
    pub author_id: Option<Uuid>,
    /// Only records saved by this account
    pub saved_by: Option<Uuid>,
    pub verified: Option<bool>,
    pub company_id: Option<Uuid>,
    /// Records carrying at least one of these tags; empty means no narrowing
    pub tag_ids: Vec<Uuid>,
}

impl ExperienceFilter {
    pub fn new(scope: VisibilityScope) -> Self {
        Self {
            scope,
            author_id: None,
            saved_by: None,
            verified: None,
            company_id: None,
            tag_ids: Vec::new(),
        }
    }
}

#[async_trait]
pub trait ExperienceRepo: Send + Sync {
    /// Insert with `author_id` as author, unverified, at version 1.
    async fn create(&self, author_id: Uuid, input: CreateExperience) -> DbResult<Experience>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Experience>>;
    async fn list(
        &self,
        filter: &ExperienceFilter,
        params: ListParams,
    ) -> DbResult<ListResult<Experience>>;
    /// Apply a patch that has already passed the authorization policy.
    ///
    /// Runs in one transaction that re-checks the guard; a stale version or a
    /// changed actor role yields `DbError::Conflict` and nothing is written.
    async fn update(
        &self,
        id: Uuid,
        input: UpdateExperience,
        guard: WriteGuard,
    ) -> DbResult<Experience>;
    async fn delete(&self, id: Uuid) -> DbResult<()>;
    /// Flip saved-by membership of `account_id` atomically.
    async fn toggle_save(&self, id: Uuid, account_id: Uuid) -> DbResult<SaveState>;
}
