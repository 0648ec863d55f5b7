use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult};
use crate::{
    db::error::DbResult,
    models::{CreateMentorship, Mentorship, UpdateMentorship},
};

#[async_trait]
pub trait MentorshipRepo: Send + Sync {
    async fn create(&self, mentee_id: Uuid, input: CreateMentorship) -> DbResult<Mentorship>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Mentorship>>;
    /// Mentorships where the account is mentor or mentee.
    async fn list_for_participant(
        &self,
        account_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<Mentorship>>;
    async fn update(&self, id: Uuid, input: UpdateMentorship) -> DbResult<Mentorship>;
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
