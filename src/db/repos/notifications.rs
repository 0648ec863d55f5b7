use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult};
use crate::{
    db::error::DbResult,
    models::{CreateNotification, Notification},
};

#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn create(&self, input: CreateNotification) -> DbResult<Notification>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Notification>>;
    /// Newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        params: ListParams,
    ) -> DbResult<ListResult<Notification>>;
    async fn mark_read(&self, id: Uuid) -> DbResult<Notification>;
    /// Returns the number of notifications that changed state.
    async fn mark_all_read(&self, user_id: Uuid) -> DbResult<u64>;
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
