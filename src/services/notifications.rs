use std::sync::Arc;

use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::{
    authz::{Actor, MODERATORS},
    db::{DbPool, DbResult, ListParams, ListResult},
    models::{CreateNotification, Notification},
};

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Send a notification to any account. Moderators only.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateNotification,
    ) -> ServiceResult<Notification> {
        MODERATORS.require(actor)?;
        let notification = self.db.notifications().create(input).await?;
        tracing::debug!(
            notification_id = %notification.id,
            recipient = %notification.user_id,
            "Notification created"
        );
        Ok(notification)
    }

    /// The actor's notifications, newest first.
    pub async fn list(
        &self,
        actor: &Actor,
        params: ListParams,
    ) -> DbResult<ListResult<Notification>> {
        self.db.notifications().list_for_user(actor.id, params).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> ServiceResult<Notification> {
        self.db
            .notifications()
            .get_by_id(id)
            .await?
            .filter(|n| n.user_id == actor.id)
            .ok_or(ServiceError::NotFound("Notification"))
    }

    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> ServiceResult<Notification> {
        self.get(actor, id).await?;
        Ok(self.db.notifications().mark_read(id).await?)
    }

    /// Returns how many notifications changed state.
    pub async fn mark_all_read(&self, actor: &Actor) -> DbResult<u64> {
        self.db.notifications().mark_all_read(actor.id).await
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        self.get(actor, id).await?;
        Ok(self.db.notifications().delete(id).await?)
    }
}
