use std::sync::Arc;

use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::{
    authz::{Actor, STAFF},
    db::{DbPool, DbResult},
    models::{CreateTag, CreateTagType, Tag, TagType, UpdateTag, UpdateTagType},
};

/// Tags and their categories.
#[derive(Clone)]
pub struct TagService {
    db: Arc<DbPool>,
}

impl TagService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    // ========================================================================
    // Tag types
    // ========================================================================

    pub async fn list_types(&self) -> DbResult<Vec<TagType>> {
        self.db.tag_types().list().await
    }

    pub async fn get_type(&self, id: Uuid) -> ServiceResult<TagType> {
        self.db
            .tag_types()
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Tag type"))
    }

    pub async fn create_type(&self, actor: &Actor, input: CreateTagType) -> ServiceResult<TagType> {
        STAFF.require(actor)?;
        Ok(self.db.tag_types().create(input.name.trim()).await?)
    }

    pub async fn rename_type(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateTagType,
    ) -> ServiceResult<TagType> {
        STAFF.require(actor)?;
        Ok(self.db.tag_types().rename(id, input.name.trim()).await?)
    }

    /// Delete a tag type. Its tags are kept and detached.
    pub async fn delete_type(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        STAFF.require(actor)?;
        Ok(self.db.tag_types().delete(id).await?)
    }

    /// Tags belonging to one type.
    pub async fn list_by_type(&self, type_id: Uuid) -> ServiceResult<Vec<Tag>> {
        self.get_type(type_id).await?;
        Ok(self.db.tags().list_by_type(type_id).await?)
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub async fn list(&self) -> DbResult<Vec<Tag>> {
        self.db.tags().list().await
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Tag> {
        self.db
            .tags()
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Tag"))
    }

    pub async fn create(&self, actor: &Actor, input: CreateTag) -> ServiceResult<Tag> {
        STAFF.require(actor)?;
        Ok(self.db.tags().create(input).await?)
    }

    pub async fn update(&self, actor: &Actor, id: Uuid, input: UpdateTag) -> ServiceResult<Tag> {
        STAFF.require(actor)?;
        Ok(self.db.tags().update(id, input).await?)
    }

    /// Delete a tag, removing it from every experience and opportunity.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        STAFF.require(actor)?;
        Ok(self.db.tags().delete(id).await?)
    }
}
