use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateTag, Tag, TagType, UpdateTag},
};

#[async_trait]
pub trait TagTypeRepo: Send + Sync {
    async fn create(&self, name: &str) -> DbResult<TagType>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<TagType>>;
    /// All tag types ordered by name.
    async fn list(&self) -> DbResult<Vec<TagType>>;
    async fn rename(&self, id: Uuid, name: &str) -> DbResult<TagType>;
    /// Deletes the type; tags of this type are kept with no type.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait TagRepo: Send + Sync {
    async fn create(&self, input: CreateTag) -> DbResult<Tag>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Tag>>;
    /// All tags ordered by title.
    async fn list(&self) -> DbResult<Vec<Tag>>;
    async fn list_by_type(&self, type_id: Uuid) -> DbResult<Vec<Tag>>;
    async fn update(&self, id: Uuid, input: UpdateTag) -> DbResult<Tag>;
    /// Deletes the tag and removes it from every record.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
