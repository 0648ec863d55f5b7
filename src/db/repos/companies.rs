use async_trait::async_trait;
use uuid::Uuid;

use super::{ListParams, ListResult};
use crate::{
    db::error::DbResult,
    models::{Company, CreateCompany, UpdateCompany},
};

#[async_trait]
pub trait CompanyRepo: Send + Sync {
    async fn create(&self, input: CreateCompany, slug: &str) -> DbResult<Company>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Company>>;
    async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Company>>;
    async fn list(&self, params: ListParams) -> DbResult<ListResult<Company>>;
    /// `slug` is the re-derived slug when the name changes.
    async fn update(
        &self,
        id: Uuid,
        input: UpdateCompany,
        slug: Option<String>,
    ) -> DbResult<Company>;
    /// Deletes the company together with its experiences and opportunities.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
