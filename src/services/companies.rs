use std::sync::Arc;

use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::{
    authz::{Actor, MODERATORS, STAFF},
    db::{DbPool, ListParams, ListResult},
    models::{Company, CompanyAnalytics, CreateCompany, UpdateCompany, slugify},
};

/// Service layer for company operations. Reads are open to any account,
/// writes to staff.
#[derive(Clone)]
pub struct CompanyService {
    db: Arc<DbPool>,
}

impl CompanyService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Create a company; the slug is derived from the name.
    pub async fn create(&self, actor: &Actor, input: CreateCompany) -> ServiceResult<Company> {
        STAFF.require(actor)?;
        let slug = slugify(&input.name);
        Ok(self.db.companies().create(input, &slug).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Company> {
        self.db
            .companies()
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Company"))
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<ListResult<Company>> {
        Ok(self.db.companies().list(params).await?)
    }

    /// Update a company. Renaming re-derives the slug.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateCompany,
    ) -> ServiceResult<Company> {
        STAFF.require(actor)?;
        let slug = input.name.as_deref().map(slugify);
        Ok(self.db.companies().update(id, input, slug).await?)
    }

    /// Delete a company along with its experiences and opportunities.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> ServiceResult<()> {
        STAFF.require(actor)?;
        self.db.companies().delete(id).await?;
        tracing::info!(company_id = %id, actor_id = %actor.id, "Company deleted");
        Ok(())
    }

    pub async fn analytics(&self, actor: &Actor) -> ServiceResult<CompanyAnalytics> {
        MODERATORS.require(actor)?;
        Ok(self.db.analytics().companies().await?)
    }
}
