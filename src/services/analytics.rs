use std::sync::Arc;

use chrono::Utc;

use super::ServiceResult;
use crate::{
    authz::{Actor, MODERATORS},
    db::DbPool,
    models::DashboardAnalytics,
};

/// Dashboard aggregates. Windows are measured back from the time of the request.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DbPool>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self, actor: &Actor) -> ServiceResult<DashboardAnalytics> {
        MODERATORS.require(actor)?;
        Ok(self.db.analytics().dashboard(Utc::now()).await?)
    }
}
