use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::error::DbResult,
    models::{CompanyAnalytics, DashboardAnalytics, ExperienceAnalytics, OpportunityAnalytics},
};

/// Read-only aggregations. `now` anchors the trailing windows.
#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn dashboard(&self, now: DateTime<Utc>) -> DbResult<DashboardAnalytics>;
    async fn experiences(&self, now: DateTime<Utc>) -> DbResult<ExperienceAnalytics>;
    async fn opportunities(&self, now: DateTime<Utc>) -> DbResult<OpportunityAnalytics>;
    async fn companies(&self) -> DbResult<CompanyAnalytics>;
}
