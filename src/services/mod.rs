mod accounts;
mod analytics;
mod companies;
mod error;
mod experiences;
mod mentorships;
mod notifications;
mod opportunities;
mod tags;


use std::sync::Arc;

pub use accounts::{AccountError, AccountService, Resolution};
pub use analytics::AnalyticsService;
pub use companies::CompanyService;
pub use error::{ServiceError, ServiceResult};
pub use experiences::ExperienceService;
pub use mentorships::MentorshipService;
pub use notifications::NotificationService;
pub use opportunities::{OpportunitySearch, OpportunityService};
pub use tags::TagService;

use crate::db::DbPool;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub companies: CompanyService,
    pub tags: TagService,
    pub experiences: ExperienceService,
    pub opportunities: OpportunityService,
    pub mentorships: MentorshipService,
    pub notifications: NotificationService,
    pub analytics: AnalyticsService,
}

impl Services {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            accounts: AccountService::new(db.clone()),
            companies: CompanyService::new(db.clone()),
            tags: TagService::new(db.clone()),
            experiences: ExperienceService::new(db.clone()),
            opportunities: OpportunityService::new(db.clone()),
            mentorships: MentorshipService::new(db.clone()),
            notifications: NotificationService::new(db.clone()),
            analytics: AnalyticsService::new(db),
        }
    }
}
