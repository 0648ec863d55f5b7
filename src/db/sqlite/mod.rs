mod accounts;
mod analytics;
mod common;
mod companies;
mod experiences;
mod mentorships;
mod notifications;
mod opportunities;
mod tags;

pub use accounts::SqliteAccountRepo;
pub use analytics::SqliteAnalyticsRepo;
pub use companies::SqliteCompanyRepo;
pub use experiences::SqliteExperienceRepo;
pub use mentorships::SqliteMentorshipRepo;
pub use notifications::SqliteNotificationRepo;
pub use opportunities::SqliteOpportunityRepo;
pub use tags::{SqliteTagRepo, SqliteTagTypeRepo};
