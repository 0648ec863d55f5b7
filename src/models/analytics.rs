//! Aggregate views served by the analytics endpoints.
//!
//! All windows are measured back from the moment the request is served.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Window for "recent activity" counts, in days.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Window for monthly trend buckets, in days.
pub const TREND_WINDOW_DAYS: i64 = 180;

/// Entries returned by the top-N company rankings on the dashboard.
pub const DASHBOARD_TOP_COMPANIES: i64 = 5;

/// Entries returned by the per-kind analytics rankings.
pub const TOP_COMPANIES: i64 = 10;

/// Departments listed in the dashboard user stats.
pub const TOP_DEPARTMENTS: i64 = 10;

/// Percentage of `part` in `total`, rounded to two decimals. Zero when `total` is zero.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = part as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

/// Count grouped by a categorical value (role, department, job type, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

/// Count bucketed by calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCount {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardAnalytics {
    pub overview: Overview,
    pub verification: VerificationStats,
    pub user_stats: UserStats,
    pub activity: RecentActivity,
    pub companies: TopCompanies,
    pub trends: Trends,
    pub content_types: ContentTypes,
    pub notifications: NotificationStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub total_users: i64,
    pub total_companies: i64,
    pub total_experiences: i64,
    pub total_opportunities: i64,
    pub total_notifications: i64,
    pub total_tags: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationStats {
    pub verified_experiences: i64,
    pub pending_experiences: i64,
    pub verified_opportunities: i64,
    pub pending_opportunities: i64,
    pub experience_verification_rate: f64,
    pub opportunity_verification_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_roles: Vec<GroupCount>,
    /// Top departments, empty values excluded
    pub department_distribution: Vec<GroupCount>,
    pub programme_distribution: Vec<GroupCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivity {
    pub recent_experiences: i64,
    pub recent_opportunities: i64,
    pub recent_users: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopCompanies {
    pub top_by_experiences: Vec<CompanyCount>,
    pub top_by_opportunities: Vec<CompanyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trends {
    pub experiences_by_month: Vec<MonthCount>,
    pub opportunities_by_month: Vec<MonthCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTypes {
    pub job_types: Vec<GroupCount>,
    pub opportunity_types: Vec<GroupCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationStats {
    pub unread_count: i64,
    pub types: Vec<GroupCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceAnalytics {
    pub total_experiences: i64,
    pub verified_experiences: i64,
    pub pending_experiences: i64,
    pub verification_rate: f64,
    pub experiences_by_job_type: Vec<GroupCount>,
    pub experiences_by_month: Vec<MonthCount>,
    pub experiences_by_company: Vec<CompanyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityAnalytics {
    pub total_opportunities: i64,
    pub verified_opportunities: i64,
    pub pending_opportunities: i64,
    pub verification_rate: f64,
    pub opportunities_by_type: Vec<GroupCount>,
    pub opportunities_by_month: Vec<MonthCount>,
    pub opportunities_by_company: Vec<CompanyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAnalytics {
    pub total_companies: i64,
    /// Companies with at least one experience or opportunity
    pub companies_with_content: i64,
    pub top_by_experiences: Vec<CompanyCount>,
    pub top_by_opportunities: Vec<CompanyCount>,
}
