use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Row, SqlitePool};

use super::common::parse_uuid;
use crate::{
    db::{error::DbResult, repos::AnalyticsRepo},
    models::{
        CompanyAnalytics, CompanyCount, ContentTypes, DASHBOARD_TOP_COMPANIES, DashboardAnalytics,
        ExperienceAnalytics, GroupCount, MonthCount, NotificationStats, OpportunityAnalytics,
        Overview, RECENT_WINDOW_DAYS, RecentActivity, TOP_COMPANIES, TOP_DEPARTMENTS,
        TREND_WINDOW_DAYS, TopCompanies, Trends, UserStats, VerificationStats, percentage,
    },
};

/// Content tables that can be ranked per company.
#[derive(Clone, Copy)]
enum CompanyContent {
    Experiences,
    Opportunities,
}

impl CompanyContent {
    fn table(self) -> &'static str {
        match self {
            CompanyContent::Experiences => "experiences",
            CompanyContent::Opportunities => "opportunities",
        }
    }

    /// Column that dates a record for trend buckets.
    fn timestamp_column(self) -> &'static str {
        match self {
            CompanyContent::Experiences => "published_at",
            CompanyContent::Opportunities => "created_at",
        }
    }
}

pub struct SqliteAnalyticsRepo {
    pool: SqlitePool,
}

impl SqliteAnalyticsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str) -> DbResult<i64> {
        let row = sqlx::query(sql).fetch_one(&self.pool).await?;
        Ok(row.get::<i64, _>(0))
    }

    async fn count_since(&self, table: &str, column: &str, since: DateTime<Utc>) -> DbResult<i64> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} >= ?"
        ))
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>(0))
    }

    /// Grouped counts over a text column, largest first, ties by key.
    async fn group_counts(
        &self,
        table: &str,
        column: &str,
        skip_empty: bool,
        limit: Option<i64>,
    ) -> DbResult<Vec<GroupCount>> {
        let where_clause = if skip_empty {
            format!("WHERE {column} IS NOT NULL AND {column} <> ''")
        } else {
            String::new()
        };
        let limit_clause = limit.map(|n| format!("LIMIT {n}")).unwrap_or_default();
        let sql = format!(
            "SELECT {column} AS key, COUNT(*) AS count FROM {table} {where_clause} \
             GROUP BY {column} ORDER BY count DESC, key ASC {limit_clause}"
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| GroupCount {
                key: row.get("key"),
                count: row.get("count"),
            })
            .collect())
    }

    /// `YYYY-MM` buckets since `since`, oldest month first.
    async fn month_counts(
        &self,
        content: CompanyContent,
        since: DateTime<Utc>,
    ) -> DbResult<Vec<MonthCount>> {
        let column = content.timestamp_column();
        let sql = format!(
            "SELECT substr({column}, 1, 7) AS month, COUNT(*) AS count FROM {table} \
             WHERE {column} >= ? GROUP BY month ORDER BY month ASC",
            table = content.table(),
        );

        let rows = sqlx::query(&sql).bind(since).fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| MonthCount {
                month: row.get("month"),
                count: row.get("count"),
            })
            .collect())
    }

    /// Companies ranked by related record count. Companies without any
    /// related record are left out.
    async fn top_companies(
        &self,
        content: CompanyContent,
        limit: i64,
    ) -> DbResult<Vec<CompanyCount>> {
        let sql = format!(
            "SELECT c.id, c.name, c.slug, COUNT(r.id) AS count \
             FROM companies c JOIN {table} r ON r.company_id = c.id \
             GROUP BY c.id, c.name, c.slug \
             ORDER BY count DESC, c.name ASC LIMIT ?",
            table = content.table(),
        );

        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(CompanyCount {
                    id: parse_uuid(&row.get::<String, _>("id"))?,
                    name: row.get("name"),
                    slug: row.get("slug"),
                    count: row.get("count"),
                })
            })
            .collect()
    }

    /// `(total, verified)` for a verifiable content table.
    async fn verification_counts(&self, content: CompanyContent) -> DbResult<(i64, i64)> {
        let row = sqlx::query(&format!(
            "SELECT COUNT(*) AS total, COALESCE(SUM(verified), 0) AS verified FROM {}",
            content.table()
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok((row.get("total"), row.get("verified")))
    }
}

#[async_trait]
impl AnalyticsRepo for SqliteAnalyticsRepo {
    async fn dashboard(&self, now: DateTime<Utc>) -> DbResult<DashboardAnalytics> {
        let recent_since = now - Duration::days(RECENT_WINDOW_DAYS);
        let trend_since = now - Duration::days(TREND_WINDOW_DAYS);

        let (total_experiences, verified_experiences) =
            self.verification_counts(CompanyContent::Experiences).await?;
        let (total_opportunities, verified_opportunities) =
            self.verification_counts(CompanyContent::Opportunities).await?;

        let overview = Overview {
            total_users: self.count("SELECT COUNT(*) FROM accounts").await?,
            total_companies: self.count("SELECT COUNT(*) FROM companies").await?,
            total_experiences,
            total_opportunities,
            total_notifications: self.count("SELECT COUNT(*) FROM notifications").await?,
            total_tags: self.count("SELECT COUNT(*) FROM tags").await?,
        };

        let verification = VerificationStats {
            verified_experiences,
            pending_experiences: total_experiences - verified_experiences,
            verified_opportunities,
            pending_opportunities: total_opportunities - verified_opportunities,
            experience_verification_rate: percentage(verified_experiences, total_experiences),
            opportunity_verification_rate: percentage(
                verified_opportunities,
                total_opportunities,
            ),
        };

        let user_stats = UserStats {
            user_roles: self.group_counts("accounts", "role", false, None).await?,
            department_distribution: self
                .group_counts("accounts", "department", true, Some(TOP_DEPARTMENTS))
                .await?,
            programme_distribution: self
                .group_counts("accounts", "programme", true, None)
                .await?,
        };

        let activity = RecentActivity {
            recent_experiences: self
                .count_since("experiences", "published_at", recent_since)
                .await?,
            recent_opportunities: self
                .count_since("opportunities", "created_at", recent_since)
                .await?,
            recent_users: self
                .count_since("accounts", "created_at", recent_since)
                .await?,
        };

        let companies = TopCompanies {
            top_by_experiences: self
                .top_companies(CompanyContent::Experiences, DASHBOARD_TOP_COMPANIES)
                .await?,
            top_by_opportunities: self
                .top_companies(CompanyContent::Opportunities, DASHBOARD_TOP_COMPANIES)
                .await?,
        };

        let trends = Trends {
            experiences_by_month: self
                .month_counts(CompanyContent::Experiences, trend_since)
                .await?,
            opportunities_by_month: self
                .month_counts(CompanyContent::Opportunities, trend_since)
                .await?,
        };

        let content_types = ContentTypes {
            job_types: self
                .group_counts("experiences", "job_type", false, None)
                .await?,
            opportunity_types: self
                .group_counts("opportunities", "opportunity_type", false, None)
                .await?,
        };

        let notifications = NotificationStats {
            unread_count: self
                .count("SELECT COUNT(*) FROM notifications WHERE is_read = 0")
                .await?,
            types: self
                .group_counts("notifications", "notification_type", false, None)
                .await?,
        };

        Ok(DashboardAnalytics {
            overview,
            verification,
            user_stats,
            activity,
            companies,
            trends,
            content_types,
            notifications,
        })
    }

    async fn experiences(&self, now: DateTime<Utc>) -> DbResult<ExperienceAnalytics> {
        let (total, verified) = self.verification_counts(CompanyContent::Experiences).await?;

        Ok(ExperienceAnalytics {
            total_experiences: total,
            verified_experiences: verified,
            pending_experiences: total - verified,
            verification_rate: percentage(verified, total),
            experiences_by_job_type: self
                .group_counts("experiences", "job_type", false, None)
                .await?,
            experiences_by_month: self
                .month_counts(
                    CompanyContent::Experiences,
                    now - Duration::days(TREND_WINDOW_DAYS),
                )
                .await?,
            experiences_by_company: self
                .top_companies(CompanyContent::Experiences, TOP_COMPANIES)
                .await?,
        })
    }

    async fn opportunities(&self, now: DateTime<Utc>) -> DbResult<OpportunityAnalytics> {
        let (total, verified) = self
            .verification_counts(CompanyContent::Opportunities)
            .await?;

        Ok(OpportunityAnalytics {
            total_opportunities: total,
            verified_opportunities: verified,
            pending_opportunities: total - verified,
            verification_rate: percentage(verified, total),
            opportunities_by_type: self
                .group_counts("opportunities", "opportunity_type", false, None)
                .await?,
            opportunities_by_month: self
                .month_counts(
                    CompanyContent::Opportunities,
                    now - Duration::days(TREND_WINDOW_DAYS),
                )
                .await?,
            opportunities_by_company: self
                .top_companies(CompanyContent::Opportunities, TOP_COMPANIES)
                .await?,
        })
    }

    async fn companies(&self) -> DbResult<CompanyAnalytics> {
        Ok(CompanyAnalytics {
            total_companies: self.count("SELECT COUNT(*) FROM companies").await?,
            companies_with_content: self
                .count(
                    "SELECT COUNT(*) FROM companies c \
                     WHERE EXISTS (SELECT 1 FROM experiences e WHERE e.company_id = c.id) \
                        OR EXISTS (SELECT 1 FROM opportunities o WHERE o.company_id = c.id)",
                )
                .await?,
            top_by_experiences: self
                .top_companies(CompanyContent::Experiences, TOP_COMPANIES)
                .await?,
            top_by_opportunities: self
                .top_companies(CompanyContent::Opportunities, TOP_COMPANIES)
                .await?,
        })
    }
}
