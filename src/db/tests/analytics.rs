//! Shared tests for AnalyticsRepo implementations

use chrono::{Duration, Utc};

use super::{
    harness::{RepoTestContext, experience_input},
    sqlite_test,
};
use crate::{
    db::repos::WriteGuard,
    models::{CreateNotification, JobType, NotificationType, Role, UpdateExperience},
};

pub async fn test_empty_database_has_zero_rates(ctx: &RepoTestContext) {
    let dashboard = ctx
        .db
        .analytics()
        .dashboard(Utc::now())
        .await
        .expect("Failed to compute dashboard");

    assert_eq!(dashboard.overview.total_users, 0);
    assert_eq!(dashboard.verification.experience_verification_rate, 0.0);
    assert_eq!(dashboard.verification.opportunity_verification_rate, 0.0);
    assert!(dashboard.companies.top_by_experiences.is_empty());
    assert!(dashboard.trends.experiences_by_month.is_empty());
}

pub async fn test_dashboard_counts(ctx: &RepoTestContext) {
    let admin = ctx.account(Role::Admin).await;
    let student = ctx.account(Role::Student).await;
    ctx.account(Role::Student).await;
    let big = ctx.company("Big Co").await;
    let small = ctx.company("Small Co").await;
    ctx.company("Empty Co").await;

    let repo = ctx.db.experiences();
    let mut created = Vec::new();
    for (company, title) in [(big.id, "a"), (big.id, "b"), (small.id, "c")] {
        created.push(
            repo.create(student.id, experience_input(company, title))
                .await
                .expect("Failed to create experience"),
        );
    }
    let mut fte = experience_input(small.id, "d");
    fte.job_type = JobType::Fte;
    repo.create(student.id, fte)
        .await
        .expect("Failed to create experience");

    repo.update(
        created[0].id,
        UpdateExperience {
            verified: Some(true),
            ..Default::default()
        },
        WriteGuard {
            actor_id: admin.id,
            actor_role: Role::Admin,
            expected_version: created[0].version,
        },
    )
    .await
    .expect("Failed to verify");

    ctx.db
        .notifications()
        .create(CreateNotification {
            user_id: student.id,
            title: "Verified".to_string(),
            message: "Your post is live".to_string(),
            notification_type: NotificationType::Verification,
            related_opportunity_id: None,
            related_experience_id: Some(created[0].id),
            related_mentorship_id: None,
        })
        .await
        .expect("Failed to create notification");

    let dashboard = ctx
        .db
        .analytics()
        .dashboard(Utc::now())
        .await
        .expect("Failed to compute dashboard");

    assert_eq!(dashboard.overview.total_users, 3);
    assert_eq!(dashboard.overview.total_companies, 3);
    assert_eq!(dashboard.overview.total_experiences, 4);
    assert_eq!(dashboard.verification.verified_experiences, 1);
    assert_eq!(dashboard.verification.pending_experiences, 3);
    assert_eq!(dashboard.verification.experience_verification_rate, 25.0);

    let roles = &dashboard.user_stats.user_roles;
    assert_eq!(roles[0].key, "student");
    assert_eq!(roles[0].count, 2);

    // Ties broken by name; companies without content are excluded
    let top: Vec<(&str, i64)> = dashboard
        .companies
        .top_by_experiences
        .iter()
        .map(|c| (c.name.as_str(), c.count))
        .collect();
    assert_eq!(top, vec![("Big Co", 2), ("Small Co", 2)]);

    assert_eq!(dashboard.activity.recent_experiences, 4);
    assert_eq!(dashboard.activity.recent_users, 3);
    assert_eq!(dashboard.trends.experiences_by_month.len(), 1);
    assert_eq!(dashboard.trends.experiences_by_month[0].count, 4);

    let job_types = &dashboard.content_types.job_types;
    assert_eq!(job_types[0].key, "internship");
    assert_eq!(job_types[0].count, 3);

    assert_eq!(dashboard.notifications.unread_count, 1);
}

pub async fn test_windows_are_relative_to_now(ctx: &RepoTestContext) {
    let student = ctx.account(Role::Student).await;
    let company = ctx.company("Window Co").await;
    ctx.db
        .experiences()
        .create(student.id, experience_input(company.id, "old news"))
        .await
        .expect("Failed to create experience");

    // A year from now the record falls outside both windows
    let later = Utc::now() + Duration::days(365);
    let dashboard = ctx
        .db
        .analytics()
        .dashboard(later)
        .await
        .expect("Failed to compute dashboard");
    assert_eq!(dashboard.activity.recent_experiences, 0);
    assert!(dashboard.trends.experiences_by_month.is_empty());

    let experiences = ctx
        .db
        .analytics()
        .experiences(later)
        .await
        .expect("Failed to compute experience analytics");
    assert_eq!(experiences.total_experiences, 1);
    assert!(experiences.experiences_by_month.is_empty());
}

pub async fn test_company_analytics(ctx: &RepoTestContext) {
    let student = ctx.account(Role::Student).await;
    let with_content = ctx.company("Content Co").await;
    ctx.company("Idle Co").await;
    ctx.db
        .experiences()
        .create(student.id, experience_input(with_content.id, "x"))
        .await
        .expect("Failed to create experience");

    let analytics = ctx
        .db
        .analytics()
        .companies()
        .await
        .expect("Failed to compute company analytics");
    assert_eq!(analytics.total_companies, 2);
    assert_eq!(analytics.companies_with_content, 1);
    assert_eq!(analytics.top_by_experiences.len(), 1);
    assert_eq!(analytics.top_by_experiences[0].slug, "content-co");
    assert!(analytics.top_by_opportunities.is_empty());
}

sqlite_test!(
    test_empty_database_has_zero_rates,
    test_dashboard_counts,
    test_windows_are_relative_to_now,
    test_company_analytics,
);
