//! Shared tests for NotificationRepo implementations

use uuid::Uuid;

use super::{harness::RepoTestContext, sqlite_test};
use crate::{
    db::{error::DbError, repos::ListParams},
    models::{CreateNotification, NotificationType, Role},
};

fn notification(user_id: Uuid, title: &str) -> CreateNotification {
    CreateNotification {
        user_id,
        title: title.to_string(),
        message: "Your experience was verified".to_string(),
        notification_type: NotificationType::Verification,
        related_opportunity_id: None,
        related_experience_id: None,
        related_mentorship_id: None,
    }
}

pub async fn test_list_is_per_user_newest_first(ctx: &RepoTestContext) {
    let owner = ctx.account(Role::Student).await;
    let other = ctx.account(Role::Student).await;
    let repo = ctx.db.notifications();

    let first = repo
        .create(notification(owner.id, "first"))
        .await
        .expect("Failed to create");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = repo
        .create(notification(owner.id, "second"))
        .await
        .expect("Failed to create");
    repo.create(notification(other.id, "not yours"))
        .await
        .expect("Failed to create");

    let listed = repo
        .list_for_user(owner.id, ListParams::default())
        .await
        .expect("Failed to list");
    let ids: Vec<Uuid> = listed.items.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

pub async fn test_mark_read(ctx: &RepoTestContext) {
    let owner = ctx.account(Role::Student).await;
    let repo = ctx.db.notifications();
    let created = repo
        .create(notification(owner.id, "hello"))
        .await
        .expect("Failed to create");
    assert!(!created.is_read);

    let read = repo.mark_read(created.id).await.expect("Failed to mark read");
    assert!(read.is_read);

    assert!(matches!(
        repo.mark_read(Uuid::new_v4()).await,
        Err(DbError::NotFound)
    ));
}

pub async fn test_mark_all_read_counts_changes(ctx: &RepoTestContext) {
    let owner = ctx.account(Role::Student).await;
    let other = ctx.account(Role::Student).await;
    let repo = ctx.db.notifications();

    let a = repo
        .create(notification(owner.id, "a"))
        .await
        .expect("Failed to create");
    repo.create(notification(owner.id, "b"))
        .await
        .expect("Failed to create");
    repo.create(notification(owner.id, "c"))
        .await
        .expect("Failed to create");
    repo.create(notification(other.id, "d"))
        .await
        .expect("Failed to create");
    repo.mark_read(a.id).await.expect("Failed to mark read");

    assert_eq!(repo.mark_all_read(owner.id).await.expect("mark all"), 2);
    assert_eq!(repo.mark_all_read(owner.id).await.expect("mark all"), 0);

    let others = repo
        .list_for_user(other.id, ListParams::default())
        .await
        .expect("Failed to list");
    assert!(!others.items[0].is_read);
}

pub async fn test_related_record_must_exist(ctx: &RepoTestContext) {
    let owner = ctx.account(Role::Student).await;
    let mut input = notification(owner.id, "dangling");
    input.related_experience_id = Some(Uuid::new_v4());
    let result = ctx.db.notifications().create(input).await;
    assert!(matches!(result, Err(DbError::Validation(_))));
}

pub async fn test_delete(ctx: &RepoTestContext) {
    let owner = ctx.account(Role::Student).await;
    let repo = ctx.db.notifications();
    let created = repo
        .create(notification(owner.id, "bye"))
        .await
        .expect("Failed to create");

    repo.delete(created.id).await.expect("Failed to delete");
    assert!(matches!(repo.delete(created.id).await, Err(DbError::NotFound)));
}

sqlite_test!(
    test_list_is_per_user_newest_first,
    test_mark_read,
    test_mark_all_read_counts_changes,
    test_related_record_must_exist,
    test_delete,
);
