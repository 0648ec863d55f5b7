//! Shared tests for AccountRepo implementations

use uuid::Uuid;

use super::{harness::RepoTestContext, sqlite_test};
use crate::{
    db::error::DbError,
    models::{NewAccount, Role},
};

fn new_account(email: &str, roll_number: &str) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        name: "Asha Rao".to_string(),
        roll_number: roll_number.to_string(),
        department: "Electrical".to_string(),
        programme: "MTech".to_string(),
        role: Role::Student,
    }
}

pub async fn test_create_and_get(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    let created = repo
        .create(new_account("asha@college.edu", "EE21M001"))
        .await
        .expect("Failed to create account");

    assert_eq!(created.role, Role::Student);
    assert!(created.is_active);
    assert!(created.backup_email.is_none());

    let fetched = repo
        .get_by_id(created.id)
        .await
        .expect("Failed to get account")
        .expect("Account should exist");
    assert_eq!(fetched.email, "asha@college.edu");
    assert_eq!(fetched.roll_number, "EE21M001");
}

pub async fn test_email_lookup_is_case_insensitive(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    let created = repo
        .create(new_account("Asha@College.edu", "EE21M002"))
        .await
        .expect("Failed to create account");

    let fetched = repo
        .get_by_email("asha@college.edu")
        .await
        .expect("Failed to query")
        .expect("Account should be found");
    assert_eq!(fetched.id, created.id);
}

pub async fn test_duplicate_email_conflicts(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    repo.create(new_account("dup@college.edu", "R1"))
        .await
        .expect("First create should succeed");

    let result = repo.create(new_account("DUP@college.edu", "R2")).await;
    assert!(matches!(result, Err(DbError::Conflict(_))));
}

pub async fn test_duplicate_roll_number_conflicts(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    repo.create(new_account("one@college.edu", "SAME"))
        .await
        .expect("First create should succeed");

    let result = repo.create(new_account("two@college.edu", "SAME")).await;
    assert!(matches!(result, Err(DbError::Conflict(_))));
}

pub async fn test_backup_email_lookup(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    let account = ctx.account(Role::Student).await;

    let updated = repo
        .set_backup_email(account.id, "personal@gmail.com")
        .await
        .expect("Failed to set backup email");
    assert_eq!(updated.backup_email.as_deref(), Some("personal@gmail.com"));

    let found = repo
        .get_by_backup_email("Personal@Gmail.com")
        .await
        .expect("Failed to query")
        .expect("Account should be found by backup email");
    assert_eq!(found.id, account.id);

    assert!(
        repo.get_by_email("personal@gmail.com")
            .await
            .expect("Failed to query")
            .is_none()
    );
}

pub async fn test_set_role(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    let account = ctx.account(Role::Student).await;

    let updated = repo
        .set_role(account.id, Role::Pr)
        .await
        .expect("Failed to set role");
    assert_eq!(updated.role, Role::Pr);
    assert!(updated.updated_at >= account.updated_at);
}

pub async fn test_set_role_not_found(ctx: &RepoTestContext) {
    let result = ctx.db.accounts().set_role(Uuid::new_v4(), Role::Spoc).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

pub async fn test_list_active_except(ctx: &RepoTestContext) {
    let me = ctx.account(Role::Student).await;
    let other = ctx.account(Role::Admin).await;
    let third = ctx.account(Role::Spoc).await;

    let listed = ctx
        .db
        .accounts()
        .list_active_except(me.id)
        .await
        .expect("Failed to list accounts");

    let ids: Vec<Uuid> = listed.iter().map(|a| a.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&other.id));
    assert!(ids.contains(&third.id));
    assert!(!ids.contains(&me.id));
}

pub async fn test_duplicate_backup_email_conflicts(ctx: &RepoTestContext) {
    let repo = ctx.db.accounts();
    let first = ctx.account(Role::Student).await;
    let second = ctx.account(Role::Student).await;

    repo.set_backup_email(first.id, "shared@gmail.com")
        .await
        .expect("Failed to set backup email");

    let result = repo.set_backup_email(second.id, "Shared@Gmail.com").await;
    assert!(matches!(result, Err(DbError::Conflict(_))));
}

sqlite_test!(
    test_create_and_get,
    test_email_lookup_is_case_insensitive,
    test_duplicate_email_conflicts,
    test_duplicate_roll_number_conflicts,
    test_backup_email_lookup,
    test_duplicate_backup_email_conflicts,
    test_set_role,
    test_set_role_not_found,
    test_list_active_except,
);
