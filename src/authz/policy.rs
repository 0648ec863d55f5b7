use uuid::Uuid;

use super::{Actor, AuthzError, MODERATORS, RoleSet, STAFF};
use crate::{
    db::{VisibilityScope, WriteGuard},
    models::{Experience, Opportunity, Role, UpdateExperience, UpdateOpportunity},
};

/// Ownable, verifiable record kinds governed by a [`RecordPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Experience,
    Opportunity,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Experience => "experience",
            RecordKind::Opportunity => "opportunity",
        }
    }
}

/// A record with an owner and a public/verified state.
pub trait OwnedRecord {
    fn owner_id(&self) -> Uuid;
    fn is_visible(&self) -> bool;
    fn is_verified(&self) -> bool;
    fn version(&self) -> i64;
}

impl OwnedRecord for Experience {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
    fn is_visible(&self) -> bool {
        self.visibility
    }
    fn is_verified(&self) -> bool {
        self.verified
    }
    fn version(&self) -> i64 {
        self.version
    }
}

impl OwnedRecord for Opportunity {
    fn owner_id(&self) -> Uuid {
        self.created_by
    }
    fn is_visible(&self) -> bool {
        self.visibility
    }
    fn is_verified(&self) -> bool {
        self.verified
    }
    fn version(&self) -> i64 {
        self.version
    }
}

/// A partial update whose field set drives the authorization decision.
pub trait GuardedPatch {
    fn present_fields(&self) -> Vec<&'static str>;
    /// Drop a requested change to the verification flag.
    fn strip_verified(&mut self);
}

impl GuardedPatch for UpdateExperience {
    fn present_fields(&self) -> Vec<&'static str> {
        UpdateExperience::present_fields(self)
    }
    fn strip_verified(&mut self) {
        self.verified = None;
    }
}

impl GuardedPatch for UpdateOpportunity {
    fn present_fields(&self) -> Vec<&'static str> {
        UpdateOpportunity::present_fields(self)
    }
    fn strip_verified(&mut self) {
        self.verified = None;
    }
}

/// Role rules for one record kind.
#[derive(Debug, Clone, Copy)]
pub struct RecordPolicy {
    pub kind: RecordKind,
    /// May set or clear `verified`, and use the verify action
    pub verify_roles: RoleSet,
    /// See every record regardless of visibility and verification
    pub see_all_roles: RoleSet,
    /// May change any field of any record
    pub full_write_roles: RoleSet,
    /// May change only `restricted_fields` on records they do not own
    pub restricted_write_roles: RoleSet,
    pub restricted_fields: &'static [&'static str],
    /// May delete records they do not own
    pub delete_roles: RoleSet,
}

const MODERATION_FIELDS: &[&str] = &["verified", "tags"];

impl RecordPolicy {
    pub const EXPERIENCE: RecordPolicy = RecordPolicy {
        kind: RecordKind::Experience,
        verify_roles: MODERATORS,
        see_all_roles: STAFF,
        full_write_roles: RoleSet::of(&[Role::Admin]),
        restricted_write_roles: RoleSet::of(&[Role::Spoc, Role::Pr]),
        restricted_fields: MODERATION_FIELDS,
        delete_roles: STAFF,
    };

    pub const OPPORTUNITY: RecordPolicy = RecordPolicy {
        kind: RecordKind::Opportunity,
        ..Self::EXPERIENCE
    };

    pub fn for_kind(kind: RecordKind) -> &'static RecordPolicy {
        match kind {
            RecordKind::Experience => &Self::EXPERIENCE,
            RecordKind::Opportunity => &Self::OPPORTUNITY,
        }
    }

    /// Listing filter for the actor.
    pub fn visibility_scope(&self, actor: &Actor) -> VisibilityScope {
        if actor.is(self.see_all_roles) {
            VisibilityScope::All
        } else {
            VisibilityScope::PublicOr(actor.id)
        }
    }

    /// Whether the actor may read the record at all. Callers answer `false`
    /// with not-found so hidden records are indistinguishable from missing ones.
    pub fn can_view<R: OwnedRecord>(&self, actor: &Actor, record: &R) -> bool {
        actor.is(self.see_all_roles)
            || record.owner_id() == actor.id
            || (record.is_visible() && record.is_verified())
    }

    /// Decide a partial update, mutating `patch` to the effective payload.
    ///
    /// On success returns the guard the write must re-check inside its
    /// transaction.
    pub fn authorize_update<R, P>(
        &self,
        actor: &Actor,
        record: &R,
        patch: &mut P,
    ) -> Result<WriteGuard, AuthzError>
    where
        R: OwnedRecord,
        P: GuardedPatch,
    {
        let decision = self.decide_update(actor, record, patch);
        crate::observability::metrics::record_policy_decision(
            self.kind.as_str(),
            "update",
            match &decision {
                Ok(()) => "allow",
                Err(AuthzError::RestrictedFields { .. }) => "restricted",
                Err(AuthzError::AccessDenied(_)) => "deny",
            },
        );
        decision?;

        Ok(WriteGuard {
            actor_id: actor.id,
            actor_role: actor.role,
            expected_version: record.version(),
        })
    }

    fn decide_update<R, P>(&self, actor: &Actor, record: &R, patch: &mut P) -> Result<(), AuthzError>
    where
        R: OwnedRecord,
        P: GuardedPatch,
    {
        if !actor.is(self.verify_roles) {
            patch.strip_verified();
        }

        if actor.is(self.full_write_roles) || record.owner_id() == actor.id {
            return Ok(());
        }

        if actor.is(self.restricted_write_roles) {
            let rejected: Vec<&'static str> = patch
                .present_fields()
                .into_iter()
                .filter(|field| !self.restricted_fields.contains(field))
                .collect();
            if rejected.is_empty() {
                return Ok(());
            }
            return Err(AuthzError::RestrictedFields {
                allowed: self.restricted_fields.join(" and "),
                rejected,
            });
        }

        Err(AuthzError::access_denied(format!(
            "Only the author or staff may modify this {}",
            self.kind.as_str()
        )))
    }

    pub fn authorize_delete<R: OwnedRecord>(
        &self,
        actor: &Actor,
        record: &R,
    ) -> Result<(), AuthzError> {
        let allowed = record.owner_id() == actor.id || actor.is(self.delete_roles);
        crate::observability::metrics::record_policy_decision(
            self.kind.as_str(),
            "delete",
            if allowed { "allow" } else { "deny" },
        );
        if allowed {
            Ok(())
        } else {
            Err(AuthzError::access_denied(format!(
                "Only the author or staff may delete this {}",
                self.kind.as_str()
            )))
        }
    }

    /// Gate for the dedicated verify action and the unverified queue.
    pub fn authorize_verify(&self, actor: &Actor) -> Result<(), AuthzError> {
        let result = self.verify_roles.require(actor);
        crate::observability::metrics::record_policy_decision(
            self.kind.as_str(),
            "verify",
            if result.is_ok() { "allow" } else { "deny" },
        );
        result
    }

    /// Whether the actor may address the record by id. Moderators reach
    /// unverified records for the verify action.
    pub fn can_address_for_verify<R: OwnedRecord>(&self, actor: &Actor, record: &R) -> bool {
        actor.is(self.verify_roles) || self.can_view(actor, record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rstest::rstest;

    use super::*;
    use crate::models::JobType;

    fn actor(role: Role) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            email: "actor@college.edu".into(),
        }
    }

    fn experience(author_id: Uuid, visibility: bool, verified: bool) -> Experience {
        let now = Utc::now();
        Experience {
            id: Uuid::new_v4(),
            title: "Interview".into(),
            role: "SDE".into(),
            short_description: "Two rounds".into(),
            content: None,
            tips: None,
            compensation: None,
            experience_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            job_type: JobType::Fte,
            visibility,
            verified,
            author_id,
            company_id: Uuid::new_v4(),
            tags: Vec::new(),
            published_at: now,
            updated_at: now,
            version: 3,
        }
    }

    fn patch(verified: bool, tags: bool, title: bool) -> UpdateExperience {
        UpdateExperience {
            verified: verified.then_some(true),
            tags: tags.then(|| vec![Uuid::new_v4()]),
            title: title.then(|| "x".to_string()),
            ..Default::default()
        }
    }

    #[derive(Debug, PartialEq)]
    enum Outcome {
        Allow,
        Restricted,
        Deny,
    }

    fn outcome(result: &Result<WriteGuard, AuthzError>) -> Outcome {
        match result {
            Ok(_) => Outcome::Allow,
            Err(AuthzError::RestrictedFields { .. }) => Outcome::Restricted,
            Err(AuthzError::AccessDenied(_)) => Outcome::Deny,
        }
    }

    // (role, is_author, verified?, tags?, title?) -> outcome, verified kept?
    #[rstest]
    #[case::student_author_title(Role::Student, true, false, false, true, Outcome::Allow, false)]
    #[case::student_author_verified_stripped(Role::Student, true, true, false, true, Outcome::Allow, false)]
    #[case::student_other_verified(Role::Student, false, true, false, false, Outcome::Deny, false)]
    #[case::student_other_title(Role::Student, false, false, false, true, Outcome::Deny, false)]
    #[case::spoc_verify_and_tags(Role::Spoc, false, true, true, false, Outcome::Allow, true)]
    #[case::spoc_verify_and_title(Role::Spoc, false, true, false, true, Outcome::Restricted, true)]
    #[case::pr_verify(Role::Pr, false, true, false, false, Outcome::Allow, true)]
    #[case::pr_tags_only(Role::Pr, false, false, true, false, Outcome::Allow, false)]
    #[case::pr_title(Role::Pr, false, false, false, true, Outcome::Restricted, false)]
    #[case::pr_author_title(Role::Pr, true, true, false, true, Outcome::Allow, true)]
    #[case::admin_anything(Role::Admin, false, true, true, true, Outcome::Allow, true)]
    fn test_update_matrix(
        #[case] role: Role,
        #[case] is_author: bool,
        #[case] verified: bool,
        #[case] tags: bool,
        #[case] title: bool,
        #[case] expected: Outcome,
        #[case] verified_kept: bool,
    ) {
        let actor = actor(role);
        let author = if is_author { actor.id } else { Uuid::new_v4() };
        let record = experience(author, true, false);
        let mut payload = patch(verified, tags, title);

        for policy in [RecordPolicy::EXPERIENCE, RecordPolicy::OPPORTUNITY] {
            let mut effective = payload.clone();
            let result = policy.authorize_update(&actor, &record, &mut effective);
            assert_eq!(outcome(&result), expected, "{:?}", policy.kind);
            assert_eq!(effective.verified.is_some(), verified_kept);
        }

        let guard = RecordPolicy::EXPERIENCE
            .authorize_update(&actor, &record, &mut payload)
            .ok();
        if let Some(guard) = guard {
            assert_eq!(guard.actor_id, actor.id);
            assert_eq!(guard.actor_role, role);
            assert_eq!(guard.expected_version, 3);
        }
    }

    #[test]
    fn test_restricted_error_lists_rejected_fields() {
        let actor = actor(Role::Spoc);
        let record = experience(Uuid::new_v4(), true, true);
        let mut payload = UpdateExperience {
            verified: Some(true),
            title: Some("x".into()),
            compensation: Some(None),
            ..Default::default()
        };
        let err = RecordPolicy::EXPERIENCE
            .authorize_update(&actor, &record, &mut payload)
            .unwrap_err();
        match err {
            AuthzError::RestrictedFields { rejected, allowed } => {
                assert_eq!(rejected, vec!["title", "compensation"]);
                assert_eq!(allowed, "verified and tags");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[case::student(Role::Student, false)]
    #[case::pr(Role::Pr, false)]
    #[case::spoc(Role::Spoc, true)]
    #[case::admin(Role::Admin, true)]
    fn test_visibility(#[case] role: Role, #[case] sees_all: bool) {
        let actor = actor(role);
        let policy = RecordPolicy::EXPERIENCE;

        let expected_scope = if sees_all {
            VisibilityScope::All
        } else {
            VisibilityScope::PublicOr(actor.id)
        };
        assert_eq!(policy.visibility_scope(&actor), expected_scope);

        let public = experience(Uuid::new_v4(), true, true);
        let unverified = experience(Uuid::new_v4(), true, false);
        let hidden = experience(Uuid::new_v4(), false, true);
        let own_unverified = experience(actor.id, false, false);

        assert!(policy.can_view(&actor, &public));
        assert!(policy.can_view(&actor, &own_unverified));
        assert_eq!(policy.can_view(&actor, &unverified), sees_all);
        assert_eq!(policy.can_view(&actor, &hidden), sees_all);
    }

    #[rstest]
    #[case::student_other(Role::Student, false, false)]
    #[case::student_author(Role::Student, true, true)]
    #[case::pr_other(Role::Pr, false, false)]
    #[case::spoc_other(Role::Spoc, false, true)]
    #[case::admin_other(Role::Admin, false, true)]
    fn test_delete(#[case] role: Role, #[case] is_author: bool, #[case] allowed: bool) {
        let actor = actor(role);
        let author = if is_author { actor.id } else { Uuid::new_v4() };
        let record = experience(author, true, true);
        assert_eq!(
            RecordPolicy::EXPERIENCE
                .authorize_delete(&actor, &record)
                .is_ok(),
            allowed
        );
    }

    #[rstest]
    #[case::student(Role::Student, false)]
    #[case::pr(Role::Pr, true)]
    #[case::spoc(Role::Spoc, true)]
    #[case::admin(Role::Admin, true)]
    fn test_verify_roles_are_unified(#[case] role: Role, #[case] allowed: bool) {
        let actor = actor(role);
        for kind in [RecordKind::Experience, RecordKind::Opportunity] {
            assert_eq!(
                RecordPolicy::for_kind(kind).authorize_verify(&actor).is_ok(),
                allowed
            );
        }
    }

    #[test]
    fn test_moderator_can_address_unverified_for_verify() {
        let record = experience(Uuid::new_v4(), true, false);
        assert!(RecordPolicy::EXPERIENCE.can_address_for_verify(&actor(Role::Pr), &record));
        assert!(!RecordPolicy::EXPERIENCE.can_view(&actor(Role::Pr), &record));
        assert!(!RecordPolicy::EXPERIENCE.can_address_for_verify(&actor(Role::Student), &record));
    }
}
