use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    authz::{Actor, AuthzError, STAFF},
    db::{DbError, DbPool, DbResult},
    models::{
        Account, AccountSummary, AssignableRole, NewAccount, ProvisionProfile, Role,
        VerifiedIdentity,
    },
    observability::metrics,
};

/// How a sign-in was matched to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Existing,
    BackupEmail,
    Provisioned,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Existing => "existing",
            Resolution::BackupEmail => "backup_email",
            Resolution::Provisioned => "provisioned",
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// No account matches and the identity is outside the institution domain.
    #[error("No account found for this identity")]
    NotRegistered,

    #[error("Account not found")]
    NotFound,

    #[error("Account is disabled")]
    Inactive,

    #[error("{0}")]
    MissingProfile(String),

    /// The address is inside the institution domain or belongs to another account.
    #[error("{0}")]
    BackupEmailUnavailable(String),
}

/// Account directory: sign-in resolution and role assignment.
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DbPool>,
}

impl AccountService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>> {
        self.db.accounts().get_by_id(id).await
    }

    /// Resolve a verified identity to an account, provisioning a student
    /// account for first-time sign-ins from the institution domain.
    ///
    /// Lookup order is primary email, then backup email. Identities outside
    /// `email_suffix` that match neither fail with [`AccountError::NotRegistered`].
    pub async fn resolve_or_provision(
        &self,
        identity: &VerifiedIdentity,
        email_suffix: &str,
        profile: ProvisionProfile,
    ) -> Result<(Account, Resolution), AccountError> {
        let accounts = self.db.accounts();

        let found = match accounts.get_by_email(&identity.email).await? {
            Some(account) => Some((account, Resolution::Existing)),
            None => accounts
                .get_by_backup_email(&identity.email)
                .await?
                .map(|account| (account, Resolution::BackupEmail)),
        };

        if let Some((account, resolution)) = found {
            if !account.is_active {
                return Err(AccountError::Inactive);
            }
            metrics::record_account_resolution(resolution.as_str());
            return Ok((account, resolution));
        }

        if !identity
            .email
            .to_ascii_lowercase()
            .ends_with(&email_suffix.to_ascii_lowercase())
        {
            metrics::record_account_resolution("outside_domain");
            return Err(AccountError::NotRegistered);
        }

        let roll_number = profile
            .roll_number
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                AccountError::MissingProfile("roll_number is required for first sign-in".into())
            })?;
        let name = profile
            .name
            .or_else(|| identity.name.clone())
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                AccountError::MissingProfile("name is required for first sign-in".into())
            })?;

        let account = accounts
            .create(NewAccount {
                email: identity.email.clone(),
                name,
                roll_number,
                department: profile.department.unwrap_or_default(),
                programme: profile.programme.unwrap_or_default(),
                role: Role::Student,
            })
            .await?;

        tracing::info!(account_id = %account.id, "Provisioned account on first sign-in");
        metrics::record_account_resolution(Resolution::Provisioned.as_str());
        Ok((account, Resolution::Provisioned))
    }

    /// Record a personal address that can later sign in to the caller's
    /// account. Institution addresses are refused, as is any address already
    /// used as another account's primary or backup email.
    pub async fn set_backup_email(
        &self,
        actor: &Actor,
        backup_email: &str,
        institution_suffix: &str,
    ) -> Result<Account, AccountError> {
        let backup_email = backup_email.trim().to_ascii_lowercase();
        if backup_email.ends_with(&institution_suffix.to_ascii_lowercase()) {
            return Err(AccountError::BackupEmailUnavailable(
                "backup_email must be outside the institution domain".into(),
            ));
        }

        let accounts = self.db.accounts();
        let taken = match accounts.get_by_email(&backup_email).await? {
            Some(_) => true,
            None => accounts
                .get_by_backup_email(&backup_email)
                .await?
                .is_some_and(|owner| owner.id != actor.id),
        };
        if taken {
            return Err(AccountError::BackupEmailUnavailable(
                "backup_email is already in use".into(),
            ));
        }

        match accounts.set_backup_email(actor.id, &backup_email).await {
            Err(DbError::Conflict(_)) => Err(AccountError::BackupEmailUnavailable(
                "backup_email is already in use".into(),
            )),
            result => Ok(result?),
        }
    }

    pub async fn set_role(
        &self,
        actor: &Actor,
        email: &str,
        role: AssignableRole,
    ) -> Result<Account, AccountError> {
        STAFF.require(actor)?;

        let accounts = self.db.accounts();
        let target = accounts
            .get_by_email(email)
            .await?
            .ok_or(AccountError::NotFound)?;

        let updated = accounts.set_role(target.id, role.into()).await?;
        tracing::info!(
            actor_id = %actor.id,
            target_id = %updated.id,
            role = %updated.role,
            "Account role changed"
        );
        Ok(updated)
    }

    /// Active accounts other than the caller, for picking a mentor.
    pub async fn available_mentors(&self, actor: &Actor) -> DbResult<Vec<AccountSummary>> {
        let accounts = self.db.accounts().list_active_except(actor.id).await?;
        Ok(accounts.into_iter().map(AccountSummary::from).collect())
    }
}
