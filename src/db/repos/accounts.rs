use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{Account, NewAccount, Role},
};

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn create(&self, input: NewAccount) -> DbResult<Account>;
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>>;
    /// Case-insensitive lookup on the primary sign-in email.
    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>>;
    /// Case-insensitive lookup on the backup email.
    async fn get_by_backup_email(&self, email: &str) -> DbResult<Option<Account>>;
    async fn set_backup_email(&self, id: Uuid, backup_email: &str) -> DbResult<Account>;
    async fn set_role(&self, id: Uuid, role: Role) -> DbResult<Account>;
    /// Active accounts other than `exclude`, ordered by name.
    async fn list_active_except(&self, exclude: Uuid) -> DbResult<Vec<Account>>;
}
