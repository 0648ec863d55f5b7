//! Role-based authorization.
//!
//! Two layers:
//! - [`RoleSet`] predicates gate whole routes (staff-only writes, moderator
//!   queues, analytics).
//! - [`RecordPolicy`] decides what an actor may see, change, verify or delete on
//!   ownable, verifiable records (experiences and opportunities). One policy
//!   value exists per [`RecordKind`]; the decision logic is shared.

mod error;
mod policy;
mod role;

pub use error::AuthzError;
pub use policy::{GuardedPatch, OwnedRecord, RecordKind, RecordPolicy};
pub use role::{Actor, MODERATORS, RoleSet, STAFF};
