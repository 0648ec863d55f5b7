mod accounts;
mod analytics;
mod companies;
pub mod cursor;
mod experiences;
mod mentorships;
mod notifications;
mod opportunities;
mod tags;

pub use accounts::*;
pub use analytics::*;
pub use companies::*;
pub use cursor::*;
pub use experiences::*;
pub use mentorships::*;
pub use notifications::*;
pub use opportunities::*;
pub use tags::*;
use uuid::Uuid;

use crate::models::Role;

/// Default page size when the caller does not pass `limit`.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Upper bound on `limit`.
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Keyset pagination parameters.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub cursor: Option<Cursor>,
    pub direction: CursorDirection,
}

impl ListParams {
    /// Requested limit clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

/// One page of a keyset-paginated list.
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub cursors: PageCursors,
}

impl<T> ListResult<T> {
    /// Build a page from rows fetched with `LIMIT limit + 1`.
    ///
    /// Trims the lookahead row, restores list order for backward pages and
    /// derives the cursors.
    pub fn from_lookahead<F>(mut rows: Vec<T>, params: &ListParams, get_cursor: F) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        let limit = params.effective_limit() as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        if params.direction == CursorDirection::Backward {
            rows.reverse();
        }

        let cursors = PageCursors::from_items(
            &rows,
            has_more,
            params.direction,
            params.cursor.as_ref(),
            get_cursor,
        );
        Self {
            items: rows,
            has_more,
            cursors,
        }
    }
}

/// Which records of an ownable, verifiable kind a reader may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Every record regardless of visibility or verification.
    All,
    /// Records that are both visible and verified, plus the reader's own.
    PublicOr(Uuid),
}

/// Preconditions checked inside the write transaction of a policy-gated update.
///
/// The policy decision was made against a snapshot; the write only lands if
/// that snapshot is still current and the actor still holds the role the
/// decision assumed.
#[derive(Debug, Clone, Copy)]
pub struct WriteGuard {
    pub actor_id: Uuid,
    pub actor_role: Role,
    pub expected_version: i64,
}
