use serde::Deserialize;
use uuid::Uuid;

use super::ApiError;
use crate::{
    api_types::{ListResponse, PaginationMeta},
    db::{Cursor, CursorDirection, ListParams, ListResult},
};

/// Query parameters for list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Maximum number of results to return
    pub limit: Option<i64>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
    /// "forward" (default) or "backward"
    #[serde(default)]
    pub direction: Option<String>,
}

impl ListQuery {
    /// Convert to ListParams, rejecting malformed cursors and directions.
    pub fn try_into_params(self) -> Result<ListParams, ApiError> {
        let cursor = self
            .cursor
            .as_deref()
            .map(Cursor::decode)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid cursor: {e}")))?;

        let direction = match self.direction.as_deref() {
            Some("backward") => CursorDirection::Backward,
            Some("forward") | None => CursorDirection::Forward,
            Some(other) => {
                return Err(ApiError::BadRequest(format!(
                    "Invalid direction '{other}': must be 'forward' or 'backward'"
                )));
            }
        };

        Ok(ListParams {
            limit: self.limit,
            cursor,
            direction,
        })
    }
}

/// Parse a comma-separated `tag_ids` query value. Blank entries are skipped.
pub fn parse_tag_ids(raw: Option<&str>) -> Result<Vec<Uuid>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| ApiError::BadRequest(format!("Invalid tag id '{s}'")))
        })
        .collect()
}

/// Wrap a repository page in the list envelope.
pub fn paginate<T>(page: ListResult<T>, params: &ListParams) -> ListResponse<T> {
    ListResponse {
        pagination: PaginationMeta {
            limit: params.effective_limit(),
            has_more: page.has_more,
            next_cursor: page.cursors.next.as_ref().map(Cursor::encode),
            prev_cursor: page.cursors.prev.as_ref().map(Cursor::encode),
        },
        data: page.items,
    }
}
