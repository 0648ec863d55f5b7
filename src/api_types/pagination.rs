use serde::{Deserialize, Serialize};

/// Cursor state returned with every paged list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Page size that was applied after clamping.
    pub limit: i64,
    pub has_more: bool,
    /// Pass back as `cursor` to continue forward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Pass back as `cursor` with `direction=backward`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
}

/// `{ "data": [...], "pagination": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}
