//! Shared query parameter types for API handlers.

use biblio_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Repositories expect already-clamped values; use [`Self::limit`] and
/// [`Self::offset`] rather than the raw fields.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Page size clamped to `[1, MAX_LIMIT]`.
    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit, DEFAULT_LIMIT, MAX_LIMIT)
    }

    /// Non-negative offset.
    pub fn offset(&self) -> i64 {
        clamp_offset(self.offset)
    }
}
