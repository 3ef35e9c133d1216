//! Limit/offset pagination for list operations.

use serde::{Deserialize, Serialize};

/// Items returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: u64 = 10;

/// Upper bound on a single page.
pub const MAX_LIMIT: u64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of items to skip.
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    #[must_use]
    pub const fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Replaces a zero limit with the default and clamps to [`MAX_LIMIT`].
    #[must_use]
    pub fn normalized(self) -> Self {
        let limit = match self.limit {
            0 => DEFAULT_LIMIT,
            n => n.min(MAX_LIMIT),
        };
        Self {
            limit,
            offset: self.offset,
        }
    }

    /// Applies this page to an already ordered iterator.
    pub fn apply<T>(self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let page = self.normalized();
        items
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .collect()
    }
}
