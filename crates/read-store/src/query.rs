use serde::Deserialize;

/// Paging for history lookups.
///
/// History is always returned newest first; `offset` skips that many of
/// the most recent entries and `limit` caps the number returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of entries to return.
    pub limit: Option<usize>,

    /// Number of entries to skip.
    pub offset: Option<usize>,
}

impl HistoryQuery {
    /// Creates a query returning the full history.
    pub fn all() -> Self {
        Self::default()
    }

    /// Caps the number of entries returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the most recent `offset` entries.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Applies offset and limit to an already-ordered list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let items = items.into_iter().skip(self.offset.unwrap_or(0));
        match self.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        }
    }

    /// `LIMIT` parameter for SQL stores, saturating at `i64::MAX`.
    pub fn sql_limit(&self) -> Option<i64> {
        self.limit.map(saturating_i64)
    }

    /// `OFFSET` parameter for SQL stores, saturating at `i64::MAX`.
    pub fn sql_offset(&self) -> i64 {
        saturating_i64(self.offset.unwrap_or(0))
    }
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
