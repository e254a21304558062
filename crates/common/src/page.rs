use serde::{Deserialize, Serialize};

use crate::ParseValueError;

/// Offset pagination window for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    limit: usize,
    offset: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 200;

    /// Validates `limit` against `1..=MAX_LIMIT`.
    pub fn new(limit: usize, offset: usize) -> Result<Self, ParseValueError> {
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(ParseValueError {
                kind: "page limit",
                value: limit.to_string(),
            });
        }
        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Cuts the window out of the full, already ordered result.
    pub fn apply<T>(&self, items: Vec<T>) -> Paged<T> {
        let total = items.len();
        Paged {
            items: items
                .into_iter()
                .skip(self.offset)
                .take(self.limit)
                .collect(),
            total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One window of a list result. `total` counts every match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_must_be_within_bounds() {
        assert!(Page::new(0, 0).is_err());
        assert!(Page::new(Page::MAX_LIMIT + 1, 0).is_err());
        assert!(Page::new(Page::MAX_LIMIT, 5).is_ok());
    }

    #[test]
    fn apply_cuts_window_and_keeps_total() {
        let paged = Page::new(2, 1).unwrap().apply(vec![1, 2, 3, 4]);
        assert_eq!(paged.items, vec![2, 3]);
        assert_eq!(paged.total, 4);

        let past_end = Page::new(2, 10).unwrap().apply(vec![1, 2, 3]);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 3);
    }
}
