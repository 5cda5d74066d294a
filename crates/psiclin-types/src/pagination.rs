//! Listing defaults shared by every paged endpoint.

use serde::{Deserialize, Serialize};

/// Page size applied when the caller does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction for paged listings. The backend convention is
/// newest-first, so `Desc` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// The value transmitted in query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Pagination parameters with the client-wide defaults: first page,
/// [`DEFAULT_PAGE_SIZE`] entries, descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub order: SortOrder,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            order: SortOrder::default(),
        }
    }
}

impl Pagination {
    /// Pagination for a given page index with the default size and order.
    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Renders the query-string pairs for this pagination.
    pub fn to_query(self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("order", self.order.as_query_value().to_owned()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_descending() {
        let pagination = Pagination::default();
        assert_eq!(pagination.page, 0);
        assert_eq!(pagination.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(pagination.order, SortOrder::Desc);
    }

    #[test]
    fn renders_query_pairs() {
        let query = Pagination::page(2).with_page_size(25).to_query();
        assert_eq!(
            query,
            vec![
                ("page", "2".to_owned()),
                ("pageSize", "25".to_owned()),
                ("order", "desc".to_owned()),
            ]
        );
    }
}
