use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use utoipa::ToSchema;

use crate::filtering::FilterCondition;

/// Body of a filtered list request.
///
/// ```json
/// {
///   "filter": [{ "fieldName": "Status", "operator": 1, "values": ["2"] }],
///   "sortColumn": "CreatedAtUtc",
///   "isDescending": true,
///   "pageNumber": 0,
///   "pageSize": 25
/// }
/// ```
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRequest {
    /// Conditions combined with AND. `null` is treated as no conditions.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub filter: Vec<FilterCondition>,
    /// Column to sort by; unknown or blank columns fall back to the default.
    pub sort_column: Option<String>,
    pub is_descending: bool,
    /// Number of rows to skip.
    pub page_number: u64,
    /// Maximum number of rows to return. 0 means no limit and returns every
    /// row from `page_number` on, not an empty page.
    pub page_size: u64,
}

/// One page of results plus the number of rows matching before paging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> PagedResponse<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Convert every item, keeping the total count.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResponse<U> {
        PagedResponse {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}

impl<T> Default for PagedResponse<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Rows to skip and the maximum to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageWindow {
    pub skip: u64,
    pub take: Option<u64>,
}

impl PageWindow {
    #[must_use]
    pub const fn new(skip: u64, take: Option<u64>) -> Self {
        Self { skip, take }
    }

    #[must_use]
    pub const fn from_request(request: &FilterRequest) -> Self {
        Self {
            skip: request.page_number,
            take: if request.page_size == 0 {
                None
            } else {
                Some(request.page_size)
            },
        }
    }
}
