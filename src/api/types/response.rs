//! Success envelopes

use serde::Serialize;

use crate::domain::review::Page;

/// `{ success: true, data, pagination? }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn paged(page: Page<T>) -> Self {
        Self {
            success: true,
            pagination: Some(Pagination {
                current_page: page.current_page,
                total_pages: page.total_pages,
                total_count: page.total_count,
                has_next: page.has_next,
                has_prev: page.has_prev,
            }),
            data: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::PageRequest;

    #[test]
    fn test_paged_envelope() {
        let page = Page::from_sorted(vec![1, 2, 3], PageRequest::new(Some(1), Some(2), 20, 100));
        let json = serde_json::to_value(ApiResponse::paged(page)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["pagination"]["totalPages"], 2);
        assert_eq!(json["pagination"]["hasNext"], true);
        assert_eq!(json["pagination"]["hasPrev"], false);
    }

    #[test]
    fn test_single_envelope_omits_pagination() {
        let json = serde_json::to_value(ApiResponse::ok("x")).unwrap();
        assert!(json.get("pagination").is_none());
    }
}
