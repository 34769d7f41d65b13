use super::types::{AnalyticsRawIncidentsRequest, AnalyticsRawIncidentsResponse};

impl AnalyticsRawIncidentsResponse {
    /// Whether the server reported records beyond this page.
    pub fn has_more(&self) -> bool {
        self.more && self.last.is_some()
    }

    /// Request for the page after this one, or `None` at the end.
    ///
    /// Filters, limit and ordering are carried over from `request`; the
    /// cursor is copied verbatim from `last`.
    pub fn next_page(
        &self,
        request: &AnalyticsRawIncidentsRequest,
    ) -> Option<AnalyticsRawIncidentsRequest> {
        if !self.more {
            return None;
        }
        let cursor = self.last.as_ref()?;
        Some(AnalyticsRawIncidentsRequest {
            starting_after: Some(cursor.clone()),
            ending_before: None,
            ..request.clone()
        })
    }

    /// Request for the page before this one, or `None` when the page
    /// carries no `first` cursor.
    pub fn previous_page(
        &self,
        request: &AnalyticsRawIncidentsRequest,
    ) -> Option<AnalyticsRawIncidentsRequest> {
        let cursor = self.first.as_ref()?;
        Some(AnalyticsRawIncidentsRequest {
            starting_after: None,
            ending_before: Some(cursor.clone()),
            ..request.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnalyticsFilter, SortOrder};

    fn request() -> AnalyticsRawIncidentsRequest {
        AnalyticsRawIncidentsRequest::new(AnalyticsFilter::new().team("PCDYDX0"))
            .limit(50)
            .order(SortOrder::Desc)
            .order_by("created_at")
            .ending_before("stale")
    }

    fn page(more: bool) -> AnalyticsRawIncidentsResponse {
        AnalyticsRawIncidentsResponse {
            first: Some("FIRST=".to_string()),
            last: Some("LAST=".to_string()),
            more,
            ..Default::default()
        }
    }

    #[test]
    fn test_next_page_threads_last_cursor() {
        let next = page(true).next_page(&request()).unwrap();
        assert_eq!(next.starting_after.as_deref(), Some("LAST="));
        assert_eq!(next.ending_before, None);
        assert_eq!(next.limit, Some(50));
        assert_eq!(next.order, Some(SortOrder::Desc));
        assert_eq!(next.order_by.as_deref(), Some("created_at"));
        assert_eq!(next.filters, request().filters);
    }

    #[test]
    fn test_next_page_stops_without_more() {
        assert!(page(false).next_page(&request()).is_none());
        assert!(!page(false).has_more());
    }

    #[test]
    fn test_next_page_needs_cursor() {
        let response = AnalyticsRawIncidentsResponse {
            more: true,
            ..Default::default()
        };
        assert!(response.next_page(&request()).is_none());
        assert!(!response.has_more());
    }

    #[test]
    fn test_previous_page_threads_first_cursor() {
        let prev = page(false).previous_page(&request()).unwrap();
        assert_eq!(prev.ending_before.as_deref(), Some("FIRST="));
        assert_eq!(prev.starting_after, None);
        assert_eq!(prev.limit, Some(50));
    }
}
