//! Current search filters, derived from the page URL.
//!
//! The URL is the single source of truth. Every write is a navigation: external ones
//! (link clicks, back/forward) call [`FilterStateStore::navigate`], and user edits go
//! through [`FilterStateStore::apply`], which serializes the filters to a URL and
//! navigates to it. Subscribers receive a fresh [`FilterSnapshot`] after every change.

use serde::Serialize;
use tokio::sync::watch;

use crate::models::SearchFilters;
use crate::query_codec;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub filters: SearchFilters,
    pub page: u32,
    // Canonical query string for this snapshot
    pub query: String,
}

impl FilterSnapshot {
    fn new(filters: SearchFilters, page: u32) -> Self {
        let query = query_codec::serialize(&filters, page);
        Self { filters, page, query }
    }
}

pub struct FilterStateStore {
    sender: watch::Sender<FilterSnapshot>,
}

impl FilterStateStore {
    /// Starts from the query string of the URL the page was opened with.
    pub fn new(initial_query: &str) -> Self {
        let parsed = query_codec::parse(initial_query);
        let (sender, _) = watch::channel(FilterSnapshot::new(parsed.filters, parsed.page));
        Self { sender }
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterSnapshot> {
        self.sender.subscribe()
    }

    /// Re-parses the URL after a navigation. Returns true if subscribers were notified.
    ///
    /// Changed filters always restart at page 1; the URL's page only counts when the
    /// filters are unchanged.
    pub fn navigate(&self, query: &str) -> bool {
        let parsed = query_codec::parse(query);
        self.sender.send_if_modified(|current| {
            if parsed.filters != current.filters {
                tracing::debug!(query = %query, "Filters changed, restarting at page 1");
                *current = FilterSnapshot::new(parsed.filters, 1);
                true
            } else if parsed.page != current.page {
                tracing::debug!(page = parsed.page, "Page changed");
                *current = FilterSnapshot::new(current.filters.clone(), parsed.page);
                true
            } else {
                false
            }
        })
    }

    /// User edit: builds the URL for `filters` and navigates to it. Returns that query string.
    pub fn apply(&self, filters: &SearchFilters) -> String {
        let query = query_codec::serialize(filters, 1);
        self.navigate(&query);
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    #[test]
    fn initial_query_is_parsed() {
        let store = FilterStateStore::new("?bodyType=suv&page=3");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.filters, SearchFilters::new().with_body_type(["suv"]));
        assert_eq!(snapshot.page, 3);
        assert_eq!(snapshot.query, "bodyType=suv&page=3");
    }

    #[tokio::test]
    async fn filter_change_resets_page_and_notifies() {
        let store = FilterStateStore::new("bodyType=suv&page=3");
        let mut updates = store.subscribe();

        let query = store.apply(&SearchFilters::new().with_condition(Condition::New));
        assert_eq!(query, "condition=new&page=1");

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.page, 1);
        assert_eq!(snapshot.filters.condition(), Condition::New);
    }

    #[tokio::test]
    async fn navigating_to_a_different_page_of_new_filters_still_starts_at_one() {
        let store = FilterStateStore::new("");
        assert!(store.navigate("origin=china&page=4"));
        assert_eq!(store.snapshot().page, 1);

        // Same filters, different page: the page is honored
        assert!(store.navigate("origin=china&page=4"));
        assert_eq!(store.snapshot().page, 4);
    }

    #[tokio::test]
    async fn identical_navigation_does_not_notify() {
        let store = FilterStateStore::new("drivetrain=awd");
        let updates = store.subscribe();
        // Different spelling, same meaning
        assert!(!store.navigate("?drivetrain=awd&drivetrain=awd&page=1&unknown=x"));
        assert!(!updates.has_changed().unwrap());
    }
}
