//! Paginated search results for the current filter set.
//!
//! `refresh` (page 1) replaces the accumulated list and is used whenever the filters
//! change; `load_more` (page N+1) appends and is only triggered by the user. A filter
//! change bumps the generation, and any response carrying an older generation is
//! dropped, so a slow request for old filters can never overwrite newer results.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::filter_store::FilterSnapshot;
use crate::models::{CarSummary, SearchFilters, SearchResultPage};

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, filters: &SearchFilters, page: u32) -> Result<SearchResultPage, ClientError>;
}

/// Accumulated results for the current filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub filters: SearchFilters,
    // Last page applied; 0 before the first response
    pub page: u32,
    pub cars: Vec<CarSummary>,
    pub total_count: u64,
    pub can_load_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
}

/// What happened to a request once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Applied,
    // A newer filter set took over while the request was in flight
    Superseded,
    Failed,
    // load_more had nothing to do
    Skipped,
}

struct Inner {
    state: SearchState,
    generation: u64,
}

#[derive(Clone)]
pub struct SearchResultAggregator {
    inner: Arc<Mutex<Inner>>,
    backend: Arc<dyn SearchBackend>,
}

impl SearchResultAggregator {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { state: SearchState::default(), generation: 0 })),
            backend,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SearchState {
        self.lock().state.clone()
    }

    pub fn can_load_more(&self) -> bool {
        self.lock().state.can_load_more
    }

    /// Starts a fresh result set for `filters` (page 1).
    pub async fn refresh(&self, filters: SearchFilters) -> SearchOutcome {
        let ticket = self.begin_refresh(&filters);
        self.finish_refresh(ticket, filters).await
    }

    // Claims the next generation for `filters`. Everything issued before is stale from here on.
    fn begin_refresh(&self, filters: &SearchFilters) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state.filters = filters.clone();
        inner.state.loading = true;
        inner.state.loading_more = false;
        inner.state.error = None;
        inner.generation
    }

    async fn finish_refresh(&self, ticket: u64, filters: SearchFilters) -> SearchOutcome {
        tracing::debug!(generation = ticket, "Refreshing search results");
        let result = self.backend.search(&filters, 1).await;
        self.settle(ticket, 1, result)
    }

    /// Fetches the next page for the current filters and appends it.
    pub async fn load_more(&self) -> SearchOutcome {
        let (ticket, filters, next_page) = {
            let mut inner = self.lock();
            let state = &mut inner.state;
            if !state.can_load_more || state.loading || state.loading_more {
                return SearchOutcome::Skipped;
            }
            state.loading_more = true;
            let request = (state.filters.clone(), state.page + 1);
            (inner.generation, request.0, request.1)
        };

        tracing::debug!(generation = ticket, page = next_page, "Loading more search results");
        let result = self.backend.search(&filters, next_page).await;
        self.settle(ticket, next_page, result)
    }

    fn settle(&self, ticket: u64, page: u32, result: Result<SearchResultPage, ClientError>) -> SearchOutcome {
        let mut inner = self.lock();
        if inner.generation != ticket {
            tracing::debug!(generation = ticket, current = inner.generation, page, "Dropping stale search response");
            return SearchOutcome::Superseded;
        }

        let state = &mut inner.state;
        if page == 1 {
            state.loading = false;
        } else {
            state.loading_more = false;
        }

        match result {
            Ok(response) => {
                if page == 1 {
                    state.cars = response.cars;
                } else {
                    state.cars.extend(response.cars);
                }
                state.page = page;
                state.total_count = response.total_count;
                let accumulated = state.cars.len() as u64;
                if accumulated > state.total_count {
                    tracing::warn!(accumulated, total_count = state.total_count, "Server total is below accumulated results");
                    state.total_count = accumulated;
                }
                state.can_load_more = accumulated < state.total_count;
                state.error = None;
                tracing::info!(page, shown = accumulated, total = state.total_count, "Search results updated");
                SearchOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Search request failed");
                state.error = Some(e.user_message());
                state.cars.clear();
                state.total_count = 0;
                state.can_load_more = false;
                state.page = 0;
                SearchOutcome::Failed
            }
        }
    }

    /// Refreshes whenever the filter store publishes a different filter set.
    ///
    /// The generation is claimed here, in the order changes are observed, before the
    /// request task is spawned. The previous request is aborted since its answer can
    /// no longer apply.
    pub fn follow(&self, mut updates: watch::Receiver<FilterSnapshot>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut last: Option<SearchFilters> = None;
            let mut in_flight: Option<JoinHandle<()>> = None;
            loop {
                let filters = updates.borrow_and_update().filters.clone();
                if last.as_ref() != Some(&filters) {
                    last = Some(filters.clone());
                    if let Some(task) = in_flight.take() {
                        task.abort();
                    }
                    let ticket = this.begin_refresh(&filters);
                    let aggregator = this.clone();
                    in_flight = Some(tokio::spawn(async move {
                        aggregator.finish_refresh(ticket, filters).await;
                    }));
                }
                if updates.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
