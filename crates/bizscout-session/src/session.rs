//! The synchronous browsing-session state machine.

use std::sync::Arc;

use bizscout_core::{Item, SearchApi, SearchCriteria, SearchPage};

use crate::error::SessionError;
use crate::filter::{FilterState, FilterSynchronizer};
use crate::pagination::{PageCursor, PageOutcome, PageTicket, PaginationController};
use crate::presentation::{MapRegion, PresentationAdapter, ResultsChanged, ScrollMetrics};
use crate::store::ResultStore;

/// One browsing session: the fetched results, the page cursor, the text
/// filter and what was last published to the views.
///
/// Every mutation that can change the visible list returns the
/// [`ResultsChanged`] diff to publish. Fetching itself happens outside: the
/// caller runs the query in a [`PageTicket`] and hands the outcome back to
/// [`Session::complete_page`].
#[derive(Debug)]
pub struct Session {
    store: ResultStore,
    pagination: PaginationController,
    filter: FilterSynchronizer,
    presentation: PresentationAdapter,
}

impl Session {
    #[must_use]
    pub fn new(criteria: SearchCriteria, page_limit: u32) -> Self {
        Self {
            store: ResultStore::new(),
            pagination: PaginationController::new(criteria, page_limit),
            filter: FilterSynchronizer::new(),
            presentation: PresentationAdapter::new(),
        }
    }

    /// Starts the next page unless one is already in flight or the results
    /// are exhausted.
    pub fn request_next_page(&mut self) -> Option<PageTicket> {
        self.pagination.begin_next_page()
    }

    /// Starts the next page when the list is scrolled near its end.
    pub fn on_scroll(&mut self, metrics: &ScrollMetrics) -> Option<PageTicket> {
        if metrics.is_near_end() {
            self.request_next_page()
        } else {
            None
        }
    }

    /// Drops every result, rewinds to the first page and starts fetching it
    /// under `criteria`. The returned diff removes everything that was shown.
    pub fn apply_new_criteria(
        &mut self,
        criteria: SearchCriteria,
    ) -> (Option<PageTicket>, ResultsChanged) {
        tracing::info!(term = %criteria.term, location = %criteria.location, "criteria changed");
        let ticket = self
            .pagination
            .apply_new_criteria(criteria, &mut self.store);
        (ticket, self.republish())
    }

    /// Applies a finished fetch. Returns `Ok(None)` when the ticket was stale.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the result set and offset are unchanged.
    pub fn complete_page<E>(
        &mut self,
        ticket: PageTicket,
        result: Result<SearchPage, E>,
    ) -> Result<Option<ResultsChanged>, E> {
        match self.pagination.finish(ticket, result, &mut self.store)? {
            PageOutcome::Stale => Ok(None),
            PageOutcome::Appended { .. } => Ok(Some(self.republish())),
        }
    }

    /// Issues the reload deferred by a mid-fetch criteria change.
    pub fn take_pending_reload(&mut self) -> Option<PageTicket> {
        self.pagination.take_pending_reload()
    }

    pub fn set_query(&mut self, text: &str) -> ResultsChanged {
        self.filter.set_query(text, self.store.items());
        self.publish()
    }

    /// Fetches and applies the next page through `api`. Returns `Ok(None)`
    /// when no page was started.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Fetch`] if the search fails.
    pub async fn load_next_page<A>(&mut self, api: &A) -> Result<Option<ResultsChanged>, SessionError>
    where
        A: SearchApi + ?Sized,
    {
        let Some(ticket) = self.request_next_page() else {
            return Ok(None);
        };
        let result = api.search(ticket.query()).await;
        self.complete_page(ticket, result)
            .map_err(SessionError::fetch)
    }

    #[must_use]
    pub fn current_list(&self) -> &[Arc<Item>] {
        self.presentation.current_list()
    }

    #[must_use]
    pub fn current_annotations(&self) -> Vec<Arc<Item>> {
        self.presentation.current_annotations()
    }

    /// Every fetched item, ignoring the text filter.
    #[must_use]
    pub fn results(&self) -> &[Arc<Item>] {
        self.store.items()
    }

    #[must_use]
    pub fn filter_state(&self) -> &FilterState {
        self.filter.state()
    }

    #[must_use]
    pub fn cursor(&self) -> PageCursor {
        self.pagination.cursor()
    }

    #[must_use]
    pub fn criteria(&self) -> &SearchCriteria {
        self.pagination.criteria()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pagination.is_exhausted()
    }

    #[must_use]
    pub fn map_region(&self) -> MapRegion {
        MapRegion::around(self.criteria().location)
    }

    // The result set changed: reapply the query before publishing.
    fn republish(&mut self) -> ResultsChanged {
        self.filter.recompute(self.store.items());
        self.publish()
    }

    fn publish(&mut self) -> ResultsChanged {
        let current = self.filter.current(self.store.items());
        self.presentation.sync(current)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
