//! Page cursor and the single-flight rule.
//!
//! Fetching is split into [`PaginationController::begin_next_page`], which
//! hands out a [`PageTicket`] only when nothing is in flight, and
//! [`PaginationController::finish`], which applies the outcome. The ticket
//! carries the criteria generation it was issued under, so a completion that
//! arrives after a criteria change is recognised as stale and dropped.

use bizscout_core::{PageQuery, SearchCriteria, SearchPage};

use crate::store::ResultStore;

/// Pagination progress. `offset` only moves after a successful fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCursor {
    pub offset: usize,
    pub in_flight: bool,
}

/// Permission to run exactly one page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTicket {
    generation: u64,
    query: PageQuery,
}

impl PageTicket {
    #[must_use]
    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a successful [`PaginationController::finish`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page landed. `added` excludes ids already in the store.
    Appended { added: usize, raw_count: usize },
    /// The ticket predates the current criteria; nothing changed.
    Stale,
}

#[derive(Debug)]
pub struct PaginationController {
    cursor: PageCursor,
    criteria: SearchCriteria,
    page_limit: u32,
    generation: u64,
    exhausted: bool,
    /// A criteria change arrived while a fetch was in flight.
    reload_pending: bool,
}

impl PaginationController {
    #[must_use]
    pub fn new(criteria: SearchCriteria, page_limit: u32) -> Self {
        Self {
            cursor: PageCursor::default(),
            criteria,
            page_limit: page_limit.max(1),
            generation: 0,
            exhausted: false,
            reload_pending: false,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    #[must_use]
    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    /// The API has no more listings for the current criteria.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    /// Marks a fetch in flight and returns its ticket, or `None` when a fetch
    /// is already outstanding or the results are exhausted.
    pub fn begin_next_page(&mut self) -> Option<PageTicket> {
        if self.cursor.in_flight {
            tracing::debug!(offset = self.cursor.offset, "page fetch already in flight");
            return None;
        }
        if self.exhausted {
            tracing::debug!(offset = self.cursor.offset, "no more pages for criteria");
            return None;
        }

        self.cursor.in_flight = true;
        self.reload_pending = false;
        let ticket = PageTicket {
            generation: self.generation,
            query: PageQuery {
                criteria: self.criteria.clone(),
                offset: self.cursor.offset,
                limit: self.page_limit,
            },
        };
        tracing::debug!(
            generation = ticket.generation,
            offset = ticket.query.offset,
            "page fetch started"
        );
        Some(ticket)
    }

    /// Switches to `criteria`: empties `store`, rewinds to offset 0 and starts
    /// the first page.
    ///
    /// If a fetch is still in flight the first page is deferred until that
    /// fetch is finished; see [`Self::take_pending_reload`].
    pub fn apply_new_criteria(
        &mut self,
        criteria: SearchCriteria,
        store: &mut ResultStore,
    ) -> Option<PageTicket> {
        store.clear();
        self.criteria = criteria;
        self.generation += 1;
        self.cursor.offset = 0;
        self.exhausted = false;

        if self.cursor.in_flight {
            tracing::debug!(
                generation = self.generation,
                "criteria changed mid-fetch, deferring reload"
            );
            self.reload_pending = true;
            return None;
        }
        self.begin_next_page()
    }

    /// Issues the reload deferred by [`Self::apply_new_criteria`], once
    /// nothing is in flight.
    pub fn take_pending_reload(&mut self) -> Option<PageTicket> {
        if self.reload_pending && !self.cursor.in_flight {
            self.begin_next_page()
        } else {
            None
        }
    }

    /// Applies the outcome of the fetch `ticket` was issued for.
    ///
    /// Always clears the in-flight flag. On success the page's items are
    /// appended and the offset advances by the page's raw listing count.
    ///
    /// # Errors
    ///
    /// Returns the fetch error unchanged; store and offset are untouched.
    /// Errors from stale tickets are swallowed as [`PageOutcome::Stale`].
    pub fn finish<E>(
        &mut self,
        ticket: PageTicket,
        result: Result<SearchPage, E>,
        store: &mut ResultStore,
    ) -> Result<PageOutcome, E> {
        self.cursor.in_flight = false;

        if ticket.generation != self.generation {
            tracing::debug!(
                ticket_generation = ticket.generation,
                generation = self.generation,
                "dropping stale page completion"
            );
            return Ok(PageOutcome::Stale);
        }

        let page = result?;
        let raw_count = page.raw_count;
        let added = store.append(page.items);
        self.cursor.offset += raw_count;

        let reached_total = page
            .total
            .is_some_and(|total| self.cursor.offset >= total as usize);
        if raw_count == 0 || reached_total {
            self.exhausted = true;
        }

        tracing::debug!(
            offset = self.cursor.offset,
            added,
            raw_count,
            exhausted = self.exhausted,
            "page fetch finished"
        );
        Ok(PageOutcome::Appended { added, raw_count })
    }
}
