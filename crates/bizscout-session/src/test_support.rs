//! Fixtures and a scripted [`SearchApi`] for session tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bizscout_core::{
    Coordinate, Item, ItemId, PageQuery, Review, SearchApi, SearchCriteria, SearchPage,
};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("fake failure: {0}")]
pub struct FakeError(pub String);

pub fn item(id: &str, name: &str) -> Item {
    Item::new(id, name, Coordinate::new(37.78, -122.39))
}

pub fn page(entries: &[(&str, &str)]) -> SearchPage {
    SearchPage::from_items(entries.iter().map(|(id, name)| item(id, name)).collect())
}

pub fn criteria(term: &str) -> SearchCriteria {
    SearchCriteria::new(term, Coordinate::new(37.7838, -122.3875))
}

/// Answers searches from a queue of scripted results. An empty queue yields
/// an empty page.
///
/// When gated, every search waits for [`ScriptedApi::release`] before
/// answering, which lets tests hold a fetch in flight.
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<SearchPage, FakeError>>>,
    queries: Mutex<Vec<PageQuery>>,
    gate: Option<Semaphore>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(responses: Vec<Result<SearchPage, FakeError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
            gate: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn gated(responses: Vec<Result<SearchPage, FakeError>>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(responses)
        }
    }

    /// Lets one gated search answer.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchApi for ScriptedApi {
    type Error = FakeError;

    async fn search(&self, query: &PageQuery) -> Result<SearchPage, FakeError> {
        self.queries.lock().unwrap().push(query.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let next = self.responses.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Ok(SearchPage::default()))
    }

    async fn reviews(&self, _id: &ItemId) -> Result<Vec<Review>, FakeError> {
        Ok(Vec::new())
    }
}
