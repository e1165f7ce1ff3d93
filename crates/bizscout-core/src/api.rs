//! The seam between the session logic and whatever answers searches.
//!
//! `bizscout-client` implements [`SearchApi`] over HTTP; session tests use a
//! scripted in-memory implementation.

use async_trait::async_trait;

use crate::criteria::SearchCriteria;
use crate::item::{Item, ItemId, Review};

/// One page request: criteria plus position.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub criteria: SearchCriteria,
    pub offset: usize,
    pub limit: u32,
}

/// One decoded page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Listings that decoded cleanly, in API order.
    pub items: Vec<Item>,
    /// Number of listings the API returned, including dropped malformed ones.
    /// The page offset advances by this amount.
    pub raw_count: usize,
    /// Total matches the API reports for the criteria, when present.
    pub total: Option<u32>,
}

impl SearchPage {
    /// A page built from already-valid items, where nothing was dropped.
    #[must_use]
    pub fn from_items(items: Vec<Item>) -> Self {
        let raw_count = items.len();
        Self {
            items,
            raw_count,
            total: None,
        }
    }
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn search(&self, query: &PageQuery) -> Result<SearchPage, Self::Error>;

    async fn reviews(&self, id: &ItemId) -> Result<Vec<Review>, Self::Error>;
}
