//! Client-side text filtering over the fetched result set.

use std::sync::Arc;

use bizscout_core::Item;

/// The text query and whether it currently narrows the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub query: String,
    /// `true` only when the matching subset differs in membership from the
    /// full set. An empty query, a query matching nothing and a query
    /// matching everything all leave this `false`.
    pub active: bool,
}

/// Keeps the filtered subset in step with the query and the result set.
///
/// Every recomputation starts from the full set handed in, never from the
/// previous subset, so narrowing and widening the query behave the same.
#[derive(Debug, Default)]
pub struct FilterSynchronizer {
    state: FilterState,
    subset: Vec<Arc<Item>>,
}

impl FilterSynchronizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Replaces the query and recomputes against `full`.
    pub fn set_query(&mut self, text: &str, full: &[Arc<Item>]) {
        text.clone_into(&mut self.state.query);
        self.recompute(full);
    }

    /// Reapplies the current query to a changed `full` set.
    pub fn recompute(&mut self, full: &[Arc<Item>]) {
        let matches = matching_items(full, &self.state.query);

        // A zero-match query falls back to showing everything.
        self.state.active = !matches.is_empty() && matches.len() != full.len();
        self.subset = if self.state.active { matches } else { Vec::new() };

        tracing::debug!(
            query = %self.state.query,
            active = self.state.active,
            visible = self.subset.len(),
            total = full.len(),
            "filter recomputed"
        );
    }

    /// The list to present: the subset while active, otherwise `full`.
    #[must_use]
    pub fn current<'a>(&'a self, full: &'a [Arc<Item>]) -> &'a [Arc<Item>] {
        if self.state.active {
            &self.subset
        } else {
            full
        }
    }
}

/// Items whose display name contains `query`, ignoring case, in order.
/// An empty query matches nothing.
#[must_use]
pub fn matching_items(full: &[Arc<Item>], query: &str) -> Vec<Arc<Item>> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    full.iter()
        .filter(|item| item.name_contains(&needle))
        .cloned()
        .collect()
}
