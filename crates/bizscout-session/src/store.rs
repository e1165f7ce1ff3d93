//! The authoritative, insertion-ordered list of fetched listings.

use std::collections::HashSet;
use std::sync::Arc;

use bizscout_core::{Item, ItemId};

/// Every listing fetched under the current criteria, in fetch order.
///
/// Append-only while paging; cleared wholesale when the criteria change.
/// An item whose id is already present is skipped on append.
#[derive(Debug, Default)]
pub struct ResultStore {
    items: Vec<Arc<Item>>,
    ids: HashSet<ItemId>,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `items` in order, skipping ids already stored. Returns how
    /// many were actually added.
    pub fn append<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = Item>,
    {
        let before = self.items.len();
        for item in items {
            if self.ids.contains(&item.id) {
                tracing::debug!(id = %item.id, "skipping listing already in result set");
                continue;
            }
            self.ids.insert(item.id.clone());
            self.items.push(Arc::new(item));
        }
        self.items.len() - before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::item;

    fn ids(store: &ResultStore) -> Vec<&str> {
        store.items().iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = ResultStore::new();
        store.append([item("a", "Alpha"), item("b", "Beta")]);
        store.append([item("c", "Gamma")]);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn append_skips_known_ids() {
        let mut store = ResultStore::new();
        store.append([item("a", "Alpha"), item("b", "Beta")]);
        let added = store.append([item("b", "Beta again"), item("c", "Gamma")]);
        assert_eq!(added, 1);
        assert_eq!(ids(&store), vec!["a", "b", "c"]);
        assert_eq!(store.items()[1].name, "Beta", "first copy wins");
    }

    #[test]
    fn clear_forgets_ids() {
        let mut store = ResultStore::new();
        store.append([item("a", "Alpha")]);
        store.clear();
        assert!(store.is_empty());
        assert!(!store.contains(&ItemId::new("a")));
        assert_eq!(store.append([item("a", "Alpha")]), 1);
    }
}
