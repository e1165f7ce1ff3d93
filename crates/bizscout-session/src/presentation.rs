//! What the list and map views consume.
//!
//! The adapter remembers what it last published and turns each new list
//! into an add/remove diff, so unchanged annotations are never torn down and
//! re-added.

use std::collections::HashSet;
use std::sync::Arc;

use bizscout_core::{Coordinate, Item, ItemId};

/// Default map span around the search center, in degrees.
const DEFAULT_SPAN_DEGREES: f64 = 0.025;

/// One published change to the visible results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsChanged {
    /// The full list now visible, in order.
    pub list: Vec<Arc<Item>>,
    /// Annotations to add, in list order.
    pub added: Vec<Arc<Item>>,
    /// Annotations to remove, in their previous list order.
    pub removed: Vec<Arc<Item>>,
}

impl ResultsChanged {
    /// Nothing entered or left the view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PresentationAdapter {
    list: Vec<Arc<Item>>,
    annotated: HashSet<ItemId>,
}

impl PresentationAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_list(&self) -> &[Arc<Item>] {
        &self.list
    }

    /// Items currently on the map, in list order.
    #[must_use]
    pub fn current_annotations(&self) -> Vec<Arc<Item>> {
        self.list
            .iter()
            .filter(|item| self.annotated.contains(&item.id))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_annotated(&self, id: &ItemId) -> bool {
        self.annotated.contains(id)
    }

    /// Publishes `current` as the visible list and returns the diff against
    /// the previous one.
    pub fn sync(&mut self, current: &[Arc<Item>]) -> ResultsChanged {
        let next_ids: HashSet<&ItemId> = current.iter().map(|item| &item.id).collect();

        let removed: Vec<Arc<Item>> = self
            .list
            .iter()
            .filter(|item| !next_ids.contains(&item.id))
            .cloned()
            .collect();
        let added: Vec<Arc<Item>> = current
            .iter()
            .filter(|item| !self.annotated.contains(&item.id))
            .cloned()
            .collect();

        for item in &removed {
            self.annotated.remove(&item.id);
        }
        for item in &added {
            self.annotated.insert(item.id.clone());
        }
        self.list = current.to_vec();

        tracing::debug!(
            visible = self.list.len(),
            added = added.len(),
            removed = removed.len(),
            "presentation synced"
        );
        ResultsChanged {
            list: self.list.clone(),
            added,
            removed,
        }
    }
}

/// Scroll position of the rendered list, in the view's own units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub content_height: f64,
    pub viewport_height: f64,
    /// Distance from the top of the content to the top of the viewport.
    pub scroll_offset: f64,
    /// The user is actively dragging; programmatic scrolls never load.
    pub dragging: bool,
}

impl ScrollMetrics {
    /// Content left below the viewport is at most one viewport high.
    #[must_use]
    pub fn is_near_end(&self) -> bool {
        if !self.dragging {
            return false;
        }
        let remaining = self.content_height - (self.scroll_offset + self.viewport_height);
        remaining <= self.viewport_height
    }
}

/// Visible map area: a center and a span in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// The default region shown around a search center.
    #[must_use]
    pub fn around(center: Coordinate) -> Self {
        Self {
            center,
            latitude_delta: DEFAULT_SPAN_DEGREES,
            longitude_delta: DEFAULT_SPAN_DEGREES,
        }
    }

    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        (point.latitude - self.center.latitude).abs() <= self.latitude_delta / 2.0
            && (point.longitude - self.center.longitude).abs() <= self.longitude_delta / 2.0
    }
}
