//! Browsing-session state for paged listing search.
//!
//! Data flows one way: a page fetch appends into the [`ResultStore`], the
//! [`FilterSynchronizer`] recomputes the visible subset from the full store,
//! and the [`PresentationAdapter`] diffs that subset against what it last
//! published. [`Session`] wires the three together as a synchronous state
//! machine; [`driver`] runs one on a tokio task behind a command channel.

pub mod driver;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod presentation;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use driver::{spawn_session, SessionCommand, SessionEvent, SessionHandle, SessionSnapshot};
pub use error::SessionError;
pub use filter::{FilterState, FilterSynchronizer};
pub use pagination::{PageCursor, PageOutcome, PageTicket, PaginationController};
pub use presentation::{MapRegion, PresentationAdapter, ResultsChanged, ScrollMetrics};
pub use session::Session;
pub use store::ResultStore;
