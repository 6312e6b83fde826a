//! Query-string synchronization for the trade list view.
//!
//! - `encode` / `decode`: canonical, deterministic mapping between a
//!   `ViewState` and a query string
//! - `UrlSynchronizer`: writes the encoded view to a `HistorySink`, using
//!   replace semantics for in-page changes and push for navigation

pub mod codec;
pub mod history;
pub mod query;
pub mod sync;

pub use history::{HistoryEntry, HistoryMode, HistorySink, MemoryHistory};
pub use query::{decode, encode, LEGACY_ALIASES};
pub use sync::{SyncOutcome, UrlSynchronizer};
