//! Memoized aggregation over trade records.
//!
//! - `RecordSet`: an immutable, versioned snapshot of the journal
//! - `Fingerprint`: cache key over record-set identity, criteria and sort
//! - `Statistics`: P&L totals, win rate and per-emotion distribution
//! - `AggregationMemoizer`: LRU cache of filtered views and their statistics

pub mod error;
pub mod fingerprint;
pub mod memo;
pub mod record_set;
pub mod spread;
pub mod statistics;

pub use error::{StatsError, StatsResult};
pub use fingerprint::Fingerprint;
pub use memo::{AggregationMemoizer, CacheStats, MemoView, DEFAULT_CACHE_CAPACITY};
pub use record_set::{RecordSet, RecordSetId};
pub use spread::{apply_spread, hash01, SPREAD_EPSILON, SPREAD_WIDTH};
pub use statistics::{DistributionEntry, Statistics, SymbolTotal};
