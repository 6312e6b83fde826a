//! Aggregation memoizer.
//!
//! Filtered-sorted views and their statistics are cached under a
//! [`Fingerprint`] in a bounded LRU. A lookup with the same record-set
//! version, criteria and sort returns the same `Arc` without touching the
//! records. Seeing a newer version of a set purges every entry of the
//! older versions, so statistics can never outlive the data they describe.

use crate::fingerprint::Fingerprint;
use crate::record_set::{RecordSet, RecordSetId};
use crate::statistics::Statistics;
use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;
use tradelog_core::{FilterCriteria, SortSpec, TradeRecord};
use tradelog_telemetry::Metrics;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// A cached filtered and sorted view of one record-set version.
#[derive(Debug)]
pub struct MemoView {
    pub fingerprint: Fingerprint,
    /// Positions in the record set of the matching records, in sort order.
    pub indices: Vec<usize>,
    pub statistics: Arc<Statistics>,
}

impl MemoView {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Records of the view, resolved against the set it was built from.
    pub fn records<'a>(&'a self, set: &'a RecordSet) -> impl Iterator<Item = &'a TradeRecord> + 'a {
        let records = set.records();
        self.indices.iter().filter_map(move |&i| records.get(i))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped for capacity.
    pub evictions: u64,
    /// Entries purged after a record-set change or explicit invalidation.
    pub invalidations: u64,
    pub live: usize,
}

pub struct AggregationMemoizer {
    cache: LruCache<Fingerprint, Arc<MemoView>>,
    /// Newest version seen per record set.
    latest: HashMap<RecordSetId, u64>,
    hits: u64,
    misses: u64,
    evictions: u64,
    invalidations: u64,
}

impl Default for AggregationMemoizer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl AggregationMemoizer {
    /// Create a memoizer holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            latest: HashMap::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            invalidations: 0,
        }
    }

    /// Statistics of the records of `set` matching `criteria`.
    pub fn compute(
        &mut self,
        set: &RecordSet,
        criteria: &FilterCriteria,
        sort: &SortSpec,
    ) -> Arc<Statistics> {
        Arc::clone(&self.view(set, criteria, sort).statistics)
    }

    /// Filtered, sorted view of `set` with its statistics.
    pub fn view(
        &mut self,
        set: &RecordSet,
        criteria: &FilterCriteria,
        sort: &SortSpec,
    ) -> Arc<MemoView> {
        self.observe_version(set);
        let fingerprint = Fingerprint::new(set, criteria, sort);

        if let Some(view) = self.cache.get(&fingerprint) {
            self.hits += 1;
            Metrics::cache_hit();
            debug!(%fingerprint, "Aggregation cache hit");
            return Arc::clone(view);
        }

        self.misses += 1;
        Metrics::cache_miss();
        let view = Arc::new(build(set, criteria, sort, fingerprint));
        debug!(%fingerprint, matched = view.len(), "Aggregation cache miss");

        if self.is_outdated(set) {
            debug!(%fingerprint, "Not caching view of an outdated record set");
            return view;
        }
        if let Some((evicted, _)) = self.cache.push(fingerprint, Arc::clone(&view)) {
            if evicted != fingerprint {
                self.evictions += 1;
                Metrics::cache_evicted();
            }
        }
        view
    }

    /// Drop every entry of record set `id`. Returns the number purged.
    pub fn invalidate(&mut self, id: RecordSetId) -> usize {
        self.latest.remove(&id);
        self.purge(|fp| fp.set_id == id)
    }

    /// Note that set `id` moved to `version`, purging every entry of older
    /// versions. Called by record owners on mutation; a version at or below
    /// the newest one seen is a no-op. Returns the number purged.
    pub fn record_set_changed(&mut self, id: RecordSetId, version: u64) -> usize {
        let latest = *self.latest.entry(id).or_insert(version);
        if version <= latest {
            return 0;
        }
        self.latest.insert(id, version);
        let purged = self.purge(|fp| fp.set_id == id && fp.version < version);
        debug!(set_id = %id, version, purged, "Record set changed, purged older entries");
        purged
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.latest.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            invalidations: self.invalidations,
            live: self.cache.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    fn is_outdated(&self, set: &RecordSet) -> bool {
        self.latest
            .get(&set.id())
            .is_some_and(|&latest| set.version() < latest)
    }

    fn observe_version(&mut self, set: &RecordSet) {
        self.record_set_changed(set.id(), set.version());
    }

    fn purge(&mut self, stale: impl Fn(&Fingerprint) -> bool) -> usize {
        let keys: Vec<Fingerprint> = self
            .cache
            .iter()
            .filter(|(fp, _)| stale(fp))
            .map(|(fp, _)| *fp)
            .collect();
        for fp in &keys {
            self.cache.pop(fp);
        }
        self.invalidations += keys.len() as u64;
        Metrics::cache_invalidated(keys.len());
        keys.len()
    }
}

fn build(
    set: &RecordSet,
    criteria: &FilterCriteria,
    sort: &SortSpec,
    fingerprint: Fingerprint,
) -> MemoView {
    let records = set.records();
    let mut indices: Vec<usize> = (0..records.len())
        .filter(|&i| criteria.matches(&records[i]))
        .collect();
    sort.sort_indices(records, &mut indices);
    let statistics = Arc::new(Statistics::from_records(indices.iter().map(|&i| &records[i])));
    MemoView {
        fingerprint,
        indices,
        statistics,
    }
}
