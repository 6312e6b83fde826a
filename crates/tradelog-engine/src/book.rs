//! Shared, versioned trade book.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;
use tradelog_core::{TradeId, TradeRecord};
use tradelog_stats::{RecordSet, RecordSetId, StatsResult};

/// `(set id, version)` of the book after a mutation.
pub type BookChange = (RecordSetId, u64);

/// The current record set, replaced wholesale on every mutation.
///
/// Readers take an `Arc<RecordSet>` snapshot and keep a consistent view
/// while writers move the book to the next version. Every new version is
/// published to [`TradeBook::subscribe`] receivers.
#[derive(Debug)]
pub struct TradeBook {
    current: RwLock<Arc<RecordSet>>,
    changes: watch::Sender<BookChange>,
}

impl TradeBook {
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Self::from_set(RecordSet::new(records))
    }

    pub fn from_set(set: RecordSet) -> Self {
        let (changes, _) = watch::channel((set.id(), set.version()));
        Self {
            current: RwLock::new(Arc::new(set)),
            changes,
        }
    }

    /// Receiver of the book's identity after each mutation.
    pub fn subscribe(&self) -> watch::Receiver<BookChange> {
        self.changes.subscribe()
    }

    pub fn snapshot(&self) -> Arc<RecordSet> {
        Arc::clone(&self.current.read())
    }

    pub fn version(&self) -> u64 {
        self.current.read().version()
    }

    fn apply(
        &self,
        op: &'static str,
        f: impl FnOnce(&RecordSet) -> StatsResult<RecordSet>,
    ) -> StatsResult<u64> {
        let mut current = self.current.write();
        let next = f(&**current)?;
        let (id, version) = (next.id(), next.version());
        debug!(op, set_id = %id, version, records = next.len(), "Trade book updated");
        *current = Arc::new(next);
        drop(current);
        self.changes.send_replace((id, version));
        Ok(version)
    }

    /// Add a record. Returns the new version.
    pub fn insert(&self, record: TradeRecord) -> StatsResult<u64> {
        self.apply("insert", |set| set.insert(record))
    }

    /// Replace the record with the same id. Returns the new version.
    pub fn update(&self, record: TradeRecord) -> StatsResult<u64> {
        self.apply("update", |set| set.update(record))
    }

    /// Delete a record. Returns the new version.
    pub fn remove(&self, id: TradeId) -> StatsResult<u64> {
        self.apply("remove", |set| set.remove(id))
    }
}
