//! Versioned record-set snapshots.
//!
//! A `RecordSet` is never mutated in place. `insert`, `update` and `remove`
//! return a new snapshot with the same id and the next version, sharing
//! nothing mutable with the old one. Cached aggregates keyed by the old
//! `(id, version)` therefore can never describe the new contents.

use crate::error::{StatsError, StatsResult};
use std::sync::Arc;
use tradelog_core::{TradeId, TradeRecord};
use uuid::Uuid;

/// Identity of a record collection across its versions.
pub type RecordSetId = Uuid;

#[derive(Debug, Clone)]
pub struct RecordSet {
    id: RecordSetId,
    version: u64,
    records: Arc<Vec<TradeRecord>>,
}

impl RecordSet {
    /// New set with a fresh id at version 1.
    pub fn new(records: Vec<TradeRecord>) -> Self {
        Self::with_id(Uuid::new_v4(), records)
    }

    pub fn with_id(id: RecordSetId, records: Vec<TradeRecord>) -> Self {
        Self {
            id,
            version: 1,
            records: Arc::new(records),
        }
    }

    pub fn id(&self) -> RecordSetId {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: TradeId) -> Option<&TradeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// True if both snapshots are the same version of the same set.
    pub fn same_identity(&self, other: &RecordSet) -> bool {
        self.id == other.id && self.version == other.version
    }

    fn next(&self, records: Vec<TradeRecord>) -> Self {
        Self {
            id: self.id,
            version: self.version + 1,
            records: Arc::new(records),
        }
    }

    /// Snapshot with `record` appended.
    pub fn insert(&self, record: TradeRecord) -> StatsResult<Self> {
        if self.get(record.id).is_some() {
            return Err(StatsError::DuplicateRecord(record.id));
        }
        let mut records = self.records.as_ref().clone();
        records.push(record);
        Ok(self.next(records))
    }

    /// Snapshot with the record of the same id replaced.
    pub fn update(&self, record: TradeRecord) -> StatsResult<Self> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == record.id)
            .ok_or(StatsError::RecordNotFound(record.id))?;
        let mut records = self.records.as_ref().clone();
        records[pos] = record;
        Ok(self.next(records))
    }

    /// Snapshot without the record `id`.
    pub fn remove(&self, id: TradeId) -> StatsResult<Self> {
        if self.get(id).is_none() {
            return Err(StatsError::RecordNotFound(id));
        }
        let records = self.records.iter().filter(|r| r.id != id).cloned().collect();
        Ok(self.next(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tradelog_core::{Market, Pnl, Side};

    fn trade(pnl: rust_decimal::Decimal) -> TradeRecord {
        TradeRecord::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "BTC",
            Market::Crypto,
            Side::Buy,
            Pnl::new(pnl),
        )
    }

    #[test]
    fn test_mutations_bump_version_and_keep_id() {
        let set = RecordSet::new(vec![trade(dec!(10))]);
        let extra = trade(dec!(-5));
        let extra_id = extra.id;

        let inserted = set.insert(extra).unwrap();
        assert_eq!(inserted.id(), set.id());
        assert_eq!(inserted.version(), 2);
        assert_eq!(inserted.len(), 2);
        // The original snapshot is untouched.
        assert_eq!(set.len(), 1);

        let mut changed = inserted.get(extra_id).unwrap().clone();
        changed.pnl = Pnl::new(dec!(7));
        let updated = inserted.update(changed).unwrap();
        assert_eq!(updated.version(), 3);
        assert_eq!(updated.get(extra_id).unwrap().pnl, Pnl::new(dec!(7)));

        let removed = updated.remove(extra_id).unwrap();
        assert_eq!(removed.version(), 4);
        assert!(removed.get(extra_id).is_none());
        assert!(!removed.same_identity(&updated));
    }

    #[test]
    fn test_mutation_errors() {
        let first = trade(dec!(1));
        let set = RecordSet::new(vec![first.clone()]);
        assert_eq!(
            set.insert(first.clone()).unwrap_err(),
            StatsError::DuplicateRecord(first.id)
        );

        let missing = trade(dec!(2));
        assert_eq!(
            set.remove(missing.id).unwrap_err(),
            StatsError::RecordNotFound(missing.id)
        );
        assert!(set.update(missing).is_err());
        assert_eq!(set.version(), 1);
    }
}
