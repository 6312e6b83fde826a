//! Persistence store for the last-used filter and sort.
//!
//! Payload layout (version 1):
//!
//! ```json
//! {"version":1,"criteria":{"symbols":["BTC"],"side":["Buy"]},"sort":"pnl:desc","savedAt":"..."}
//! ```
//!
//! `load` does not trust the payload: it is fed through the validator like
//! any other untyped input, and a payload with another `version` is
//! discarded rather than misread.

use crate::error::{PersistenceError, PersistenceResult};
use crate::storage::KeyValueStorage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use tradelog_core::params::SORT;
use tradelog_core::{validate_filter_and_sort, FilterCriteria, RawValue, SortSpec};
use tradelog_telemetry::Metrics;

/// Namespaced storage key.
pub const STORAGE_KEY: &str = "tradelog.view";

/// Current payload schema version.
pub const PAYLOAD_VERSION: u64 = 1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    version: u64,
    criteria: &'a FilterCriteria,
    sort: SortSpec,
    saved_at: DateTime<Utc>,
}

/// Filter and sort restored from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredView {
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
}

/// Saves and restores the last-used view.
pub struct PersistenceStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    /// Set after the first storage failure; later calls become no-ops.
    degraded: AtomicBool,
    failures: AtomicU64,
}

impl PersistenceStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            degraded: AtomicBool::new(false),
            failures: AtomicU64::new(0),
        }
    }

    /// True once storage has failed this session.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Number of storage failures swallowed so far.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    fn degrade(&self, op: &'static str, error: &PersistenceError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        Metrics::storage_failed(op);
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(op, %error, "Storage failed, persistence disabled for this session");
        }
    }

    /// Save filter and sort. The page number is deliberately not stored.
    ///
    /// Failures are logged and swallowed.
    pub fn save(&self, criteria: &FilterCriteria, sort: &SortSpec) {
        if self.is_degraded() {
            return;
        }
        if let Err(e) = self.try_save(criteria, sort) {
            self.degrade("save", &e);
        }
    }

    fn try_save(&self, criteria: &FilterCriteria, sort: &SortSpec) -> PersistenceResult<()> {
        let payload = Payload {
            version: PAYLOAD_VERSION,
            criteria,
            sort: *sort,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&payload)?;
        self.storage.set(&self.key, &json)?;
        debug!(key = %self.key, bytes = json.len(), "Saved view");
        Ok(())
    }

    /// Load the last saved view, or `None` if nothing usable is stored.
    pub fn load(&self) -> Option<StoredView> {
        if self.is_degraded() {
            return None;
        }
        match self.try_load() {
            Ok(view) => view,
            Err(PersistenceError::IncompatibleVersion { found, expected }) => {
                warn!(?found, expected, "Discarding stored view from another schema version");
                None
            }
            Err(PersistenceError::Json(e)) => {
                warn!(%e, "Discarding corrupt stored view");
                None
            }
            Err(e) => {
                self.degrade("load", &e);
                None
            }
        }
    }

    fn try_load(&self) -> PersistenceResult<Option<StoredView>> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&raw)?;

        let version = value.get("version").and_then(serde_json::Value::as_u64);
        if version != Some(PAYLOAD_VERSION) {
            return Err(PersistenceError::IncompatibleVersion {
                found: version,
                expected: PAYLOAD_VERSION,
            });
        }

        let mut params = value
            .get("criteria")
            .map(RawValue::params_from_json)
            .unwrap_or_default();
        if let Some(sort) = value.get(SORT).and_then(RawValue::from_json) {
            params.insert(SORT.to_string(), sort);
        }

        let validated = validate_filter_and_sort(&params);
        for rejection in &validated.rejections {
            Metrics::validation_rejected("storage", &rejection.field);
            warn!(field = %rejection.field, error = %rejection.error, "Dropped malformed stored field");
        }
        let (criteria, sort) = validated.value;
        Ok(Some(StoredView { criteria, sort }))
    }

    /// Remove the stored view.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.key) {
            self.degrade("clear", &e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use tradelog_core::{Market, Pnl, Side, SortDirection, SortField};

    fn sample_criteria() -> FilterCriteria {
        FilterCriteria::new()
            .with_symbols(["BTC", "ETH"])
            .with_markets([Market::Crypto])
            .with_sides([Side::Sell])
            .with_emotions(["fomo", "revenge trading"])
            .with_strategy(Some("breakout"))
            .unwrap()
            .with_date_range(NaiveDate::from_ymd_opt(2024, 1, 1), NaiveDate::from_ymd_opt(2024, 6, 30))
            .unwrap()
            .with_pnl_range(Some(Pnl::new(dec!(-100.25))), Some(Pnl::new(dec!(500))))
            .unwrap()
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = PersistenceStore::new(Arc::new(MemoryStorage::new()));
        let criteria = sample_criteria();
        let sort = SortSpec::new(SortField::Pnl, SortDirection::Desc);

        store.save(&criteria, &sort);
        let loaded = store.load().unwrap();
        assert_eq!(loaded, StoredView { criteria, sort });
    }

    #[test]
    fn test_load_empty_is_none() {
        let store = PersistenceStore::new(Arc::new(MemoryStorage::new()));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_payload_has_no_page() {
        let storage = Arc::new(MemoryStorage::new());
        let store = PersistenceStore::new(storage.clone());
        store.save(&FilterCriteria::new(), &SortSpec::default());

        let raw = storage.raw(STORAGE_KEY).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["sort"], "date:desc");
        assert!(json.get("page").is_none());
        assert!(json["criteria"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_incompatible_version_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(STORAGE_KEY, r#"{"version":2,"criteria":{"symbols":["BTC"]}}"#)
            .unwrap();
        let store = PersistenceStore::new(storage);
        assert!(store.load().is_none());
        assert!(!store.is_degraded());
    }

    #[test]
    fn test_corrupt_payload_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(STORAGE_KEY, "{not json").unwrap();
        let store = PersistenceStore::new(storage);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_partially_corrupt_payload_keeps_valid_fields() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                STORAGE_KEY,
                r#"{"version":1,"criteria":{"symbols":["SOL"],"side":["Up"]},"sort":"volume:asc"}"#,
            )
            .unwrap();
        let store = PersistenceStore::new(storage);
        let loaded = store.load().unwrap();
        assert!(loaded.criteria.symbols().contains("SOL"));
        assert!(loaded.criteria.sides().is_empty());
        assert_eq!(loaded.sort, SortSpec::default());
    }

    #[test]
    fn test_unavailable_storage_degrades_silently() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_unavailable(true);
        let store = PersistenceStore::new(storage.clone());

        store.save(&sample_criteria(), &SortSpec::default());
        assert!(store.is_degraded());
        assert_eq!(store.failure_count(), 1);

        // Storage recovering mid-session does not re-enable persistence.
        storage.set_unavailable(false);
        store.save(&sample_criteria(), &SortSpec::default());
        assert!(store.load().is_none());
        assert_eq!(store.failure_count(), 1);
    }

    #[test]
    fn test_quota_exceeded_degrades_silently() {
        let store = PersistenceStore::new(Arc::new(MemoryStorage::with_quota(16)));
        store.save(&sample_criteria(), &SortSpec::default());
        assert!(store.is_degraded());
    }

    #[test]
    fn test_file_backed_round_trip_across_instances() {
        let dir = TempDir::new().unwrap();
        let criteria = sample_criteria();
        let sort = SortSpec::new(SortField::Symbol, SortDirection::Asc);

        PersistenceStore::new(Arc::new(FileStorage::new(dir.path()))).save(&criteria, &sort);
        let loaded = PersistenceStore::new(Arc::new(FileStorage::new(dir.path())))
            .load()
            .unwrap();
        assert_eq!(loaded.criteria, criteria);
        assert_eq!(loaded.sort, sort);
    }

    #[test]
    fn test_clear() {
        let store = PersistenceStore::new(Arc::new(MemoryStorage::new()));
        store.save(&sample_criteria(), &SortSpec::default());
        store.clear();
        assert!(store.load().is_none());
    }
}
