//! URL synchronizer: keeps the location in step with the view.

use crate::history::{HistoryMode, HistorySink};
use crate::query::{decode, encode};
use std::sync::Arc;
use tracing::{debug, warn};
use tradelog_core::{Validated, ViewState};
use tradelog_telemetry::Metrics;

/// Result of a sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The location was updated to this query.
    Written(String),
    /// The location already showed this exact query.
    Unchanged,
}

/// Writes the canonical encoding of each accepted view to a history sink.
pub struct UrlSynchronizer {
    history: Arc<dyn HistorySink>,
    last_written: Option<String>,
}

impl UrlSynchronizer {
    pub fn new(history: Arc<dyn HistorySink>) -> Self {
        let last_written = history.current();
        Self {
            history,
            last_written,
        }
    }

    /// Decode the sink's current location into an initial view.
    ///
    /// Returns `None` when there is no location or it carries no
    /// parameters at all, so the caller can fall back to stored state.
    pub fn initial(&self) -> Option<Validated<ViewState>> {
        let query = self.history.current()?;
        let trimmed = query.trim_start_matches('?');
        if trimmed.is_empty() {
            return None;
        }
        let validated = decode(trimmed);
        for rejection in &validated.rejections {
            Metrics::validation_rejected("url", &rejection.field);
            warn!(field = %rejection.field, error = %rejection.error, "Dropped malformed URL parameter");
        }
        Some(validated)
    }

    /// Encode `view` and write it with `mode`.
    ///
    /// An identical consecutive `Replace` is skipped so re-rendering the
    /// same state never produces a history write.
    pub fn sync(&mut self, view: &ViewState, mode: HistoryMode) -> SyncOutcome {
        let query = encode(view);
        if mode == HistoryMode::Replace && self.last_written.as_deref() == Some(query.as_str()) {
            return SyncOutcome::Unchanged;
        }
        debug!(query = %query, ?mode, "Syncing URL");
        self.history.write(&query, mode);
        Metrics::url_written(mode.as_str());
        self.last_written = Some(query.clone());
        SyncOutcome::Written(query)
    }

    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }
}
