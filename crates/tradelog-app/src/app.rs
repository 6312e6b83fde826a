//! Application wiring: trade book, record source, URL, storage and engine.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::script::Action;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tradelog_core::{PageWindow, TradeRecord};
use tradelog_engine::{
    EngineStatus, InMemoryRecordSource, OrchestratorHandle, QueryMachine, QueryOrchestrator,
    TradeBook,
};
use tradelog_persistence::{FileStorage, PersistenceStore};
use tradelog_stats::{CacheStats, Statistics};
use tradelog_url::{HistorySink, MemoryHistory, UrlSynchronizer};

/// Read a JSON array of trade records.
pub fn load_trades(path: impl AsRef<Path>) -> AppResult<Vec<TradeRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Trades(format!("{}: {e}", path.display())))
}

/// The rendered state printed at the end of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewReport {
    pub state: &'static str,
    /// Query string of the rendered view.
    pub query: String,
    /// Current location of the history sink.
    pub location: Option<String>,
    pub window: Option<PageWindow>,
    pub records: Vec<TradeRecord>,
    pub statistics: Option<Statistics>,
    pub error: Option<String>,
    pub fetches: u64,
    pub stale_discarded: u64,
    pub cache: CacheStats,
}

impl ViewReport {
    pub fn from_status(status: &EngineStatus, location: Option<String>) -> Self {
        let snapshot = status.snapshot.as_deref();
        Self {
            state: status.state.as_str(),
            query: snapshot.map(|s| s.query.clone()).unwrap_or_default(),
            location,
            window: snapshot.map(|s| s.window),
            records: snapshot.map(|s| s.records.clone()).unwrap_or_default(),
            statistics: snapshot.map(|s| (*s.statistics).clone()),
            error: status.error.as_ref().map(ToString::to_string),
            fetches: status.fetches_issued,
            stale_discarded: status.stale_discarded,
            cache: status.cache,
        }
    }
}

pub struct Application {
    book: Arc<TradeBook>,
    history: Arc<MemoryHistory>,
    handle: OrchestratorHandle,
    task: JoinHandle<()>,
}

impl Application {
    /// Build the engine over `trades`, opened at `location`, and wait for
    /// the first render. Must run inside a tokio runtime.
    pub async fn start(
        config: AppConfig,
        trades: Vec<TradeRecord>,
        location: &str,
    ) -> AppResult<Self> {
        config.validate()?;
        let book = Arc::new(TradeBook::new(trades));
        let history = Arc::new(MemoryHistory::with_initial(location));
        let url = UrlSynchronizer::new(Arc::clone(&history) as Arc<dyn HistorySink>);
        let store = config.storage.enabled.then(|| {
            debug!(dir = %config.storage.dir, "Using file storage");
            PersistenceStore::new(Arc::new(FileStorage::new(&config.storage.dir)))
        });

        let machine = QueryMachine::new(config.engine.clone(), url, store);
        let source = Arc::new(InMemoryRecordSource::new(Arc::clone(&book)));
        let (orchestrator, handle) = QueryOrchestrator::new(machine, source);
        let task = tokio::spawn(orchestrator.with_book_changes(book.subscribe()).run());
        info!(records = book.snapshot().len(), "Application started");

        let app = Self {
            book,
            history,
            handle,
            task,
        };
        app.handle.settled().await?;
        Ok(app)
    }

    pub fn book(&self) -> &Arc<TradeBook> {
        &self.book
    }

    pub fn handle(&self) -> &OrchestratorHandle {
        &self.handle
    }

    /// Play `actions` in order, then wait for the engine to settle.
    pub async fn run_script(&self, actions: Vec<Action>) -> AppResult<EngineStatus> {
        for action in actions {
            match action {
                Action::Wait(duration) => tokio::time::sleep(duration).await,
                Action::Dispatch(intent) => self.handle.dispatch(intent).await?,
            }
        }
        Ok(self.handle.settled().await?)
    }

    pub async fn report(&self) -> AppResult<ViewReport> {
        let status = self.handle.settled().await?;
        Ok(ViewReport::from_status(&status, self.history.current()))
    }

    /// Stop the orchestrator and wait for it to exit.
    pub async fn shutdown(self) {
        let Self { handle, task, .. } = self;
        drop(handle);
        if let Err(e) = task.await {
            tracing::warn!(?e, "Orchestrator task ended abnormally");
        }
    }
}
