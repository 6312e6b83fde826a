//! Async driver for the query machine.
//!
//! The orchestrator task owns the [`QueryMachine`]. Intents arrive over an
//! mpsc channel, debounce deadlines are slept on with `sleep_until`, and
//! each fetch runs in its own task that reports back tagged with its
//! sequence number. Trade book changes, when subscribed, purge stale cache
//! entries right away. After every step the machine status is published on
//! a watch channel for renderers.

use crate::book::BookChange;
use crate::error::{EngineError, EngineResult, FetchError};
use crate::intent::Intent;
use crate::machine::{EngineStatus, FetchRequest, QueryMachine};
use crate::source::{DynRecordSource, RecordPage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use tradelog_telemetry::Metrics;

/// Intent channel capacity.
const INTENT_BUFFER: usize = 256;

struct FetchOutcome {
    seq: u64,
    result: Result<RecordPage, FetchError>,
}

pub struct QueryOrchestrator {
    machine: QueryMachine,
    source: DynRecordSource,
    intents: mpsc::Receiver<Intent>,
    status: watch::Sender<EngineStatus>,
    book_changes: Option<watch::Receiver<BookChange>>,
}

/// Cloneable handle for sending intents and observing status.
#[derive(Clone)]
pub struct OrchestratorHandle {
    intents: mpsc::Sender<Intent>,
    status: watch::Receiver<EngineStatus>,
    sent: Arc<AtomicU64>,
}

impl QueryOrchestrator {
    pub fn new(machine: QueryMachine, source: DynRecordSource) -> (Self, OrchestratorHandle) {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
        let (status_tx, status_rx) = watch::channel(machine.status());
        let orchestrator = Self {
            machine,
            source,
            intents: intent_rx,
            status: status_tx,
            book_changes: None,
        };
        let handle = OrchestratorHandle {
            intents: intent_tx,
            status: status_rx,
            sent: Arc::new(AtomicU64::new(0)),
        };
        (orchestrator, handle)
    }

    /// Follow a trade book's mutations (see [`crate::TradeBook::subscribe`]).
    pub fn with_book_changes(mut self, changes: watch::Receiver<BookChange>) -> Self {
        self.book_changes = Some(changes);
        self
    }

    /// Build and spawn onto the current runtime.
    pub fn spawn(
        machine: QueryMachine,
        source: DynRecordSource,
    ) -> (JoinHandle<()>, OrchestratorHandle) {
        let (orchestrator, handle) = Self::new(machine, source);
        (tokio::spawn(orchestrator.run()), handle)
    }

    /// Run until every handle is dropped.
    pub async fn run(self) {
        let Self {
            mut machine,
            source,
            mut intents,
            status,
            mut book_changes,
        } = self;
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<FetchOutcome>();

        let request = machine.start(Instant::now());
        spawn_fetch(&source, &results_tx, request);
        status.send_replace(machine.status());
        info!("Query orchestrator started");

        loop {
            let deadline = machine.deadline();
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => {
                        machine.dispatch(intent, Instant::now());
                    }
                    None => {
                        info!("All handles dropped, stopping query orchestrator");
                        break;
                    }
                },

                Some(outcome) = results_rx.recv() => {
                    machine.complete(outcome.seq, outcome.result);
                }

                (id, version) = next_book_change(&mut book_changes) => {
                    machine.records_changed(id, version);
                }

                () = wait_until(deadline) => {
                    if let Some(request) = machine.poll(Instant::now()) {
                        spawn_fetch(&source, &results_tx, request);
                    }
                }
            }
            status.send_replace(machine.status());
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Next book change; pending forever once the book is gone.
async fn next_book_change(changes: &mut Option<watch::Receiver<BookChange>>) -> BookChange {
    if let Some(rx) = changes {
        if rx.changed().await.is_ok() {
            return *rx.borrow_and_update();
        }
        *changes = None;
    }
    std::future::pending().await
}

fn spawn_fetch(
    source: &DynRecordSource,
    results: &mpsc::UnboundedSender<FetchOutcome>,
    request: FetchRequest,
) {
    let source = Arc::clone(source);
    let results = results.clone();
    tokio::spawn(async move {
        let FetchRequest { seq, query } = request;
        let started = Instant::now();
        let result = source.fetch(query).await;
        Metrics::fetch_latency(started.elapsed().as_secs_f64() * 1000.0);
        if results.send(FetchOutcome { seq, result }).is_err() {
            debug!(seq, "Orchestrator gone, dropping fetch result");
        }
    });
}

impl OrchestratorHandle {
    pub async fn dispatch(&self, intent: Intent) -> EngineResult<()> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| EngineError::Closed)?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Latest published status.
    pub fn status(&self) -> EngineStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineStatus> {
        self.status.clone()
    }

    /// Wait until every intent sent through this handle (or its clones) is
    /// processed and nothing is scheduled or in flight.
    pub async fn settled(&self) -> EngineResult<EngineStatus> {
        let target = self.sent.load(Ordering::SeqCst);
        let mut rx = self.status.clone();
        let status = rx
            .wait_for(|s| s.intents_processed >= target && s.state.is_settled())
            .await
            .map_err(|_| EngineError::Closed)?
            .clone();
        Ok(status)
    }
}
