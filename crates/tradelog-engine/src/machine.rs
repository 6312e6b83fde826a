//! Query state machine.
//!
//! `QueryMachine` owns the accepted view and decides when a record query
//! goes out. It never sleeps or spawns: callers hand it the current
//! instant and run the fetches it asks for, so every transition is
//! testable with explicit times.
//!
//! ```text
//! Idle --start--> Fetching --complete--> Ready | Error
//!   Ready | Error | Fetching --dispatch--> Debouncing --poll(deadline)--> Fetching
//! ```
//!
//! Each fetch carries a sequence number. Only the response matching the
//! latest issued sequence is rendered; anything else is discarded as stale.

use crate::config::EngineConfig;
use crate::error::FetchError;
use crate::intent::{Intent, IntentKind};
use crate::source::{RecordPage, RecordQuery};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use tradelog_core::{
    paginate, FilterCriteria, PageState, PageWindow, SortSpec, TradeRecord, ViewState,
};
use tradelog_persistence::PersistenceStore;
use tradelog_stats::{AggregationMemoizer, CacheStats, RecordSetId, Statistics};
use tradelog_telemetry::Metrics;
use tradelog_url::{encode, HistoryMode, UrlSynchronizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Not started.
    Idle,
    /// A change is waiting for its debounce deadline.
    Debouncing,
    /// A query is in flight.
    Fetching,
    /// The latest query rendered.
    Ready,
    /// The latest query failed; the previous snapshot is still shown.
    Error,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Debouncing => "debouncing",
            Self::Fetching => "fetching",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// Nothing is scheduled or in flight.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

/// A rendered page: the view it answers, its rows and statistics.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub seq: u64,
    pub view: ViewState,
    /// Canonical query string of `view`.
    pub query: String,
    pub window: PageWindow,
    pub records: Vec<TradeRecord>,
    /// Aggregates over every record matching the view, not just this page.
    pub statistics: Arc<Statistics>,
}

/// Observable engine status, published to renderers.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub state: EngineState,
    /// Latest accepted view, which may be ahead of `snapshot`.
    pub view: Arc<ViewState>,
    pub snapshot: Option<Arc<Snapshot>>,
    pub error: Option<FetchError>,
    pub intents_processed: u64,
    pub fetches_issued: u64,
    pub stale_discarded: u64,
    pub cache: CacheStats,
}

/// A query the caller should run and report back with [`QueryMachine::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: RecordQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The view changed; a fetch is due at `deadline`.
    Scheduled { deadline: Instant },
    /// The intent left the view as it was.
    Unchanged,
}

#[derive(Debug, Clone)]
pub enum Completion {
    Rendered(Arc<Snapshot>),
    Failed(FetchError),
    /// The response belonged to a superseded query.
    Stale,
}

pub struct QueryMachine {
    config: EngineConfig,
    state: EngineState,
    view: Arc<ViewState>,
    deadline: Option<Instant>,
    /// History mode for the next URL write.
    pending_mode: HistoryMode,
    next_seq: u64,
    in_flight: Option<u64>,
    last_ready: Option<Arc<Snapshot>>,
    last_error: Option<FetchError>,
    last_saved: Option<(FilterCriteria, SortSpec)>,
    memo: AggregationMemoizer,
    url: UrlSynchronizer,
    store: Option<PersistenceStore>,
    intents_processed: u64,
    fetches_issued: u64,
    stale_discarded: u64,
}

impl QueryMachine {
    /// Build a machine whose initial view comes from the URL, then storage,
    /// then defaults.
    pub fn new(
        config: EngineConfig,
        url: UrlSynchronizer,
        store: Option<PersistenceStore>,
    ) -> Self {
        let view = initial_view(&config, &url, store.as_ref());
        let memo = AggregationMemoizer::new(config.cache_capacity);
        Self {
            config,
            state: EngineState::Idle,
            view: Arc::new(view),
            deadline: None,
            pending_mode: HistoryMode::Replace,
            next_seq: 0,
            in_flight: None,
            last_ready: None,
            last_error: None,
            last_saved: None,
            memo,
            url,
            store,
            intents_processed: 0,
            fetches_issued: 0,
            stale_discarded: 0,
        }
    }

    /// Issue the initial query.
    pub fn start(&mut self, now: Instant) -> FetchRequest {
        debug!(?now, view = %encode(&self.view), "Starting query machine");
        self.begin_fetch()
    }

    /// Reduce `intent` onto the current view and schedule a fetch.
    ///
    /// Any pending deadline is replaced, so a burst of intents inside the
    /// window produces a single fetch with the last state. A query already
    /// in flight is superseded.
    pub fn dispatch(&mut self, intent: Intent, now: Instant) -> DispatchOutcome {
        self.intents_processed += 1;
        let kind = intent.kind();
        Metrics::intent_received(kind.as_str());

        let reduced = intent.reduce(&self.view);
        for rejection in &reduced.rejections {
            Metrics::validation_rejected("intent", &rejection.field);
            warn!(field = %rejection.field, error = %rejection.error, "Rejected intent input");
        }

        let refresh = matches!(intent, Intent::Refresh);
        if !refresh && reduced.view == *self.view {
            debug!(kind = kind.as_str(), "Intent left the view unchanged");
            return DispatchOutcome::Unchanged;
        }
        if reduced.view != *self.view {
            self.view = Arc::new(reduced.view);
        }
        if intent.is_navigation() {
            self.pending_mode = HistoryMode::Push;
        }
        if let Some(seq) = self.in_flight.take() {
            debug!(seq, "In-flight query superseded");
        }

        let deadline = now + self.debounce(kind);
        self.deadline = Some(deadline);
        self.set_state(EngineState::Debouncing);
        DispatchOutcome::Scheduled { deadline }
    }

    /// Fire the pending fetch once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<FetchRequest> {
        match self.deadline {
            Some(deadline) if self.state == EngineState::Debouncing && deadline <= now => {
                Some(self.begin_fetch())
            }
            _ => None,
        }
    }

    /// Apply the outcome of fetch `seq`.
    pub fn complete(&mut self, seq: u64, result: Result<RecordPage, FetchError>) -> Completion {
        if self.in_flight != Some(seq) {
            self.stale_discarded += 1;
            Metrics::stale_response();
            debug!(seq, current = ?self.in_flight, "Discarding stale response");
            return Completion::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => Completion::Rendered(self.render(seq, page)),
            Err(error) => {
                Metrics::fetch_failed();
                warn!(seq, %error, retryable = error.is_retryable(), "Record query failed");
                self.last_error = Some(error.clone());
                self.set_state(EngineState::Error);
                Completion::Failed(error)
            }
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Shared handle to the current view. Unchanged intents keep the same
    /// allocation, so `Arc::ptr_eq` detects "no change" cheaply.
    pub fn view_arc(&self) -> Arc<ViewState> {
        Arc::clone(&self.view)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.last_ready.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Query string last written to the history sink.
    pub fn location(&self) -> Option<&str> {
        self.url.last_written()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.memo.stats()
    }

    /// Drop cached aggregates of versions older than `version` as soon as
    /// the record set changes, ahead of the next fetch.
    pub fn records_changed(&mut self, id: RecordSetId, version: u64) {
        let purged = self.memo.record_set_changed(id, version);
        debug!(set_id = %id, version, purged, "Records changed");
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            view: Arc::clone(&self.view),
            snapshot: self.last_ready.clone(),
            error: self.last_error.clone(),
            intents_processed: self.intents_processed,
            fetches_issued: self.fetches_issued,
            stale_discarded: self.stale_discarded,
            cache: self.memo.stats(),
        }
    }

    fn debounce(&self, kind: IntentKind) -> Duration {
        match kind {
            IntentKind::Text => self.config.text_debounce(),
            IntentKind::Discrete => self.config.discrete_debounce(),
        }
    }

    fn begin_fetch(&mut self) -> FetchRequest {
        self.deadline = None;
        self.next_seq += 1;
        let seq = self.next_seq;
        self.in_flight = Some(seq);

        let mode = std::mem::replace(&mut self.pending_mode, HistoryMode::Replace);
        self.url.sync(&self.view, mode);
        self.persist();

        self.fetches_issued += 1;
        Metrics::fetch_issued();
        self.set_state(EngineState::Fetching);

        let page = self.view.page;
        let limit = page.size().get();
        let query = RecordQuery {
            criteria: self.view.criteria.clone(),
            sort: self.view.sort,
            offset: page.offset(),
            limit,
        };
        debug!(seq, offset = query.offset, limit, "Issuing record query");
        FetchRequest { seq, query }
    }

    /// Save criteria and sort when they differ from the last save.
    fn persist(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let current = (self.view.criteria.clone(), self.view.sort);
        if self.last_saved.as_ref() == Some(&current) {
            return;
        }
        store.save(&current.0, &current.1);
        self.last_saved = Some(current);
    }

    fn render(&mut self, seq: u64, page: RecordPage) -> Arc<Snapshot> {
        let requested = self.view.page;
        let window = paginate(page.total_count, &requested);
        let clamped = window.was_clamped(&requested);
        if clamped {
            info!(
                seq,
                requested = requested.page(),
                effective = window.effective_page,
                "Requested page out of range, clamping"
            );
            self.view = Arc::new(self.view.with_page(window.clamped(&requested)));
            self.url.sync(&self.view, HistoryMode::Replace);
        }

        let memo_view = self.memo.view(&page.dataset, &self.view.criteria, &self.view.sort);
        let records = if clamped {
            let all = page.dataset.records();
            window
                .slice(&memo_view.indices)
                .iter()
                .filter_map(|&i| all.get(i).cloned())
                .collect()
        } else {
            page.records
        };

        let snapshot = Arc::new(Snapshot {
            seq,
            view: (*self.view).clone(),
            query: encode(&self.view),
            window,
            records,
            statistics: Arc::clone(&memo_view.statistics),
        });
        info!(
            seq,
            total = window.total_count,
            page = window.effective_page,
            pages = window.page_count,
            "View ready"
        );
        self.last_ready = Some(Arc::clone(&snapshot));
        self.last_error = None;
        self.set_state(EngineState::Ready);
        snapshot
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            debug!(from = self.state.as_str(), to = state.as_str(), "Engine state change");
        }
        self.state = state;
        Metrics::engine_state_set(state.as_str());
    }
}

/// A URL with any parameters defines the whole view; storage only fills
/// in when the URL is bare.
fn initial_view(
    config: &EngineConfig,
    url: &UrlSynchronizer,
    store: Option<&PersistenceStore>,
) -> ViewState {
    if let Some(validated) = url.initial() {
        info!(rejected = validated.rejections.len(), "Initial view from URL");
        return validated.value;
    }
    let page = PageState::new(1, config.default_page_size);
    if let Some(stored) = store.and_then(PersistenceStore::load) {
        info!("Initial view from storage");
        return ViewState::new(stored.criteria, stored.sort, page);
    }
    ViewState::default().with_page(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::TradeBook;
    use crate::source::InMemoryRecordSource;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tradelog_core::{Market, PageSize, Pnl, Side, SortDirection, SortField, MAX_PAGE};
    use tradelog_persistence::MemoryStorage;
    use tradelog_url::{HistorySink, MemoryHistory};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn trades(n: u32) -> Vec<TradeRecord> {
        (0..n)
            .map(|i| {
                TradeRecord::new(
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(i)),
                    ["BTC", "ETH", "SOL"][(i % 3) as usize],
                    Market::Crypto,
                    if i % 2 == 0 { Side::Buy } else { Side::Sell },
                    Pnl::new(Decimal::from(i as i64 - 10)),
                )
                .with_emotions([if i % 4 == 0 { "fear" } else { "calm" }])
            })
            .collect()
    }

    struct Rig {
        machine: QueryMachine,
        source: InMemoryRecordSource,
        history: Arc<MemoryHistory>,
        t0: Instant,
    }

    impl Rig {
        fn new(records: u32, location: &str, store: Option<PersistenceStore>) -> Self {
            let history = Arc::new(MemoryHistory::with_initial(location));
            let url = UrlSynchronizer::new(Arc::clone(&history) as Arc<dyn HistorySink>);
            Self {
                machine: QueryMachine::new(EngineConfig::default(), url, store),
                source: InMemoryRecordSource::new(Arc::new(TradeBook::new(trades(records)))),
                history,
                t0: Instant::now(),
            }
        }

        fn run(&mut self, request: FetchRequest) -> Completion {
            let page = self.source.serve(&request.query);
            self.machine.complete(request.seq, Ok(page))
        }

        fn started(mut self) -> Self {
            let request = self.machine.start(self.t0);
            self.run(request);
            self
        }
    }

    #[test]
    fn test_start_renders_first_page() {
        let mut rig = Rig::new(30, "", None);
        assert_eq!(rig.machine.state(), EngineState::Idle);
        let request = rig.machine.start(rig.t0);
        assert_eq!(request.seq, 1);
        assert_eq!(request.query.offset, 0);
        assert_eq!(request.query.limit, 25);
        assert_eq!(rig.machine.state(), EngineState::Fetching);

        let Completion::Rendered(snapshot) = rig.run(request) else {
            panic!("expected a rendered snapshot");
        };
        assert_eq!(rig.machine.state(), EngineState::Ready);
        assert_eq!(snapshot.records.len(), 25);
        assert_eq!(snapshot.window.page_count, 2);
        assert_eq!(snapshot.statistics.count, 30);
    }

    #[test]
    fn test_burst_of_text_intents_fetches_once() {
        let mut rig = Rig::new(30, "", None).started();
        for (t, text) in [(0, "B"), (100, "BT"), (200, "BTC")] {
            let outcome = rig.machine.dispatch(Intent::SetSymbolsText(text.into()), rig.t0 + ms(t));
            assert!(matches!(outcome, DispatchOutcome::Scheduled { .. }));
        }
        assert_eq!(rig.machine.state(), EngineState::Debouncing);
        assert!(rig.machine.poll(rig.t0 + ms(250)).is_none());
        assert!(rig.machine.poll(rig.t0 + ms(499)).is_none());

        let request = rig.machine.poll(rig.t0 + ms(500)).expect("deadline passed");
        assert_eq!(request.query.criteria.symbols().len(), 1);
        assert!(request.query.criteria.symbols().contains("BTC"));
        assert!(rig.machine.poll(rig.t0 + ms(900)).is_none());
        assert_eq!(rig.machine.status().fetches_issued, 2);
        assert_eq!(rig.machine.status().intents_processed, 3);
    }

    #[test]
    fn test_discrete_intents_use_short_window() {
        let mut rig = Rig::new(10, "", None).started();
        let DispatchOutcome::Scheduled { deadline } =
            rig.machine.dispatch(Intent::ToggleSide(Side::Buy), rig.t0 + ms(0))
        else {
            panic!("expected a scheduled fetch");
        };
        assert_eq!(deadline, rig.t0 + ms(100));
        assert!(rig.machine.poll(rig.t0 + ms(100)).is_some());
    }

    #[test]
    fn test_late_response_discarded() {
        let mut rig = Rig::new(30, "", None).started();
        rig.machine.dispatch(Intent::ToggleSide(Side::Buy), rig.t0 + ms(0));
        let first = rig.machine.poll(rig.t0 + ms(100)).unwrap();

        rig.machine.dispatch(Intent::ToggleMarket(Market::Crypto), rig.t0 + ms(150));
        assert_eq!(rig.machine.in_flight(), None);
        let second = rig.machine.poll(rig.t0 + ms(250)).unwrap();
        assert!(second.seq > first.seq);

        let Completion::Rendered(snapshot) = rig.run(second) else {
            panic!("latest response must render");
        };
        assert!(snapshot.view.criteria.markets().contains(&Market::Crypto));

        assert!(matches!(rig.run(first), Completion::Stale));
        let status = rig.machine.status();
        assert_eq!(status.state, EngineState::Ready);
        assert_eq!(status.stale_discarded, 1);
        assert!(status.snapshot.unwrap().view.criteria.markets().contains(&Market::Crypto));
    }

    #[test]
    fn test_stale_response_while_debouncing() {
        let mut rig = Rig::new(10, "", None).started();
        rig.machine.dispatch(Intent::ToggleSide(Side::Buy), rig.t0 + ms(0));
        let first = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        rig.machine.dispatch(Intent::ToggleSide(Side::Sell), rig.t0 + ms(120));

        assert!(matches!(rig.run(first), Completion::Stale));
        assert_eq!(rig.machine.state(), EngineState::Debouncing);
    }

    #[test]
    fn test_out_of_range_page_clamped() {
        let mut rig = Rig::new(30, "?page=5", None);
        assert_eq!(rig.machine.view().page.page(), 5);
        let request = rig.machine.start(rig.t0);
        assert_eq!(request.query.offset, 100);

        let Completion::Rendered(snapshot) = rig.run(request) else {
            panic!("expected a rendered snapshot");
        };
        assert_eq!(snapshot.window.effective_page, 2);
        assert_eq!(snapshot.records.len(), 5);
        assert_eq!(rig.machine.view().page.page(), 2);
        assert_eq!(rig.machine.location(), Some("page=2"));
        assert_eq!(rig.history.current().as_deref(), Some("page=2"));
        assert_eq!(rig.history.depth(), 1);
    }

    #[test]
    fn test_failure_keeps_previous_snapshot() {
        let mut rig = Rig::new(10, "", None).started();
        rig.machine.dispatch(Intent::Refresh, rig.t0 + ms(0));
        let request = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        let outcome = rig.machine.complete(
            request.seq,
            Err(FetchError::Unavailable("connection reset".to_string())),
        );
        assert!(matches!(outcome, Completion::Failed(_)));
        assert_eq!(rig.machine.state(), EngineState::Error);
        assert!(rig.machine.snapshot().is_some());
        assert!(rig.machine.last_error().is_some());

        rig.machine.dispatch(Intent::Refresh, rig.t0 + ms(200));
        let retry = rig.machine.poll(rig.t0 + ms(300)).unwrap();
        rig.run(retry);
        assert_eq!(rig.machine.state(), EngineState::Ready);
        assert!(rig.machine.last_error().is_none());
    }

    #[test]
    fn test_unchanged_intent_is_noop() {
        let mut rig = Rig::new(10, "", None).started();
        let before = rig.machine.view_arc();
        let outcome = rig
            .machine
            .dispatch(Intent::SetCriteria(FilterCriteria::new()), rig.t0 + ms(0));
        assert_eq!(outcome, DispatchOutcome::Unchanged);
        assert!(Arc::ptr_eq(&before, &rig.machine.view_arc()));
        assert_eq!(rig.machine.state(), EngineState::Ready);
        assert!(rig.machine.deadline().is_none());
    }

    #[test]
    fn test_rejected_input_keeps_view() {
        let mut rig = Rig::new(10, "", None).started();
        let outcome = rig.machine.dispatch(Intent::GoToPage(0), rig.t0 + ms(0));
        assert_eq!(outcome, DispatchOutcome::Unchanged);
        assert_eq!(rig.machine.view().page.page(), 1);
    }

    #[test]
    fn test_history_modes() {
        let mut rig = Rig::new(60, "", None).started();
        rig.machine.dispatch(Intent::GoToPage(2), rig.t0 + ms(0));
        let request = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        rig.run(request);
        assert_eq!(rig.history.depth(), 1);
        assert_eq!(rig.history.current().as_deref(), Some("page=2"));

        rig.machine.dispatch(Intent::Navigate("side=Sell".into()), rig.t0 + ms(200));
        let request = rig.machine.poll(rig.t0 + ms(300)).unwrap();
        rig.run(request);
        assert_eq!(rig.history.depth(), 2);
        let last = rig.history.writes().pop().unwrap();
        assert_eq!(last.mode, HistoryMode::Push);
        assert_eq!(last.query, "side=Sell");
    }

    #[test]
    fn test_initial_view_precedence() {
        let storage = Arc::new(MemoryStorage::new());
        let sort = SortSpec::new(SortField::Pnl, SortDirection::Asc);
        PersistenceStore::new(storage.clone())
            .save(&FilterCriteria::new().with_symbols(["ETH"]), &sort);

        let from_storage = Rig::new(10, "", Some(PersistenceStore::new(storage.clone())));
        assert!(from_storage.machine.view().criteria.symbols().contains("ETH"));
        assert_eq!(from_storage.machine.view().sort, sort);

        let from_url = Rig::new(10, "?symbols=SOL", Some(PersistenceStore::new(storage)));
        assert!(from_url.machine.view().criteria.symbols().contains("SOL"));
        assert!(!from_url.machine.view().criteria.symbols().contains("ETH"));
        assert_eq!(from_url.machine.view().sort, SortSpec::default());
    }

    #[test]
    fn test_accepted_state_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let mut rig = Rig::new(10, "", Some(PersistenceStore::new(storage.clone()))).started();
        rig.machine.dispatch(Intent::ToggleSide(Side::Sell), rig.t0 + ms(0));
        let request = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        rig.run(request);

        let stored = PersistenceStore::new(storage).load().unwrap();
        assert!(stored.criteria.sides().contains(&Side::Sell));
    }

    #[test]
    fn test_statistics_memoized_across_revisits() {
        let mut rig = Rig::new(20, "", None).started();
        for (t, side) in [(0, Side::Buy), (200, Side::Buy)] {
            rig.machine.dispatch(Intent::ToggleSide(side), rig.t0 + ms(t));
            let request = rig.machine.poll(rig.t0 + ms(t + 100)).unwrap();
            rig.run(request);
        }
        let cache = rig.machine.cache_stats();
        assert_eq!(cache.misses, 2);
        assert_eq!(cache.hits, 1);
    }

    #[test]
    fn test_record_change_refreshes_statistics() {
        let mut rig = Rig::new(10, "", None).started();
        let before = rig.machine.snapshot().unwrap().statistics.count;
        rig.source
            .book()
            .insert(
                TradeRecord::new(
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    "BTC",
                    Market::Crypto,
                    Side::Buy,
                    Pnl::new(Decimal::from(7)),
                ),
            )
            .unwrap();

        rig.machine.dispatch(Intent::Refresh, rig.t0 + ms(0));
        let request = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        rig.run(request);
        assert_eq!(rig.machine.snapshot().unwrap().statistics.count, before + 1);
        assert_eq!(rig.machine.cache_stats().invalidations, 1);
    }

    #[test]
    fn test_record_change_purges_cache_immediately() {
        let mut rig = Rig::new(20, "", None).started();
        rig.machine.dispatch(Intent::ToggleSide(Side::Buy), rig.t0 + ms(0));
        let request = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        rig.run(request);
        assert_eq!(rig.machine.cache_stats().live, 2);

        let book = Arc::clone(rig.source.book());
        let mut changes = book.subscribe();
        let record = book.snapshot().records()[0].clone();
        book.remove(record.id).unwrap();
        let (id, version) = *changes.borrow_and_update();
        rig.machine.records_changed(id, version);

        let stats = rig.machine.cache_stats();
        assert_eq!(stats.live, 0);
        assert_eq!(stats.invalidations, 2);
        // The rendered snapshot stays until the next fetch.
        assert_eq!(rig.machine.snapshot().unwrap().statistics.count, 10);
    }

    #[test]
    fn test_page_size_change_keeps_first_row() {
        // Page 2 of 25 starts at row 25, which is on page 3 of 10.
        let mut rig = Rig::new(60, "?page=2", None).started();
        rig.machine
            .dispatch(Intent::SetPageSize(PageSize::Ten), rig.t0 + ms(0));
        let request = rig.machine.poll(rig.t0 + ms(100)).unwrap();
        assert_eq!(rig.machine.view().page.page(), 3);
        assert_eq!(request.query.offset, 20);
        assert_eq!(request.query.limit, 10);
    }

    #[test]
    fn test_huge_page_in_link_clamped() {
        let mut rig = Rig::new(30, "?page=1000000000000000000&pageSize=10", None);
        assert_eq!(rig.machine.view().page.page(), MAX_PAGE);
        let request = rig.machine.start(rig.t0);
        assert_eq!(request.query.offset, (MAX_PAGE - 1) * 10);

        let Completion::Rendered(snapshot) = rig.run(request) else {
            panic!("expected a rendered snapshot");
        };
        assert_eq!(snapshot.window.effective_page, 3);
        assert_eq!(rig.history.current().as_deref(), Some("page=3&pageSize=10"));
    }

    #[test]
    fn test_huge_page_intent_then_resize() {
        let mut rig = Rig::new(30, "", None).started();
        rig.machine.dispatch(Intent::GoToPage(usize::MAX), rig.t0 + ms(0));
        rig.machine
            .dispatch(Intent::SetPageSize(PageSize::Ten), rig.t0 + ms(10));
        let request = rig.machine.poll(rig.t0 + ms(200)).unwrap();
        assert_eq!(request.query.limit, 10);

        let Completion::Rendered(snapshot) = rig.run(request) else {
            panic!("expected a rendered snapshot");
        };
        assert_eq!(snapshot.window.effective_page, 3);
        assert_eq!(snapshot.records.len(), 10);
    }
}
