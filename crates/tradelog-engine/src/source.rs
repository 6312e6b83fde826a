//! Record source abstraction.
//!
//! The engine asks a `RecordSource` for one page of filtered, sorted
//! records. The answer also carries the record-set snapshot it was served
//! from, which the memoizer aggregates and whose identity keys its cache.
//!
//! Implementations:
//! - `InMemoryRecordSource`: serves straight from a shared `TradeBook`
//! - `MockRecordSource`: scripted delays and failures for tests

use crate::book::TradeBook;
use crate::error::FetchError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tradelog_core::{FilterCriteria, SortSpec, TradeRecord};
use tradelog_stats::RecordSet;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Outbound page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub criteria: FilterCriteria,
    pub sort: SortSpec,
    pub offset: usize,
    pub limit: usize,
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<TradeRecord>,
    /// Matching records across all pages.
    pub total_count: usize,
    /// Snapshot the page was served from.
    pub dataset: Arc<RecordSet>,
}

pub trait RecordSource: Send + Sync {
    fn fetch(&self, query: RecordQuery) -> BoxFuture<'_, Result<RecordPage, FetchError>>;
}

/// Arc wrapper for RecordSource trait objects.
pub type DynRecordSource = Arc<dyn RecordSource>;

/// Serves pages from an in-process trade book.
#[derive(Debug, Clone)]
pub struct InMemoryRecordSource {
    book: Arc<TradeBook>,
}

impl InMemoryRecordSource {
    pub fn new(book: Arc<TradeBook>) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &Arc<TradeBook> {
        &self.book
    }

    /// Answer `query` against the current snapshot.
    pub fn serve(&self, query: &RecordQuery) -> RecordPage {
        let dataset = self.book.snapshot();
        let records = dataset.records();
        let mut indices: Vec<usize> = (0..records.len())
            .filter(|&i| query.criteria.matches(&records[i]))
            .collect();
        query.sort.sort_indices(records, &mut indices);

        let page = indices
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|&i| records[i].clone())
            .collect();
        RecordPage {
            records: page,
            total_count: indices.len(),
            dataset,
        }
    }
}

impl RecordSource for InMemoryRecordSource {
    fn fetch(&self, query: RecordQuery) -> BoxFuture<'_, Result<RecordPage, FetchError>> {
        Box::pin(async move { Ok(self.serve(&query)) })
    }
}

/// One scripted response of a [`MockRecordSource`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponse {
    pub delay: Duration,
    pub failure: Option<FetchError>,
}

impl ScriptedResponse {
    pub fn after(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    pub fn fail(error: FetchError) -> Self {
        Self {
            delay: Duration::ZERO,
            failure: Some(error),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Mock record source for testing.
///
/// Each fetch consumes the next scripted response (immediate success once
/// the script is exhausted) and is recorded for verification. Successful
/// responses are served from an in-memory book.
#[derive(Debug)]
pub struct MockRecordSource {
    inner: InMemoryRecordSource,
    script: Mutex<VecDeque<ScriptedResponse>>,
    queries: Mutex<Vec<RecordQuery>>,
}

impl MockRecordSource {
    pub fn new(book: Arc<TradeBook>) -> Self {
        Self {
            inner: InMemoryRecordSource::new(book),
            script: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queue responses for the next fetches, in order.
    pub fn push_script<I: IntoIterator<Item = ScriptedResponse>>(&self, responses: I) {
        self.script.lock().extend(responses);
    }

    /// Get recorded queries.
    pub fn queries(&self) -> Vec<RecordQuery> {
        self.queries.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.queries.lock().len()
    }
}

impl RecordSource for MockRecordSource {
    fn fetch(&self, query: RecordQuery) -> BoxFuture<'_, Result<RecordPage, FetchError>> {
        self.queries.lock().push(query.clone());
        let step = self.script.lock().pop_front().unwrap_or_default();
        Box::pin(async move {
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            match step.failure {
                Some(error) => Err(error),
                None => Ok(self.inner.serve(&query)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tradelog_core::{Market, Pnl, Side, SortDirection, SortField};

    fn book() -> Arc<TradeBook> {
        let records = (1..=7)
            .map(|day| {
                TradeRecord::new(
                    NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
                    if day % 2 == 0 { "ETH" } else { "BTC" },
                    Market::Crypto,
                    Side::Buy,
                    Pnl::new(Decimal::from(day)),
                )
            })
            .collect();
        Arc::new(TradeBook::new(records))
    }

    fn query(offset: usize, limit: usize) -> RecordQuery {
        RecordQuery {
            criteria: FilterCriteria::new().with_symbols(["BTC"]),
            sort: SortSpec::new(SortField::Pnl, SortDirection::Desc),
            offset,
            limit,
        }
    }

    #[test]
    fn test_serve_filters_sorts_and_slices() {
        let source = InMemoryRecordSource::new(book());
        let page = source.serve(&query(1, 2));
        assert_eq!(page.total_count, 4);
        let pnls: Vec<_> = page.records.iter().map(|r| r.pnl).collect();
        assert_eq!(pnls, vec![Pnl::new(Decimal::from(5)), Pnl::new(Decimal::from(3))]);
        assert_eq!(page.dataset.len(), 7);

        let beyond = source.serve(&query(10, 2));
        assert!(beyond.records.is_empty());
        assert_eq!(beyond.total_count, 4);
    }

    #[tokio::test]
    async fn test_mock_records_and_fails() {
        let source = MockRecordSource::new(book());
        source.push_script([ScriptedResponse::fail(FetchError::Server {
            status: 503,
            message: "maintenance".to_string(),
        })]);

        let err = tokio_test::assert_err!(source.fetch(query(0, 25)).await);
        assert!(err.is_retryable());
        let page = tokio_test::assert_ok!(source.fetch(query(0, 25)).await);
        assert_eq!(page.records.len(), 4);
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(source.queries()[0], query(0, 25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay() {
        let source = MockRecordSource::new(book());
        source.push_script([ScriptedResponse::after(Duration::from_millis(500))]);
        let start = tokio::time::Instant::now();
        source.fetch(query(0, 10)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }
}
