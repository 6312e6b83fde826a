//! Query orchestration for the trade list.
//!
//! Turns a stream of UI intents into debounced, sequenced record queries and
//! renders the latest answer as a page of rows plus memoized statistics.
//!
//! # Key Components
//!
//! - [`Intent`]: user actions and how they reduce onto a `ViewState`
//! - [`QueryMachine`]: synchronous state machine (debounce, sequencing, clamping)
//! - [`QueryOrchestrator`]: tokio driver publishing [`EngineStatus`] over a watch channel
//! - [`RecordSource`]: where pages come from; [`InMemoryRecordSource`] serves a [`TradeBook`]
//!
//! # Ordering
//!
//! 1. An intent replaces the pending debounce deadline (last write wins)
//! 2. The fetch fired at the deadline gets the next sequence number
//! 3. Only the response carrying the latest sequence number is rendered

pub mod book;
pub mod config;
pub mod error;
pub mod intent;
pub mod machine;
pub mod orchestrator;
pub mod source;

pub use book::{BookChange, TradeBook};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, FetchError};
pub use intent::{Intent, IntentKind, Reduced};
pub use machine::{
    Completion, DispatchOutcome, EngineState, EngineStatus, FetchRequest, QueryMachine, Snapshot,
};
pub use orchestrator::{OrchestratorHandle, QueryOrchestrator};
pub use source::{
    BoxFuture, DynRecordSource, InMemoryRecordSource, MockRecordSource, RecordPage, RecordQuery,
    RecordSource, ScriptedResponse,
};
