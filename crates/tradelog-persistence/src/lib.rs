//! Persistence of the last-used view across sessions.
//!
//! Stores filter and sort (never the page number) as a versioned JSON
//! payload under one namespaced key. Persistence is a convenience: every
//! storage failure degrades to "nothing stored" instead of an error.

pub mod error;
pub mod storage;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{PersistenceStore, StoredView, PAYLOAD_VERSION, STORAGE_KEY};
