//! Engine configuration.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tradelog_core::PageSize;
use tradelog_stats::DEFAULT_CACHE_CAPACITY;

/// Longest accepted debounce window.
const MAX_DEBOUNCE_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Debounce for typing intents (symbols, strategy, P&L bounds) (ms). Default: 300.
    #[serde(default = "default_debounce_text_ms")]
    pub debounce_text_ms: u64,
    /// Debounce for toggles and buttons (ms). Default: 100.
    #[serde(default = "default_debounce_discrete_ms")]
    pub debounce_discrete_ms: u64,
    /// Aggregation cache entries. Default: 64.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Page size when neither the URL nor storage sets one. Default: 25.
    #[serde(default)]
    pub default_page_size: PageSize,
}

fn default_debounce_text_ms() -> u64 {
    300
}

fn default_debounce_discrete_ms() -> u64 {
    100
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_text_ms: default_debounce_text_ms(),
            debounce_discrete_ms: default_debounce_discrete_ms(),
            cache_capacity: default_cache_capacity(),
            default_page_size: PageSize::default(),
        }
    }
}

impl EngineConfig {
    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_text_ms)
    }

    pub fn discrete_debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_discrete_ms)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.cache_capacity == 0 {
            return Err(EngineError::Config("cache_capacity must be at least 1".to_string()));
        }
        for (name, value) in [
            ("debounce_text_ms", self.debounce_text_ms),
            ("debounce_discrete_ms", self.debounce_discrete_ms),
        ] {
            if value > MAX_DEBOUNCE_MS {
                return Err(EngineError::Config(format!(
                    "{name} must be at most {MAX_DEBOUNCE_MS}, got {value}"
                )));
            }
        }
        Ok(())
    }
}
