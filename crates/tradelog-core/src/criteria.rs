//! Filter criteria: which trades the user wants to see.
//!
//! `FilterCriteria` is an immutable value. Every "setter" consumes `self` and
//! returns a new value, so callers can compare old and new views to skip
//! redundant work.
//!
//! Normalization rules, applied on construction:
//! - Symbols are trimmed and upper-cased, emotions trimmed and lower-cased
//! - Empty items and items containing `,` are dropped
//! - An empty set means "no constraint", never "match nothing"

use crate::decimal::Pnl;
use crate::error::{Result, ValidationError};
use crate::params::DATE_FORMAT;
use crate::record::{Market, Side, TradeRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

/// Maximum length of a strategy identifier.
pub const MAX_STRATEGY_LEN: usize = 64;

/// Selection constraints over trade records.
///
/// Sets are ordered so the value has exactly one canonical serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(rename = "from", skip_serializing_if = "Option::is_none")]
    date_from: Option<NaiveDate>,
    #[serde(rename = "to", skip_serializing_if = "Option::is_none")]
    date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    symbols: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    markets: BTreeSet<Market>,
    #[serde(rename = "side", skip_serializing_if = "BTreeSet::is_empty")]
    sides: BTreeSet<Side>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    emotions: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pnl_min: Option<Pnl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pnl_max: Option<Pnl>,
}

/// Normalize a symbol; `None` if it cannot be part of a valid set.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() || s.contains(',') {
        return None;
    }
    Some(s.to_uppercase())
}

/// Normalize an emotion tag; `None` if it cannot be part of a valid set.
pub fn normalize_emotion(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() || s.contains(',') {
        return None;
    }
    Some(s.to_lowercase())
}

/// Check a strategy identifier: 1-64 chars of `[A-Za-z0-9_-]`.
pub fn check_strategy(raw: &str) -> std::result::Result<String, ValidationError> {
    let s = raw.trim();
    let valid = !s.is_empty()
        && s.len() <= MAX_STRATEGY_LEN
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(s.to_string())
    } else {
        Err(ValidationError::InvalidIdentifier {
            value: raw.to_string(),
        })
    }
}

impl FilterCriteria {
    /// Criteria with no constraints: every record matches.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Getters ---

    pub fn date_from(&self) -> Option<NaiveDate> {
        self.date_from
    }

    pub fn date_to(&self) -> Option<NaiveDate> {
        self.date_to
    }

    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    pub fn markets(&self) -> &BTreeSet<Market> {
        &self.markets
    }

    pub fn sides(&self) -> &BTreeSet<Side> {
        &self.sides
    }

    pub fn emotions(&self) -> &BTreeSet<String> {
        &self.emotions
    }

    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn pnl_min(&self) -> Option<Pnl> {
        self.pnl_min
    }

    pub fn pnl_max(&self) -> Option<Pnl> {
        self.pnl_max
    }

    /// True when no field constrains the selection.
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    // --- Derivation ---

    /// Set the inclusive date range. Either bound may be open.
    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ValidationError::ReversedDateRange {
                    from: f.format(DATE_FORMAT).to_string(),
                    to: t.format(DATE_FORMAT).to_string(),
                }
                .into());
            }
        }
        self.date_from = from;
        self.date_to = to;
        Ok(self)
    }

    /// Set the inclusive P&L range. Either bound may be open.
    pub fn with_pnl_range(mut self, min: Option<Pnl>, max: Option<Pnl>) -> Result<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(ValidationError::MinGreaterThanMax {
                    min: lo.canonical(),
                    max: hi.canonical(),
                }
                .into());
            }
        }
        self.pnl_min = min;
        self.pnl_max = max;
        Ok(self)
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.symbols = symbols
            .into_iter()
            .filter_map(|s| normalize_symbol(s.as_ref()))
            .collect();
        self
    }

    pub fn with_markets<I: IntoIterator<Item = Market>>(mut self, markets: I) -> Self {
        self.markets = markets.into_iter().collect();
        self
    }

    pub fn with_sides<I: IntoIterator<Item = Side>>(mut self, sides: I) -> Self {
        self.sides = sides.into_iter().collect();
        self
    }

    pub fn with_emotions<I, S>(mut self, emotions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.emotions = emotions
            .into_iter()
            .filter_map(|e| normalize_emotion(e.as_ref()))
            .collect();
        self
    }

    /// Set or clear the strategy constraint.
    pub fn with_strategy(mut self, strategy: Option<&str>) -> Result<Self> {
        self.strategy = match strategy {
            Some(s) if !s.trim().is_empty() => Some(check_strategy(s)?),
            _ => None,
        };
        Ok(self)
    }

    /// Add the side if absent, remove it if present.
    pub fn toggle_side(mut self, side: Side) -> Self {
        if !self.sides.remove(&side) {
            self.sides.insert(side);
        }
        self
    }

    pub fn toggle_market(mut self, market: Market) -> Self {
        if !self.markets.remove(&market) {
            self.markets.insert(market);
        }
        self
    }

    pub fn toggle_emotion(mut self, emotion: &str) -> Self {
        if let Some(tag) = normalize_emotion(emotion) {
            if !self.emotions.remove(&tag) {
                self.emotions.insert(tag);
            }
        }
        self
    }

    // --- Matching ---

    /// Check whether a record satisfies every present constraint.
    ///
    /// The emotion constraint matches when the record carries at least one
    /// of the selected tags.
    pub fn matches(&self, record: &TradeRecord) -> bool {
        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }
        if !self.symbols.is_empty() && !self.symbols.contains(&record.symbol.trim().to_uppercase())
        {
            return false;
        }
        if !self.markets.is_empty() && !self.markets.contains(&record.market) {
            return false;
        }
        if !self.sides.is_empty() && !self.sides.contains(&record.side) {
            return false;
        }
        if !self.emotions.is_empty()
            && !record
                .normalized_emotions()
                .any(|e| self.emotions.contains(&e))
        {
            return false;
        }
        if let Some(strategy) = &self.strategy {
            if record.strategy.as_deref() != Some(strategy.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.pnl_min {
            if record.pnl < min {
                return false;
            }
        }
        if let Some(max) = self.pnl_max {
            if record.pnl > max {
                return false;
            }
        }
        true
    }
}
