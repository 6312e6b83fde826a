//! Trade records and their enumerated attributes.

use crate::decimal::Pnl;
use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier of a journal entry.
pub type TradeId = Uuid;

/// Trade side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(alias = "buy", alias = "BUY", alias = "long")]
    Buy,
    #[serde(alias = "sell", alias = "SELL", alias = "short")]
    Sell,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Buy, Side::Sell];

    /// Canonical text form used in query strings and stored payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }

    /// Returns 1 for buy, -1 for sell.
    pub fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Self::Buy),
            "sell" | "short" => Ok(Self::Sell),
            _ => Err(ValidationError::UnknownValue {
                value: s.to_string(),
            }),
        }
    }
}

/// Market category a trade belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(alias = "crypto")]
    Crypto,
    #[serde(alias = "forex")]
    Forex,
    #[serde(alias = "stocks")]
    Stocks,
    #[serde(alias = "futures")]
    Futures,
    #[serde(alias = "options")]
    Options,
    #[serde(alias = "commodities")]
    Commodities,
    #[serde(alias = "indices")]
    Indices,
}

impl Market {
    pub const ALL: [Market; 7] = [
        Market::Crypto,
        Market::Forex,
        Market::Stocks,
        Market::Futures,
        Market::Options,
        Market::Commodities,
        Market::Indices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crypto => "Crypto",
            Self::Forex => "Forex",
            Self::Stocks => "Stocks",
            Self::Futures => "Futures",
            Self::Options => "Options",
            Self::Commodities => "Commodities",
            Self::Indices => "Indices",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownValue {
                value: s.to_string(),
            })
    }
}

/// A single journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Generated when absent from the input.
    #[serde(default = "Uuid::new_v4")]
    pub id: TradeId,
    pub date: NaiveDate,
    pub symbol: String,
    pub market: Market,
    pub side: Side,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    pub pnl: Pnl,
}

impl TradeRecord {
    /// Create a record with a fresh id and no emotions or strategy.
    pub fn new(
        date: NaiveDate,
        symbol: impl Into<String>,
        market: Market,
        side: Side,
        pnl: Pnl,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            symbol: symbol.into(),
            market,
            side,
            emotions: Vec::new(),
            strategy: None,
            pnl,
        }
    }

    pub fn with_id(mut self, id: TradeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_emotions<I, S>(mut self, emotions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emotions = emotions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Number of distinct emotion tags on the record (case-insensitive).
    pub fn emotion_count(&self) -> usize {
        let mut seen: Vec<String> = self
            .emotions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        seen.sort();
        seen.dedup();
        seen.len()
    }

    /// Emotion tags normalized the same way filter criteria normalize them.
    pub fn normalized_emotions(&self) -> impl Iterator<Item = String> + '_ {
        self.emotions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}
