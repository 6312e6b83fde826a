//! Sort specification for the trade list.

use crate::error::ValidationError;
use crate::record::TradeRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Fields the trade list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SortField {
    Date,
    Symbol,
    Pnl,
    Side,
    Market,
    EmotionCount,
    Strategy,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Date,
        SortField::Symbol,
        SortField::Pnl,
        SortField::Side,
        SortField::Market,
        SortField::EmotionCount,
        SortField::Strategy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Symbol => "symbol",
            Self::Pnl => "pnl",
            Self::Side => "side",
            Self::Market => "market",
            Self::EmotionCount => "emotion-count",
            Self::Strategy => "strategy",
        }
    }

    /// Direction used when the user first picks this field.
    ///
    /// Newest trades and largest P&L first; everything else alphabetical.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            Self::Date | Self::Pnl | Self::EmotionCount => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    fn compare(&self, a: &TradeRecord, b: &TradeRecord) -> Ordering {
        match self {
            Self::Date => a.date.cmp(&b.date),
            Self::Symbol => a
                .symbol
                .to_uppercase()
                .cmp(&b.symbol.to_uppercase()),
            Self::Pnl => a.pnl.cmp(&b.pnl),
            Self::Side => a.side.cmp(&b.side),
            Self::Market => a.market.cmp(&b.market),
            Self::EmotionCount => a.emotion_count().cmp(&b.emotion_count()),
            // Records without a strategy sort after those with one.
            Self::Strategy => match (&a.strategy, &b.strategy) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "symbol" => Ok(Self::Symbol),
            "pnl" => Ok(Self::Pnl),
            "side" => Ok(Self::Side),
            "market" => Ok(Self::Market),
            "emotion-count" | "emotioncount" | "emotion_count" => Ok(Self::EmotionCount),
            "strategy" => Ok(Self::Strategy),
            _ => Err(ValidationError::UnknownValue {
                value: s.to_string(),
            }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::UnknownValue {
                value: s.to_string(),
            }),
        }
    }
}

/// Field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Header-click behaviour: the same field flips direction, a new field
    /// starts in its default direction.
    pub fn toggled(&self, field: SortField) -> Self {
        if field == self.field {
            Self::new(field, self.direction.reversed())
        } else {
            Self::new(field, field.default_direction())
        }
    }

    /// Total order over records: the chosen field, then record id.
    ///
    /// The id tie-break is direction-independent so that equal keys keep
    /// the same relative order in both directions and across reloads.
    pub fn compare(&self, a: &TradeRecord, b: &TradeRecord) -> Ordering {
        let primary = self.field.compare(a, b);
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Sort indices into `records` in place.
    pub fn sort_indices(&self, records: &[TradeRecord], indices: &mut [usize]) {
        indices.sort_by(|&a, &b| self.compare(&records[a], &records[b]));
    }

    /// Text form `field:direction`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.field.as_str(), self.direction.as_str())
    }

    /// Parse `field:direction` or a bare `field` (ascending).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MalformedSort {
                value: raw.to_string(),
            });
        }
        let mut parts = trimmed.split(':');
        let field = parts.next().unwrap_or_default();
        let direction = parts.next();
        if parts.next().is_some() {
            return Err(ValidationError::MalformedSort {
                value: raw.to_string(),
            });
        }
        let field = field.parse::<SortField>()?;
        let direction = match direction {
            Some(d) => d.parse::<SortDirection>()?,
            None => SortDirection::Asc,
        };
        Ok(Self::new(field, direction))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field.as_str(), self.direction.as_str())
    }
}

impl Serialize for SortSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}
