//! Parameter names shared by the query-string codec and stored payloads.

pub const FROM: &str = "from";
pub const TO: &str = "to";
pub const SYMBOLS: &str = "symbols";
pub const MARKETS: &str = "markets";
pub const SIDE: &str = "side";
pub const EMOTIONS: &str = "emotions";
pub const STRATEGY: &str = "strategy";
pub const PNL_MIN: &str = "pnlMin";
pub const PNL_MAX: &str = "pnlMax";
pub const SORT: &str = "sort";
pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "pageSize";

/// Canonical parameter order. Encoders emit in this order so equal views
/// always produce byte-identical strings.
pub const ORDER: [&str; 12] = [
    FROM, TO, SYMBOLS, MARKETS, SIDE, EMOTIONS, STRATEGY, PNL_MIN, PNL_MAX, SORT, PAGE, PAGE_SIZE,
];

/// Date format for `from` / `to`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
