//! Canonical query-string form of a `ViewState`.
//!
//! Encoding rules:
//! - Parameters appear in the fixed order of `params::ORDER`
//! - Absent fields and default sort/page/pageSize produce no parameter
//! - Sets are comma-joined in their natural (sorted) order
//! - Dates are `YYYY-MM-DD`, decimals are normalized
//!
//! Decoding goes through the validator, so malformed fields are dropped and
//! reported rather than failing the whole string. Unknown names are ignored
//! and a few legacy names are still understood.

use crate::codec::{escape, parse_pairs};
use std::collections::BTreeMap;
use tradelog_core::params::{
    DATE_FORMAT, EMOTIONS, FROM, MARKETS, PAGE, PAGE_SIZE, PNL_MAX, PNL_MIN, SIDE, SORT, STRATEGY,
    SYMBOLS, TO,
};
use tradelog_core::{
    validate_view, PageSize, RawParams, RawValue, SortSpec, Validated, ViewState,
};

/// Names written by older encoders, mapped to the current name.
pub const LEGACY_ALIASES: [(&str, &str); 8] = [
    ("symbol", SYMBOLS),
    ("sides", SIDE),
    ("emotion", EMOTIONS),
    ("market", MARKETS),
    ("limit", PAGE_SIZE),
    ("per_page", PAGE_SIZE),
    ("minPnl", PNL_MIN),
    ("maxPnl", PNL_MAX),
];

fn join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| escape(s.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode a view into its canonical query string (without leading `?`).
pub fn encode(view: &ViewState) -> String {
    let c = &view.criteria;
    let mut parts: Vec<(&str, String)> = Vec::new();

    if let Some(from) = c.date_from() {
        parts.push((FROM, from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = c.date_to() {
        parts.push((TO, to.format(DATE_FORMAT).to_string()));
    }
    if !c.symbols().is_empty() {
        parts.push((SYMBOLS, join(c.symbols())));
    }
    if !c.markets().is_empty() {
        parts.push((MARKETS, join(c.markets().iter().map(|m| m.as_str()))));
    }
    if !c.sides().is_empty() {
        parts.push((SIDE, join(c.sides().iter().map(|s| s.as_str()))));
    }
    if !c.emotions().is_empty() {
        parts.push((EMOTIONS, join(c.emotions())));
    }
    if let Some(strategy) = c.strategy() {
        parts.push((STRATEGY, escape(strategy)));
    }
    if let Some(min) = c.pnl_min() {
        parts.push((PNL_MIN, escape(&min.canonical())));
    }
    if let Some(max) = c.pnl_max() {
        parts.push((PNL_MAX, escape(&max.canonical())));
    }
    if view.sort != SortSpec::default() {
        parts.push((SORT, view.sort.encode()));
    }
    if view.page.page() != 1 {
        parts.push((PAGE, view.page.page().to_string()));
    }
    if view.page.size() != PageSize::default() {
        parts.push((PAGE_SIZE, view.page.size().get().to_string()));
    }

    parts
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Map decoded pairs to raw params: first occurrence wins, canonical names
/// win over legacy aliases.
pub fn to_raw_params(pairs: Vec<(String, String)>) -> RawParams {
    let mut canonical: BTreeMap<String, String> = BTreeMap::new();
    let mut legacy: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in pairs {
        if let Some((_, current)) = LEGACY_ALIASES.iter().find(|(old, _)| *old == name) {
            legacy.entry((*current).to_string()).or_insert(value);
        } else {
            canonical.entry(name).or_insert(value);
        }
    }
    for (name, value) in legacy {
        canonical.entry(name).or_insert(value);
    }

    canonical
        .into_iter()
        .map(|(k, v)| (k, RawValue::Text(v)))
        .collect()
}

/// Decode a query string into a validated view.
pub fn decode(query: &str) -> Validated<ViewState> {
    validate_view(&to_raw_params(parse_pairs(query)))
}
